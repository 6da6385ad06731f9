mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::{Config, StoreBackend};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::access::ScopeResolver;
use crate::features::auth::JwtValidator;
use crate::features::categories::{self, CategoryService};
use crate::features::dashboard::{self, DashboardService};
use crate::features::engagement::{self, EngagementService};
use crate::features::evidence::models::EvidencePhoto;
use crate::features::evidence::{self, EvidenceService};
use crate::features::reports::services::RandomTrackingIdGenerator;
use crate::features::reports::{self, ReportService};
use crate::features::users::models::User;
use crate::features::users::{self, UserService};
use crate::modules::storage::{build_file_store, FileStore};
use crate::modules::store::{
    CategoryStore, EngagementStore, EvidenceStore, HistoryStore, MemoryStore, PgStore,
    ReportStore, SoftDeleteStore, StatsStore, UserStore,
};
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

/// Wire every feature service against one store backend
fn feature_routes<S>(
    store: Arc<S>,
    files: Arc<dyn FileStore>,
    jwt_validator: Arc<JwtValidator>,
    config: &Config,
) -> Router
where
    S: ReportStore
        + HistoryStore
        + CategoryStore
        + UserStore
        + EvidenceStore
        + EngagementStore
        + StatsStore
        + SoftDeleteStore<EvidencePhoto>
        + SoftDeleteStore<User>
        + 'static,
{
    let scopes = Arc::new(ScopeResolver::new(
        store.clone(),
        config.reports.empty_scope_policy,
    ));
    tracing::info!(
        "Scope resolver initialized (empty scope policy: {:?})",
        config.reports.empty_scope_policy
    );

    let report_service = Arc::new(ReportService::new(
        store.clone(),
        Arc::clone(&files),
        Arc::clone(&scopes),
        Arc::new(RandomTrackingIdGenerator::new(
            &config.reports.tracking_id_prefix,
        )),
        config.reports.tracking_id_max_attempts,
    ));
    tracing::info!("Report service initialized");

    let category_service = Arc::new(CategoryService::new(store.clone(), Arc::clone(&scopes)));
    let engagement_service = Arc::new(EngagementService::new(
        store.clone(),
        files,
        Arc::clone(&scopes),
    ));
    let evidence_service = Arc::new(EvidenceService::new(store.clone(), Arc::clone(&scopes)));
    let user_service = Arc::new(UserService::new(store.clone(), Arc::clone(&scopes)));
    let dashboard_service = Arc::new(DashboardService::new(store, scopes));
    tracing::info!("Feature services initialized");

    // Protected routes (require bearer authentication)
    let protected_routes = Router::new()
        .merge(reports::routes(Arc::clone(&report_service)))
        .merge(categories::routes(Arc::clone(&category_service)))
        .merge(engagement::routes(engagement_service))
        .merge(evidence::routes(evidence_service))
        .merge(users::routes(user_service))
        .merge(dashboard::routes(dashboard_service))
        .route_layer(from_fn_with_state(jwt_validator, middleware::auth_middleware));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(reports::public_routes(report_service))
        .merge(categories::public_routes(category_service));

    Router::new().merge(protected_routes).merge(public_routes)
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    let jwt_validator = Arc::new(JwtValidator::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    let files = build_file_store(&config.file_storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize file storage: {}", e))?;
    tracing::info!(
        "File storage initialized ({:?} backend)",
        config.file_storage.backend
    );

    let api_routes = match config.store.backend {
        StoreBackend::Postgres => {
            let pool = database::create_pool(&config.database).await?;
            tracing::info!("Database connection pool created");

            // Run migrations automatically
            tracing::info!("Running database migrations...");
            database::run_migrations(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
            tracing::info!("Database migrations completed successfully");

            feature_routes(Arc::new(PgStore::new(pool)), files, jwt_validator, &config)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            feature_routes(Arc::new(MemoryStore::new()), files, jwt_validator, &config)
        }
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                // Propagate X-Request-Id to response headers
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors_layer(
                    config.app.cors_allowed_origins.clone(),
                )),
        );

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
