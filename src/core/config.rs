use std::env;
use std::time::Duration;

use crate::features::access::EmptyScopePolicy;
use crate::shared::validation::TRACKING_ID_PREFIX_REGEX;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub file_storage: FileStorageConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Which persistence backend the services are wired against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store, contents are lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Shared HS256 secret used by the identity provider to sign principal tokens
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStorageBackend {
    Local,
    S3,
}

/// Where evidence photo bytes are written
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub backend: FileStorageBackend,
    /// Root directory for the local backend
    pub local_dir: String,
    pub minio: MinIOConfig,
}

/// MinIO/S3 storage configuration for file uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
}

/// Report lifecycle tuning
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub tracking_id_prefix: String,
    pub tracking_id_max_attempts: u32,
    pub empty_scope_policy: EmptyScopePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let store = StoreConfig::from_env()?;
        let database = match store.backend {
            StoreBackend::Postgres => DatabaseConfig::from_env()?,
            StoreBackend::Memory => DatabaseConfig::from_env().unwrap_or_default(),
        };

        Ok(Config {
            app: AppConfig::from_env()?,
            database,
            store,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            file_storage: FileStorageConfig::from_env()?,
            reports: ReportConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            min_connections: Self::DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            idle_timeout_secs: Self::DEFAULT_IDLE_TIMEOUT_SECS,
            max_lifetime_secs: Self::DEFAULT_MAX_LIFETIME_SECS,
        }
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(format!(
                    "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    other
                ))
            }
        };

        Ok(Self { backend })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "JWT_SECRET environment variable is required".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Pengaduan API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for the citizen complaint service".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl FileStorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("FILE_STORAGE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => FileStorageBackend::Local,
            "s3" | "minio" => FileStorageBackend::S3,
            other => {
                return Err(format!(
                    "FILE_STORAGE must be 'local' or 's3', got '{}'",
                    other
                ))
            }
        };

        let local_dir = env::var("LOCAL_STORAGE_DIR").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            backend,
            local_dir,
            minio: MinIOConfig::from_env()?,
        })
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "pengaduan-evidence".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        })
    }
}

impl ReportConfig {
    const DEFAULT_TRACKING_ID_PREFIX: &'static str = "YK";
    const DEFAULT_TRACKING_ID_MAX_ATTEMPTS: u32 = 5;

    pub fn from_env() -> Result<Self, String> {
        let tracking_id_prefix = Self::parse_tracking_id_prefix(
            &env::var("TRACKING_ID_PREFIX")
                .unwrap_or_else(|_| Self::DEFAULT_TRACKING_ID_PREFIX.to_string()),
        )?;

        let tracking_id_max_attempts = env::var("TRACKING_ID_MAX_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_TRACKING_ID_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "TRACKING_ID_MAX_ATTEMPTS must be a valid number".to_string())?;

        if tracking_id_max_attempts == 0 {
            return Err("TRACKING_ID_MAX_ATTEMPTS must be at least 1".to_string());
        }

        let empty_scope_policy = env::var("SCOPE_EMPTY_POLICY")
            .unwrap_or_else(|_| "unrestricted".to_string())
            .parse::<EmptyScopePolicy>()?;

        Ok(Self {
            tracking_id_prefix,
            tracking_id_max_attempts,
            empty_scope_policy,
        })
    }
}

impl ReportConfig {
    /// Generated ids must stay searchable, so the prefix follows the lookup format
    fn parse_tracking_id_prefix(raw: &str) -> Result<String, String> {
        let prefix = raw.trim().to_ascii_uppercase();
        if !TRACKING_ID_PREFIX_REGEX.is_match(&prefix) {
            return Err(format!(
                "TRACKING_ID_PREFIX must be 1 to 8 letters, got '{}'",
                raw
            ));
        }
        Ok(prefix)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            tracking_id_prefix: Self::DEFAULT_TRACKING_ID_PREFIX.to_string(),
            tracking_id_max_attempts: Self::DEFAULT_TRACKING_ID_MAX_ATTEMPTS,
            empty_scope_policy: EmptyScopePolicy::Unrestricted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::features::reports::services::{RandomTrackingIdGenerator, TrackingIdGenerator};
    use crate::shared::validation::TRACKING_ID_REGEX;

    #[test]
    fn test_tracking_id_prefix_is_normalised() {
        assert_eq!(ReportConfig::parse_tracking_id_prefix("yk").unwrap(), "YK");
        assert_eq!(ReportConfig::parse_tracking_id_prefix(" SLM ").unwrap(), "SLM");
    }

    #[test]
    fn test_unsearchable_tracking_id_prefix_is_rejected() {
        assert!(ReportConfig::parse_tracking_id_prefix("PENGADUAN").is_err());
        assert!(ReportConfig::parse_tracking_id_prefix("YK-").is_err());
        assert!(ReportConfig::parse_tracking_id_prefix("").is_err());
    }

    #[test]
    fn test_accepted_prefix_yields_searchable_ids() {
        let prefix = ReportConfig::parse_tracking_id_prefix("abcdefgh").unwrap();
        let id = RandomTrackingIdGenerator::new(prefix).generate(Utc::now());
        assert!(TRACKING_ID_REGEX.is_match(&id), "bad id {}", id);
    }
}
