#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use fake::{faker::name::en::Name, Fake};

#[cfg(test)]
use crate::features::auth::model::{Principal, Role};
#[cfg(test)]
use crate::features::reports::models::{NewReport, Report, ReportStatus};
#[cfg(test)]
use crate::features::users::models::{NewUser, User};
#[cfg(test)]
use crate::modules::store::{MemoryStore, UserStore};

#[cfg(test)]
pub fn principal(user_id: i64, role: Role) -> Principal {
    Principal {
        user_id,
        role,
        category_ids: Vec::new(),
        is_active: true,
    }
}

#[cfg(test)]
pub fn sample_report(id: i64, user_id: i64) -> Report {
    let now = Utc::now();
    Report {
        id,
        tracking_id: format!("YK240101{}", 1000 + id),
        title: "Jalan berlubang".to_string(),
        region: "Sleman".to_string(),
        location: "Jl. Kaliurang km 5".to_string(),
        description: "Lubang besar di tengah jalan".to_string(),
        latitude: -7.76,
        longitude: 110.38,
        status: ReportStatus::Submitted,
        user_id,
        category_id: None,
        is_anonymous: false,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
pub fn new_report(user_id: i64, tracking_id: &str) -> NewReport {
    NewReport {
        tracking_id: tracking_id.to_string(),
        title: "Jalan berlubang".to_string(),
        region: "Sleman".to_string(),
        location: "Jl. Kaliurang km 5".to_string(),
        description: "Lubang besar di tengah jalan".to_string(),
        latitude: -7.76,
        longitude: 110.38,
        user_id,
        category_id: None,
        is_anonymous: false,
    }
}

#[cfg(test)]
pub async fn seed_user(store: &MemoryStore, role: Role) -> User {
    store
        .insert_user(NewUser {
            name: Name().fake(),
            email: format!("{}@example.com", uuid::Uuid::new_v4().simple()),
            role,
        })
        .await
        .unwrap()
}

#[cfg(test)]
#[derive(Clone)]
struct InjectedPrincipal(Principal);

#[cfg(test)]
async fn inject_principal_middleware(
    axum::extract::State(injected): axum::extract::State<InjectedPrincipal>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(injected.0);
    next.run(request).await
}

/// Wrap a router so every request carries `principal`, bypassing token checks
#[cfg(test)]
pub fn with_principal(router: Router, principal: Principal) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        InjectedPrincipal(principal),
        inject_principal_middleware,
    ))
}
