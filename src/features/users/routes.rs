use std::sync::Arc;

use axum::{
    routing::{delete, get, patch},
    Router,
};

use crate::features::users::handlers;
use crate::features::users::services::UserService;

pub fn routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/stats", get(handlers::user_stats))
        .route(
            "/api/users/category-admin",
            get(handlers::get_category_admin),
        )
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::soft_delete_user),
        )
        .route("/api/users/{id}/restore", patch(handlers::restore_user))
        .route(
            "/api/users/{id}/toggle-active",
            patch(handlers::toggle_user_active),
        )
        .route(
            "/api/users/{id}/permanent",
            delete(handlers::hard_delete_user),
        )
        .with_state(user_service)
}
