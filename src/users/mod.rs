use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route("/me", get(handlers::get_profile))
        .route("/all", get(handlers::get_all_users))
        .route("/allwithresult", get(handlers::get_all_users_with_results))
        .route(
            "/addsubscription/:user_id",
            post(handlers::add_subscription).delete(handlers::remove_subscription),
        )
        .route("/reset", post(handlers::forgot_password))
        .route("/reset/:reset_token", post(handlers::reset_password))
        .route("/change-password", post(handlers::change_password))
        .route("/update/:id", post(handlers::update_profile))
        .route("/:id/update-role", put(handlers::update_role))
        .route("/:id/delete-user", delete(handlers::delete_user))
}
