pub mod auth;
pub mod boards;
pub mod health;
pub mod tasks;
pub mod users;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::health))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Users
        .route("/users", get(users::list))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/me/password", patch(users::change_password))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        // Boards
        .route("/boards", get(boards::list).post(boards::create))
        .route("/boards/public", get(boards::list_public))
        .route(
            "/boards/{id}",
            get(boards::get).put(boards::update).delete(boards::delete),
        )
        .route("/boards/{id}/stats", get(boards::stats))
        // Tasks
        .route("/tasks", get(tasks::list).post(tasks::create))
        .route("/tasks/search", get(tasks::search))
        .route(
            "/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route("/tasks/{id}/move", patch(tasks::move_task))
        .route("/tasks/{id}/assign", patch(tasks::assign))
}
