use axum::Router;

pub mod accounts;
pub mod splits;
pub mod system;
pub mod transactions;

/// Router for all owner-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/accounts", accounts::router())
        .nest("/transactions", transactions::router())
        .nest("/splits", splits::router())
}
