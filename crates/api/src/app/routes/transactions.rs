use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use piggybank_core::TransactionId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route(
            "/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        .route("/:id/void", post(void_transaction))
        .route("/:id/unvoid", post(unvoid_transaction))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<dto::TransactionListQuery>,
) -> axum::response::Response {
    let range = match dto::to_date_range(query.start_date.as_deref(), query.end_date.as_deref()) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let (page, page_size) = match dto::to_page_params(&query) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.ledger.list_transactions(owner.owner_id(), range, page, page_size) {
        Ok(page) => (StatusCode::OK, Json(dto::transaction_page_to_json(&page))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransactionId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.get_transaction(owner.owner_id(), id) {
        Ok(detail) => (StatusCode::OK, Json(dto::transaction_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::CreateTransactionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let cmd = match dto::to_create_transaction(body) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.ledger.create_transaction(owner.owner_id(), cmd) {
        Ok(detail) => (StatusCode::CREATED, Json(dto::transaction_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Scalar fields replace prior values; a `splits` array replaces the whole
/// split set.
pub async fn update_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateTransactionRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: TransactionId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let cmd = match dto::to_update_transaction(body) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.ledger.update_transaction(owner.owner_id(), id, cmd) {
        Ok(detail) => (StatusCode::OK, Json(dto::transaction_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransactionId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.delete_transaction(owner.owner_id(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// The body (`{"reason": ...}`) is optional.
pub async fn void_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let id: TransactionId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body: dto::VoidTransactionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        dto::VoidTransactionRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(b) => b,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", e.to_string());
            }
        }
    };

    match services.ledger.void_transaction(owner.owner_id(), id, body.reason) {
        Ok(detail) => (StatusCode::OK, Json(dto::transaction_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn unvoid_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TransactionId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.unvoid_transaction(owner.owner_id(), id) {
        Ok(detail) => (StatusCode::OK, Json(dto::transaction_to_json(&detail))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
