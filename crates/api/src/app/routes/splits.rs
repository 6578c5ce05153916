use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::patch,
};

use piggybank_core::SplitId;
use piggybank_ledger::ReconcileStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new().route("/:id/reconcile", patch(set_reconcile_status))
}

pub async fn set_reconcile_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::ReconcileRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: SplitId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let status: ReconcileStatus = match dto::parse(&body.status) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match services.ledger.set_reconcile_status(owner.owner_id(), id, status) {
        Ok(split) => (StatusCode::OK, Json(dto::split_to_json(&split))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
