use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use piggybank_core::OwnerId;

use crate::app::errors;
use crate::context::OwnerContext;

/// Header carrying the authenticated caller's owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Resolve the caller's owner id and insert an [`OwnerContext`].
///
/// Missing header: 401. Present but not a UUID: 400.
pub async fn owner_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let owner_id = extract_owner(req.headers())?;
    req.extensions_mut().insert(OwnerContext::new(owner_id));
    Ok(next.run(req).await)
}

fn extract_owner(headers: &HeaderMap) -> Result<OwnerId, Response> {
    let header = headers.get(OWNER_HEADER).ok_or_else(|| {
        errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing X-Owner-Id header")
    })?;

    let raw = header.to_str().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "bad_request", "X-Owner-Id is not valid text")
    })?;

    raw.parse::<OwnerId>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, e.code(), e.message()))
}
