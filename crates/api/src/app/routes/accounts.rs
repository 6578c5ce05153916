use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use piggybank_core::AccountId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::OwnerContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route("/tree", get(account_tree))
        .route("/defaults", post(seed_default_accounts))
        .route("/:id", get(get_account).put(update_account).delete(delete_account))
        .route("/:id/balance", get(account_balance))
        .route("/:id/transactions", get(account_register))
}

pub async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.ledger.list_accounts(owner.owner_id()) {
        Ok(accounts) => {
            let items = accounts.iter().map(dto::account_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn account_tree(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.ledger.account_tree(owner.owner_id()) {
        Ok(roots) => {
            let items = roots.iter().map(dto::tree_node_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    body: Result<Json<dto::CreateAccountRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let cmd = match dto::to_create_account(body) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.ledger.create_account(owner.owner_id(), cmd) {
        Ok(account) => (StatusCode::CREATED, Json(dto::account_to_json(&account))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn seed_default_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
) -> axum::response::Response {
    match services.ledger.seed_default_accounts(owner.owner_id()) {
        Ok(accounts) => {
            let items = accounts.iter().map(dto::account_to_json).collect::<Vec<_>>();
            (StatusCode::CREATED, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.get_account(owner.owner_id(), id) {
        Ok(account) => (StatusCode::OK, Json(dto::account_to_json(&account))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateAccountRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let cmd = match dto::to_update_account(body) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.ledger.update_account(owner.owner_id(), id, cmd) {
        Ok(account) => (StatusCode::OK, Json(dto::account_to_json(&account))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.delete_account(owner.owner_id(), id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn account_balance(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(raw_id): Path<String>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.ledger.account_balance(owner.owner_id(), id) {
        Ok(balance) => {
            (StatusCode::OK, Json(dto::balance_to_json(&id.to_string(), balance))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// The account register: every posting to the account with a running balance.
pub async fn account_register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(owner): Extension<OwnerContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::DateRangeQuery>,
) -> axum::response::Response {
    let id: AccountId = match dto::parse(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let range = match dto::to_date_range(query.start_date.as_deref(), query.end_date.as_deref()) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.ledger.account_register(owner.owner_id(), id, range) {
        Ok(register) => (StatusCode::OK, Json(dto::register_to_json(&register))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
