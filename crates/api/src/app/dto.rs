use std::str::FromStr;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use piggybank_core::DomainError;
use piggybank_ledger::{
    Account, AccountRegister, AccountTreeNode, AccountType, CreateAccount, CreateTransaction,
    Currency, DateRange, ReconcileStatus, RegisterEntry, SplitDetail, SplitDraft,
    TransactionDetail, TransactionPage, UpdateAccount, UpdateTransaction, parse_amount, parse_date,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: String,
    pub currency: Option<String>,
    pub parent_id: Option<String>,
    #[serde(default)]
    pub placeholder: bool,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub account_id: String,
    /// Signed decimal string, e.g. `"-50.00"`.
    pub amount: String,
    pub currency: Option<String>,
    pub memo: Option<String>,
    pub reconcile_status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub date: String,
    pub num: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub splits: Vec<SplitRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub date: Option<String>,
    pub num: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub splits: Option<Vec<SplitRequest>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoidTransactionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub status: String,
}

/// Query string for transaction listings. Kept as raw strings so malformed
/// values produce the standard error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// -------------------------
// Parsing (request -> domain)
// -------------------------

pub type Parsed<T> = Result<T, axum::response::Response>;

fn bad_request(err: DomainError) -> axum::response::Response {
    errors::domain_error_to_response(err)
}

/// Parse an id or enum with its own `FromStr` (all of which report BadRequest).
pub fn parse<T>(raw: &str) -> Parsed<T>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(bad_request)
}

fn parse_opt<T>(raw: Option<&str>) -> Parsed<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(parse::<T>).transpose()
}

fn parse_currency(raw: Option<&str>) -> Parsed<Currency> {
    Ok(parse_opt::<Currency>(raw)?.unwrap_or(Currency::Usd))
}

fn parse_u32(name: &str, raw: Option<&str>) -> Parsed<Option<u32>> {
    raw.map(|v| {
        v.trim().parse::<u32>().map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "bad_request",
                format!("{name} must be a positive integer, got '{v}'"),
            )
        })
    })
    .transpose()
}

pub fn to_date_range(start: Option<&str>, end: Option<&str>) -> Parsed<DateRange> {
    let start = start.map(parse_date).transpose().map_err(bad_request)?;
    let end = end.map(parse_date).transpose().map_err(bad_request)?;
    Ok(DateRange::new(start, end))
}

pub fn to_page_params(query: &TransactionListQuery) -> Parsed<(Option<u32>, Option<u32>)> {
    Ok((
        parse_u32("page", query.page.as_deref())?,
        parse_u32("pageSize", query.page_size.as_deref())?,
    ))
}

pub fn to_create_account(body: CreateAccountRequest) -> Parsed<CreateAccount> {
    Ok(CreateAccount {
        parent_id: parse_opt(body.parent_id.as_deref())?,
        account_type: parse::<AccountType>(&body.account_type)?,
        currency: parse_currency(body.currency.as_deref())?,
        name: body.name,
        placeholder: body.placeholder,
        description: body.description,
    })
}

pub fn to_update_account(body: UpdateAccountRequest) -> Parsed<UpdateAccount> {
    Ok(UpdateAccount {
        parent_id: parse_opt(body.parent_id.as_deref())?,
        name: body.name,
        description: body.description,
    })
}

fn to_split_drafts(splits: Vec<SplitRequest>) -> Parsed<Vec<SplitDraft>> {
    let mut drafts = Vec::with_capacity(splits.len());
    for s in splits {
        drafts.push(SplitDraft {
            account_id: parse(&s.account_id)?,
            amount: parse_amount(&s.amount).map_err(bad_request)?,
            currency: parse_currency(s.currency.as_deref())?,
            reconcile_status: parse_opt::<ReconcileStatus>(s.reconcile_status.as_deref())?,
            memo: s.memo,
        });
    }
    Ok(drafts)
}

pub fn to_create_transaction(body: CreateTransactionRequest) -> Parsed<CreateTransaction> {
    Ok(CreateTransaction {
        date: parse_date(&body.date).map_err(bad_request)?,
        num: body.num,
        description: body.description,
        notes: body.notes,
        splits: to_split_drafts(body.splits)?,
    })
}

pub fn to_update_transaction(body: UpdateTransactionRequest) -> Parsed<UpdateTransaction> {
    Ok(UpdateTransaction {
        date: body.date.as_deref().map(parse_date).transpose().map_err(bad_request)?,
        num: body.num,
        description: body.description,
        notes: body.notes,
        splits: body.splits.map(to_split_drafts).transpose()?,
    })
}

// -------------------------
// JSON mapping helpers
// -------------------------

fn decimal(d: Decimal) -> String {
    d.to_string()
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

pub fn account_to_json(a: &Account) -> serde_json::Value {
    json!({
        "id": a.id.to_string(),
        "parentId": a.parent_id.map(|p| p.to_string()),
        "name": a.name,
        "fullName": a.full_name,
        "type": a.account_type.as_str(),
        "normalBalance": a.normal_balance().as_str(),
        "currency": a.currency.as_str(),
        "placeholder": a.placeholder,
        "description": a.description,
        "createdAt": timestamp(a.created_at),
        "updatedAt": timestamp(a.updated_at),
    })
}

pub fn tree_node_to_json(node: &AccountTreeNode) -> serde_json::Value {
    json!({
        "account": account_to_json(&node.account),
        "ownBalance": decimal(node.own_balance),
        "balance": decimal(node.balance),
        "children": node.children.iter().map(tree_node_to_json).collect::<Vec<_>>(),
    })
}

pub fn balance_to_json(account_id: &str, balance: Decimal) -> serde_json::Value {
    json!({
        "accountId": account_id,
        "balance": decimal(balance),
    })
}

pub fn split_to_json(s: &SplitDetail) -> serde_json::Value {
    json!({
        "id": s.split.id.to_string(),
        "transactionId": s.split.transaction_id.to_string(),
        "accountId": s.split.account_id.to_string(),
        "accountName": s.account_name,
        "amount": decimal(s.split.amount),
        "currency": s.split.currency.as_str(),
        "memo": s.split.memo,
        "reconcileStatus": s.split.reconcile_status.as_str(),
    })
}

pub fn transaction_to_json(d: &TransactionDetail) -> serde_json::Value {
    let t = &d.transaction;
    json!({
        "id": t.id.to_string(),
        "date": t.date.to_string(),
        "num": t.num,
        "description": t.description,
        "notes": t.notes,
        "voided": t.is_voided(),
        "voidReason": t.void_reason(),
        "createdAt": timestamp(t.created_at),
        "updatedAt": timestamp(t.updated_at),
        "splits": d.splits.iter().map(split_to_json).collect::<Vec<_>>(),
    })
}

pub fn transaction_page_to_json(p: &TransactionPage) -> serde_json::Value {
    json!({
        "transactions": p.transactions.iter().map(transaction_to_json).collect::<Vec<_>>(),
        "total": p.total,
        "page": p.page,
        "pageSize": p.page_size,
    })
}

fn register_entry_to_json(e: &RegisterEntry) -> serde_json::Value {
    json!({
        "transactionId": e.transaction_id.to_string(),
        "splitId": e.split_id.to_string(),
        "date": e.date.to_string(),
        "num": e.num,
        "description": e.description,
        "memo": e.memo,
        "amount": decimal(e.amount),
        "balance": decimal(e.balance),
        "reconcileStatus": e.reconcile_status.as_str(),
        "reconcileSymbol": e.reconcile_status.symbol().to_string(),
        "voided": e.voided,
        "otherAccounts": e.other_accounts,
        "isSplit": e.is_split,
    })
}

pub fn register_to_json(r: &AccountRegister) -> serde_json::Value {
    json!({
        "accountId": r.account_id.to_string(),
        "accountName": r.account_name,
        "accountType": r.account_type.as_str(),
        "normalBalance": r.normal_balance.as_str(),
        "openingBalance": decimal(r.opening_balance),
        "closingBalance": decimal(r.closing_balance),
        "entries": r.entries.iter().map(register_entry_to_json).collect::<Vec<_>>(),
    })
}
