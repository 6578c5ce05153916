use core::str::FromStr;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use piggybank_core::{AccountId, DomainError, DomainResult, Entity, OwnerId, SplitId, TransactionId};

use crate::account::{Currency, ensure_max_len};

/// Maximum fractional digits stored for a split amount.
pub const AMOUNT_SCALE: u32 = 4;

/// Maximum integer digits of a split amount (up to 999 trillion).
pub const AMOUNT_INTEGER_DIGITS: u32 = 15;

/// Maximum length of a split memo, in characters.
pub const MAX_MEMO_LEN: usize = 255;

/// Minimum number of splits in a transaction.
pub const MIN_SPLITS: usize = 2;

/// Per-split reconciliation state.
///
/// Any value may be set from any other value; there is no enforced
/// forward-only progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReconcileStatus {
    #[default]
    New,
    Cleared,
    Reconciled,
}

impl ReconcileStatus {
    pub const ALL: [ReconcileStatus; 3] = [
        ReconcileStatus::New,
        ReconcileStatus::Cleared,
        ReconcileStatus::Reconciled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileStatus::New => "NEW",
            ReconcileStatus::Cleared => "CLEARED",
            ReconcileStatus::Reconciled => "RECONCILED",
        }
    }

    /// One-letter register column marker.
    pub fn symbol(self) -> char {
        match self {
            ReconcileStatus::New => 'n',
            ReconcileStatus::Cleared => 'c',
            ReconcileStatus::Reconciled => 'y',
        }
    }
}

impl core::fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReconcileStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReconcileStatus::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::bad_request(format!(
                    "invalid reconcile status: {s}. Must be one of: NEW, CLEARED, RECONCILED"
                ))
            })
    }
}

/// Transaction lifecycle: `Active ⇄ Voided`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum VoidState {
    #[default]
    Active,
    Voided { reason: Option<String> },
}

impl VoidState {
    pub fn is_voided(&self) -> bool {
        matches!(self, VoidState::Voided { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            VoidState::Active => None,
            VoidState::Voided { reason } => reason.as_deref(),
        }
    }
}

/// Transaction header. Its splits live alongside it in the owner's books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: OwnerId,
    pub date: NaiveDate,
    /// Reference number (cheque number, invoice number, ...).
    pub num: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub state: VoidState,
    /// Insertion sequence within the owner's books (stable tie-break).
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_voided(&self) -> bool {
        self.state.is_voided()
    }

    pub fn void_reason(&self) -> Option<&str> {
        self.state.reason()
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

/// One signed-amount leg of a transaction against a single account.
///
/// Positive amounts are debits, negative amounts are credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: SplitId,
    pub owner_id: OwnerId,
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
    pub memo: Option<String>,
    pub reconcile_status: ReconcileStatus,
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Entity for Split {
    type Id = SplitId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn owner_id(&self) -> OwnerId {
        self.owner_id
    }
}

/// A split as submitted by a caller, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDraft {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
    pub memo: Option<String>,
    /// Defaults to `NEW` when absent.
    pub reconcile_status: Option<ReconcileStatus>,
}

/// Inclusive date filter; open on either side when a bound is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(raw: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        DomainError::bad_request(format!(
            "invalid date: {raw}. Use ISO-8601 format: YYYY-MM-DD"
        ))
    })
}

/// Parse a decimal amount string, rejecting more than [`AMOUNT_SCALE`]
/// fractional or [`AMOUNT_INTEGER_DIGITS`] integer digits.
pub fn parse_amount(raw: &str) -> DomainResult<Decimal> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| DomainError::bad_request(format!("invalid amount: {raw}")))?;
    ensure_amount_precision(amount)?;
    Ok(amount)
}

/// Amounts must fit `NUMERIC(19, 4)`: at most 15 integer and 4 fractional digits.
pub fn ensure_amount_precision(amount: Decimal) -> DomainResult<()> {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(DomainError::bad_request(format!(
            "invalid amount: {amount} has more than {AMOUNT_SCALE} decimal places"
        )));
    }
    let limit = Decimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS));
    if amount.abs() >= limit {
        return Err(DomainError::bad_request(format!(
            "invalid amount: {amount} has more than {AMOUNT_INTEGER_DIGITS} integer digits"
        )));
    }
    Ok(())
}

/// The double-entry rule: for every currency present, the split amounts in
/// that currency sum to exactly zero.
///
/// Fails on the first unbalanced currency (in currency order), naming it and
/// the observed sum.
pub fn ensure_balanced(splits: &[SplitDraft]) -> DomainResult<()> {
    let mut sums: BTreeMap<Currency, Decimal> = BTreeMap::new();
    for split in splits {
        let sum = sums.entry(split.currency).or_default();
        *sum = sum.checked_add(split.amount).ok_or_else(|| {
            DomainError::bad_request(format!(
                "transaction splits for {} overflow the amount range",
                split.currency
            ))
        })?;
    }

    for (currency, sum) in sums {
        if !sum.is_zero() {
            return Err(DomainError::validation(format!(
                "transaction splits for {currency} must sum to zero. Current sum: {sum}"
            )));
        }
    }
    Ok(())
}

/// Per-split shape checks that need no account lookups: split count, amount
/// precision and memo length. The zero-sum rule is [`ensure_balanced`].
pub fn validate_split_set(splits: &[SplitDraft]) -> DomainResult<()> {
    if splits.len() < MIN_SPLITS {
        return Err(DomainError::validation(format!(
            "a transaction must have at least {MIN_SPLITS} splits"
        )));
    }
    for split in splits {
        ensure_amount_precision(split.amount)?;
        if let Some(memo) = split.memo.as_deref() {
            ensure_max_len("split memo", memo, MAX_MEMO_LEN)?;
        }
    }
    Ok(())
}
