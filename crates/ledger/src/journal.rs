//! Transactions and their splits: create, replace, delete, void/unvoid,
//! reconcile, and the owner-wide transaction listing.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Utc};

use piggybank_core::{DomainError, DomainResult, SplitId, TransactionId};

use crate::account::ensure_max_len;
use crate::books::Books;
use crate::transaction::{
    DateRange, ReconcileStatus, Split, SplitDraft, Transaction, VoidState, ensure_balanced,
    validate_split_set,
};

/// Command: CreateTransaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTransaction {
    pub date: NaiveDate,
    pub num: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub splits: Vec<SplitDraft>,
}

/// Command: UpdateTransaction.
///
/// Scalar fields replace prior values when present. `splits`, when present,
/// replaces the whole split set; there is no partial merge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateTransaction {
    pub date: Option<NaiveDate>,
    pub num: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub splits: Option<Vec<SplitDraft>>,
}

/// A split joined with its account's full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitDetail {
    pub split: Split,
    pub account_name: String,
}

/// A transaction together with its splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub splits: Vec<SplitDetail>,
}

/// Listing query: date filter plus 1-based pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionFilter {
    pub range: DateRange,
    pub page: u32,
    pub page_size: u32,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            range: DateRange::all(),
            page: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionDetail>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

pub const MAX_DESCRIPTION_LEN: usize = 500;

fn ensure_description(description: &str) -> DomainResult<()> {
    if description.trim().is_empty() {
        return Err(DomainError::bad_request("transaction description cannot be blank"));
    }
    ensure_max_len("transaction description", description, MAX_DESCRIPTION_LEN)
}

impl Books {
    pub fn create_transaction(
        &mut self,
        cmd: CreateTransaction,
        now: DateTime<Utc>,
    ) -> DomainResult<TransactionDetail> {
        ensure_description(&cmd.description)?;
        self.validate_splits(&cmd.splits)?;

        let transaction = Transaction {
            id: TransactionId::new(),
            owner_id: self.owner_id(),
            date: cmd.date,
            num: cmd.num,
            description: cmd.description,
            notes: cmd.notes,
            state: VoidState::Active,
            sequence: self.next_sequence(),
            created_at: now,
            updated_at: now,
        };
        let id = transaction.id;
        self.transactions.insert(id, transaction);
        self.insert_splits(id, cmd.splits, now);

        self.transaction_detail(id)
    }

    pub fn update_transaction(
        &mut self,
        id: TransactionId,
        cmd: UpdateTransaction,
        now: DateTime<Utc>,
    ) -> DomainResult<TransactionDetail> {
        self.transaction(id)?;
        if let Some(description) = cmd.description.as_deref() {
            ensure_description(description)?;
        }
        if let Some(splits) = cmd.splits.as_deref() {
            self.validate_splits(splits)?;
        }

        if let Some(txn) = self.transactions.get_mut(&id) {
            if let Some(date) = cmd.date {
                txn.date = date;
            }
            if cmd.num.is_some() {
                txn.num = cmd.num;
            }
            if let Some(description) = cmd.description {
                txn.description = description;
            }
            if cmd.notes.is_some() {
                txn.notes = cmd.notes;
            }
            txn.updated_at = now;
        }

        if let Some(splits) = cmd.splits {
            self.remove_splits_of(id);
            self.insert_splits(id, splits, now);
        }

        self.transaction_detail(id)
    }

    /// Remove the splits, then the transaction. Irreversible (unlike void).
    pub fn delete_transaction(&mut self, id: TransactionId) -> DomainResult<()> {
        self.transaction(id)?;
        self.remove_splits_of(id);
        self.transactions.remove(&id);
        Ok(())
    }

    pub fn void_transaction(
        &mut self,
        id: TransactionId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<TransactionDetail> {
        if self.transaction(id)?.is_voided() {
            return Err(DomainError::validation("transaction is already voided"));
        }
        if let Some(txn) = self.transactions.get_mut(&id) {
            txn.state = VoidState::Voided { reason };
            txn.updated_at = now;
        }
        self.transaction_detail(id)
    }

    pub fn unvoid_transaction(
        &mut self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> DomainResult<TransactionDetail> {
        if !self.transaction(id)?.is_voided() {
            return Err(DomainError::validation("transaction is not voided"));
        }
        if let Some(txn) = self.transactions.get_mut(&id) {
            txn.state = VoidState::Active;
            txn.updated_at = now;
        }
        self.transaction_detail(id)
    }

    /// Set a split's reconcile status (any value from any value) and touch
    /// the owning transaction's `updated_at`.
    pub fn set_reconcile_status(
        &mut self,
        split_id: SplitId,
        status: ReconcileStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<SplitDetail> {
        let transaction_id = self.split(split_id)?.transaction_id;

        if let Some(split) = self.splits.get_mut(&split_id) {
            split.reconcile_status = status;
        }
        if let Some(txn) = self.transactions.get_mut(&transaction_id) {
            txn.updated_at = now;
        }

        let split = self.split(split_id)?.clone();
        let account_name = self.account(split.account_id)?.full_name.clone();
        Ok(SplitDetail { split, account_name })
    }

    pub fn transaction_detail(&self, id: TransactionId) -> DomainResult<TransactionDetail> {
        let transaction = self.transaction(id)?.clone();
        let splits = self
            .splits_of(id)
            .into_iter()
            .map(|split| {
                let account_name = self.account(split.account_id)?.full_name.clone();
                Ok(SplitDetail { split: split.clone(), account_name })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(TransactionDetail { transaction, splits })
    }

    /// Transactions in range, newest first (date, then insertion order).
    pub fn list_transactions(&self, filter: &TransactionFilter) -> DomainResult<TransactionPage> {
        if filter.page < 1 {
            return Err(DomainError::bad_request("page must be at least 1"));
        }
        if filter.page_size < 1 {
            return Err(DomainError::bad_request("pageSize must be at least 1"));
        }

        let mut matching: Vec<&Transaction> = self
            .transactions()
            .filter(|t| filter.range.contains(t.date))
            .collect();
        matching.sort_by_key(|t| Reverse((t.date, t.sequence)));

        let total = matching.len();
        let offset = (filter.page as usize - 1).saturating_mul(filter.page_size as usize);
        let transactions = matching
            .into_iter()
            .skip(offset)
            .take(filter.page_size as usize)
            .map(|t| self.transaction_detail(t.id))
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(TransactionPage {
            transactions,
            total,
            page: filter.page,
            page_size: filter.page_size,
        })
    }

    /// Full validation of a proposed split set against these books.
    fn validate_splits(&self, splits: &[SplitDraft]) -> DomainResult<()> {
        validate_split_set(splits)?;

        for draft in splits {
            let account = self.account(draft.account_id)?;
            if account.placeholder {
                return Err(DomainError::validation(format!(
                    "cannot post to placeholder account '{}'",
                    account.full_name
                )));
            }
        }

        ensure_balanced(splits)
    }

    fn insert_splits(&mut self, transaction_id: TransactionId, drafts: Vec<SplitDraft>, now: DateTime<Utc>) {
        for draft in drafts {
            let split = Split {
                id: SplitId::new(),
                owner_id: self.owner_id(),
                transaction_id,
                account_id: draft.account_id,
                amount: draft.amount,
                currency: draft.currency,
                memo: draft.memo,
                reconcile_status: draft.reconcile_status.unwrap_or_default(),
                sequence: self.next_sequence(),
                created_at: now,
            };
            self.splits.insert(split.id, split);
        }
    }
}
