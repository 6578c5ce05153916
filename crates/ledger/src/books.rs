//! One owner's books: the account, transaction and split tables.
//!
//! `Books` is plain data. Every mutation goes through the operations in
//! [`crate::chart`] and [`crate::journal`], which validate fully before
//! touching any row, so a failed operation leaves the books as they were.
//! Callers that need atomicity across several operations work on a clone and
//! swap it in on success (see the infra store).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use piggybank_core::{AccountId, DomainError, DomainResult, Entity, OwnerId, SplitId, TransactionId};

use crate::account::Account;
use crate::transaction::{Split, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Books {
    owner_id: OwnerId,
    pub(crate) accounts: BTreeMap<AccountId, Account>,
    pub(crate) transactions: BTreeMap<TransactionId, Transaction>,
    pub(crate) splits: BTreeMap<SplitId, Split>,
    next_sequence: u64,
}

impl Books {
    /// Empty books for an owner.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            accounts: BTreeMap::new(),
            transactions: BTreeMap::new(),
            splits: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.transactions.is_empty()
    }

    /// Every row must belong to the books' owner. Used when books come from
    /// outside (e.g. a snapshot file).
    pub fn check_ownership(&self) -> DomainResult<()> {
        ensure_owned(self.owner_id, "account", self.accounts.values())?;
        ensure_owned(self.owner_id, "transaction", self.transactions.values())?;
        ensure_owned(self.owner_id, "split", self.splits.values())
    }

    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    // -------------------------
    // Lookups
    // -------------------------

    /// Account by id. Missing and foreign accounts are both `NotFound`.
    pub fn account(&self, id: AccountId) -> DomainResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("account {id} not found")))
    }

    pub fn transaction(&self, id: TransactionId) -> DomainResult<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("transaction {id} not found")))
    }

    pub fn split(&self, id: SplitId) -> DomainResult<&Split> {
        self.splits
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("split {id} not found")))
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    pub fn splits(&self) -> impl Iterator<Item = &Split> {
        self.splits.values()
    }

    /// Direct children of `parent` (or the roots when `None`).
    pub fn children_of(&self, parent: Option<AccountId>) -> impl Iterator<Item = &Account> {
        self.accounts.values().filter(move |a| a.parent_id == parent)
    }

    pub fn has_children(&self, id: AccountId) -> bool {
        self.accounts.values().any(|a| a.parent_id == Some(id))
    }

    pub fn has_postings(&self, id: AccountId) -> bool {
        self.splits.values().any(|s| s.account_id == id)
    }

    /// Splits of one transaction, in insertion order.
    pub fn splits_of(&self, transaction_id: TransactionId) -> Vec<&Split> {
        let mut splits: Vec<&Split> = self
            .splits
            .values()
            .filter(|s| s.transaction_id == transaction_id)
            .collect();
        splits.sort_by_key(|s| s.sequence);
        splits
    }

    /// All splits grouped by transaction, each group in insertion order.
    pub fn splits_by_transaction(&self) -> HashMap<TransactionId, Vec<&Split>> {
        let mut grouped: HashMap<TransactionId, Vec<&Split>> = HashMap::new();
        for split in self.splits.values() {
            grouped.entry(split.transaction_id).or_default().push(split);
        }
        for splits in grouped.values_mut() {
            splits.sort_by_key(|s| s.sequence);
        }
        grouped
    }

    /// Adjacency list keyed by parent id; siblings ordered by short name.
    pub fn child_index(&self) -> HashMap<Option<AccountId>, Vec<&Account>> {
        let mut index: HashMap<Option<AccountId>, Vec<&Account>> = HashMap::new();
        for account in self.accounts.values() {
            index.entry(account.parent_id).or_default().push(account);
        }
        for siblings in index.values_mut() {
            siblings.sort_by(|a, b| a.name.cmp(&b.name));
        }
        index
    }

    pub(crate) fn remove_splits_of(&mut self, transaction_id: TransactionId) {
        self.splits.retain(|_, s| s.transaction_id != transaction_id);
    }
}

fn ensure_owned<'a, E>(
    owner_id: OwnerId,
    kind: &str,
    rows: impl Iterator<Item = &'a E>,
) -> DomainResult<()>
where
    E: Entity + 'a,
{
    for row in rows {
        if row.owner_id() != owner_id {
            return Err(DomainError::internal(format!(
                "{kind} {:?} belongs to owner {}, not {owner_id}",
                row.id(),
                row.owner_id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountType, Currency};
    use crate::chart::CreateAccount;
    use chrono::Utc;

    #[test]
    fn lookups_report_not_found() {
        let books = Books::new(OwnerId::new());
        assert!(books.is_empty());
        assert!(matches!(books.account(AccountId::new()), Err(DomainError::NotFound(_))));
        assert!(matches!(books.transaction(TransactionId::new()), Err(DomainError::NotFound(_))));
        assert!(matches!(books.split(SplitId::new()), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn foreign_rows_fail_the_ownership_check() {
        let mut books = Books::new(OwnerId::new());
        let account = books
            .create_account(
                CreateAccount {
                    parent_id: None,
                    name: "Cash".into(),
                    account_type: AccountType::Asset,
                    currency: Currency::Usd,
                    placeholder: false,
                    description: None,
                },
                Utc::now(),
            )
            .unwrap();
        assert!(books.check_ownership().is_ok());

        if let Some(row) = books.accounts.get_mut(&account.id) {
            row.owner_id = OwnerId::new();
        }
        assert!(matches!(books.check_ownership(), Err(DomainError::Internal(_))));
    }
}
