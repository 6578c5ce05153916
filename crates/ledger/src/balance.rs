//! Balance aggregation: own balances per account and roll-up over the tree.
//!
//! Balances are recomputed from the committed split set on every call; there
//! is no stored running total to drift. Sums saturate at the `Decimal` range
//! instead of panicking.

use std::collections::HashMap;

use rust_decimal::Decimal;

use piggybank_core::{AccountId, DomainResult};

use crate::account::Account;
use crate::books::Books;

/// An account plus its own balance and the rolled-up balance of its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTreeNode {
    pub account: Account,
    /// Sum of non-voided splits posted directly to this account.
    pub own_balance: Decimal,
    /// `own_balance` + Σ children's `balance`.
    pub balance: Decimal,
    pub children: Vec<AccountTreeNode>,
}

/// Sum of the signed amounts of all non-voided splits posted to `account_id`.
pub fn account_balance(books: &Books, account_id: AccountId) -> DomainResult<Decimal> {
    books.account(account_id)?;
    Ok(books
        .splits()
        .filter(|s| s.account_id == account_id)
        .filter(|s| books.transaction(s.transaction_id).is_ok_and(|t| !t.is_voided()))
        .fold(Decimal::ZERO, |sum, s| sum.saturating_add(s.amount)))
}

/// Own balance of every account that has at least one live posting.
pub fn own_balances(books: &Books) -> HashMap<AccountId, Decimal> {
    let mut balances: HashMap<AccountId, Decimal> = HashMap::new();
    for split in books.splits() {
        let live = books
            .transaction(split.transaction_id)
            .is_ok_and(|t| !t.is_voided());
        if live {
            let balance = balances.entry(split.account_id).or_default();
            *balance = balance.saturating_add(split.amount);
        }
    }
    balances
}

/// The owner's forest of accounts with balances rolled up bottom-up.
///
/// Roots and siblings are ordered by short name.
pub fn account_tree(books: &Books) -> Vec<AccountTreeNode> {
    let balances = own_balances(books);
    let index = books.child_index();

    index
        .get(&None)
        .map(|roots| roots.iter().map(|root| build_node(root, &index, &balances)).collect())
        .unwrap_or_default()
}

/// Post-order: children first, then this node's roll-up.
fn build_node(
    account: &Account,
    index: &HashMap<Option<AccountId>, Vec<&Account>>,
    balances: &HashMap<AccountId, Decimal>,
) -> AccountTreeNode {
    let children: Vec<AccountTreeNode> = index
        .get(&Some(account.id))
        .map(|kids| kids.iter().map(|kid| build_node(kid, index, balances)).collect())
        .unwrap_or_default();

    let own_balance = balances.get(&account.id).copied().unwrap_or(Decimal::ZERO);
    let balance = children
        .iter()
        .fold(own_balance, |sum, c| sum.saturating_add(c.balance));

    AccountTreeNode {
        account: account.clone(),
        own_balance,
        balance,
        children,
    }
}
