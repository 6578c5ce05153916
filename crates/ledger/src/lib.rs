//! Ledger module (double-entry books for one owner).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns.
//!
//! - [`chart`]: chart-of-accounts maintenance (create, rename/reparent, delete)
//! - [`journal`]: transactions and splits (zero-sum rule, void/unvoid, reconcile)
//! - [`register`]: per-account running-balance view
//! - [`balance`]: own and rolled-up balances over the account tree

pub mod account;
pub mod balance;
pub mod books;
pub mod chart;
pub mod defaults;
pub mod journal;
pub mod register;
pub mod transaction;

pub use account::{Account, AccountType, Currency, NormalBalance};
pub use balance::{AccountTreeNode, account_balance, account_tree, own_balances};
pub use books::Books;
pub use chart::{CreateAccount, UpdateAccount};
pub use journal::{
    CreateTransaction, SplitDetail, TransactionDetail, TransactionFilter, TransactionPage,
    UpdateTransaction,
};
pub use register::{AccountRegister, RegisterEntry, account_register};
pub use transaction::{
    DateRange, ReconcileStatus, Split, SplitDraft, Transaction, VoidState, parse_amount, parse_date,
};
