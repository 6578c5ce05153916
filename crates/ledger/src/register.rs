//! Account register: the chronological, running-balance view of every split
//! posted to one account.
//!
//! Pure function of the books; nothing here is cached.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use piggybank_core::{AccountId, DomainResult, SplitId, TransactionId};

use crate::account::{Account, AccountType, NormalBalance};
use crate::books::Books;
use crate::transaction::{DateRange, ReconcileStatus, Split, Transaction};

/// One register row (one split touching the account).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterEntry {
    pub transaction_id: TransactionId,
    pub split_id: SplitId,
    pub date: NaiveDate,
    pub num: Option<String>,
    pub description: String,
    pub memo: Option<String>,
    pub amount: Decimal,
    /// Running balance through this row. Voided rows do not move it.
    pub balance: Decimal,
    pub reconcile_status: ReconcileStatus,
    pub voided: bool,
    /// Full names of the other accounts in the same transaction.
    pub other_accounts: Vec<String>,
    /// More than one other account: a multi-way transaction.
    pub is_split: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRegister {
    pub account_id: AccountId,
    pub account_name: String,
    pub account_type: AccountType,
    pub normal_balance: NormalBalance,
    pub entries: Vec<RegisterEntry>,
    /// Always zero: there is no historical opening-balance feature.
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
}

/// Build the register for `account_id`, optionally restricted to `range`.
///
/// Rows are ordered by transaction date, then transaction insertion order,
/// then split insertion order.
pub fn account_register(
    books: &Books,
    account_id: AccountId,
    range: &DateRange,
) -> DomainResult<AccountRegister> {
    let account = books.account(account_id)?;
    let by_transaction = books.splits_by_transaction();

    let mut rows: Vec<(&Transaction, &Split)> = books
        .splits()
        .filter(|s| s.account_id == account_id)
        .filter_map(|s| books.transaction(s.transaction_id).ok().map(|t| (t, s)))
        .filter(|(t, _)| range.contains(t.date))
        .collect();
    rows.sort_by_key(|(t, s)| (t.date, t.sequence, s.sequence));

    let opening_balance = Decimal::ZERO;
    let mut running = opening_balance;
    let mut entries = Vec::with_capacity(rows.len());

    for (txn, split) in rows {
        let voided = txn.is_voided();
        if !voided {
            running = running.saturating_add(split.amount);
        }

        let other_accounts = other_account_names(books, account, by_transaction.get(&txn.id));
        entries.push(RegisterEntry {
            transaction_id: txn.id,
            split_id: split.id,
            date: txn.date,
            num: txn.num.clone(),
            description: txn.description.clone(),
            memo: split.memo.clone(),
            amount: split.amount,
            balance: running,
            reconcile_status: split.reconcile_status,
            voided,
            is_split: other_accounts.len() > 1,
            other_accounts,
        });
    }

    Ok(AccountRegister {
        account_id,
        account_name: account.full_name.clone(),
        account_type: account.account_type,
        normal_balance: account.normal_balance(),
        entries,
        opening_balance,
        closing_balance: running,
    })
}

/// Distinct other accounts touched by a transaction, in split order.
fn other_account_names(books: &Books, account: &Account, splits: Option<&Vec<&Split>>) -> Vec<String> {
    let mut seen: Vec<AccountId> = Vec::new();
    let mut names = Vec::new();
    for split in splits.into_iter().flatten() {
        if split.account_id == account.id || seen.contains(&split.account_id) {
            continue;
        }
        seen.push(split.account_id);
        if let Ok(other) = books.account(split.account_id) {
            names.push(other.full_name.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Currency;
    use crate::chart::CreateAccount;
    use crate::journal::CreateTransaction;
    use crate::transaction::SplitDraft;
    use chrono::{DateTime, Utc};
    use piggybank_core::OwnerId;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn account(books: &mut Books, name: &str, account_type: AccountType) -> AccountId {
        books
            .create_account(
                CreateAccount {
                    parent_id: None,
                    name: name.into(),
                    account_type,
                    currency: Currency::Usd,
                    placeholder: false,
                    description: None,
                },
                now(),
            )
            .unwrap()
            .id
    }

    fn post(books: &mut Books, on: NaiveDate, legs: &[(AccountId, Decimal)]) -> TransactionId {
        books
            .create_transaction(
                CreateTransaction {
                    date: on,
                    num: None,
                    description: format!("txn on {on}"),
                    notes: None,
                    splits: legs
                        .iter()
                        .map(|(account_id, amount)| SplitDraft {
                            account_id: *account_id,
                            amount: *amount,
                            currency: Currency::Usd,
                            memo: None,
                            reconcile_status: None,
                        })
                        .collect(),
                },
                now(),
            )
            .unwrap()
            .transaction
            .id
    }

    #[test]
    fn running_balance_follows_date_order() {
        let mut books = Books::new(OwnerId::new());
        let cash = account(&mut books, "Cash", AccountType::Asset);
        let food = account(&mut books, "Food", AccountType::Expense);
        let salary = account(&mut books, "Salary", AccountType::Income);

        post(&mut books, date(10), &[(food, dec!(50.00)), (cash, dec!(-50.00))]);
        post(&mut books, date(1), &[(cash, dec!(1000)), (salary, dec!(-1000))]);

        let register = account_register(&books, cash, &DateRange::all()).unwrap();
        let balances: Vec<Decimal> = register.entries.iter().map(|e| e.balance).collect();
        assert_eq!(balances, vec![dec!(1000), dec!(950.00)]);
        assert_eq!(register.closing_balance, dec!(950));
        assert_eq!(register.opening_balance, Decimal::ZERO);
        assert_eq!(register.account_name, "Cash");
        assert_eq!(register.normal_balance, NormalBalance::Debit);
        assert_eq!(register.entries[0].other_accounts, vec!["Salary".to_string()]);
        assert!(!register.entries[0].is_split);
    }

    #[test]
    fn same_day_entries_keep_insertion_order() {
        let mut books = Books::new(OwnerId::new());
        let cash = account(&mut books, "Cash", AccountType::Asset);
        let food = account(&mut books, "Food", AccountType::Expense);

        let first = post(&mut books, date(5), &[(food, dec!(1)), (cash, dec!(-1))]);
        let second = post(&mut books, date(5), &[(food, dec!(2)), (cash, dec!(-2))]);

        let register = account_register(&books, cash, &DateRange::all()).unwrap();
        let order: Vec<TransactionId> = register.entries.iter().map(|e| e.transaction_id).collect();
        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn voided_rows_are_shown_but_not_accumulated() {
        let mut books = Books::new(OwnerId::new());
        let cash = account(&mut books, "Cash", AccountType::Asset);
        let food = account(&mut books, "Food", AccountType::Expense);
        let txn = post(&mut books, date(2), &[(food, dec!(50.00)), (cash, dec!(-50.00))]);

        books.void_transaction(txn, None, now()).unwrap();
        let register = account_register(&books, cash, &DateRange::all()).unwrap();
        assert_eq!(register.entries.len(), 1);
        assert!(register.entries[0].voided);
        assert!(register.closing_balance.is_zero());

        books.unvoid_transaction(txn, now()).unwrap();
        let register = account_register(&books, cash, &DateRange::all()).unwrap();
        assert_eq!(register.closing_balance, dec!(-50.00));
    }

    #[test]
    fn multi_way_transactions_are_flagged() {
        let mut books = Books::new(OwnerId::new());
        let cash = account(&mut books, "Cash", AccountType::Asset);
        let food = account(&mut books, "Food", AccountType::Expense);
        let rent = account(&mut books, "Rent", AccountType::Expense);

        post(&mut books, date(3), &[(food, dec!(20)), (rent, dec!(30)), (cash, dec!(-50))]);

        let register = account_register(&books, cash, &DateRange::all()).unwrap();
        assert!(register.entries[0].is_split);
        assert_eq!(register.entries[0].other_accounts, vec!["Food".to_string(), "Rent".to_string()]);

        // From Food's side there are two other accounts as well.
        let register = account_register(&books, food, &DateRange::all()).unwrap();
        assert!(register.entries[0].is_split);
    }

    #[test]
    fn date_range_filters_rows() {
        let mut books = Books::new(OwnerId::new());
        let cash = account(&mut books, "Cash", AccountType::Asset);
        let food = account(&mut books, "Food", AccountType::Expense);
        for d in [1, 10, 20] {
            post(&mut books, date(d), &[(food, dec!(5)), (cash, dec!(-5))]);
        }

        let register =
            account_register(&books, cash, &DateRange::new(Some(date(5)), Some(date(20)))).unwrap();
        assert_eq!(register.entries.len(), 2);
        assert_eq!(register.closing_balance, dec!(-10));
    }

    #[test]
    fn unknown_account_is_not_found() {
        let books = Books::new(OwnerId::new());
        assert!(account_register(&books, AccountId::new(), &DateRange::all()).is_err());
    }
}
