//! Owner-scoped ledger service.
//!
//! `LedgerService` is the synchronous call/return surface the HTTP layer (or
//! any other caller) uses. Every method takes the caller's `OwnerId` and runs
//! one unit of work against that owner's books:
//!
//! ```text
//! caller(owner, args)
//!   ↓
//! store.write(owner, |books| books.<operation>(args, now))   // all-or-nothing
//!   ↓
//! committed result (or error, with prior state untouched)
//! ```
//!
//! Mutations run inside an `info_span!` carrying the operation name, the
//! owner and (when known up front) the entity id. The outcome line, success
//! or failure, is logged inside that span.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use piggybank_core::{AccountId, DomainError, DomainResult, OwnerId, SplitId, TransactionId};
use piggybank_ledger::{
    Account, AccountRegister, AccountTreeNode, Books, CreateAccount, CreateTransaction, DateRange,
    ReconcileStatus, SplitDetail, TransactionDetail, TransactionFilter, TransactionPage,
    UpdateAccount, UpdateTransaction, account_balance, account_register, account_tree,
};

use crate::store::{LedgerStore, StoreError};

/// Paging bounds for transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerService<S> {
    store: S,
    limits: PageLimits,
}

impl<S> LedgerService<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            limits: PageLimits::default(),
        }
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn page_limits(&self) -> PageLimits {
        self.limits
    }

    fn mutate<T>(
        &self,
        operation: &'static str,
        owner_id: OwnerId,
        entity_id: Option<String>,
        f: impl FnOnce(&mut Books) -> DomainResult<T>,
        committed: impl FnOnce(&T),
    ) -> Result<T, StoreError> {
        let span = tracing::info_span!(
            "ledger_mutation",
            operation,
            owner_id = %owner_id,
            entity_id = entity_id.as_deref().unwrap_or("-"),
        );
        let _entered = span.enter();

        let result = self.store.write(owner_id, f);
        match &result {
            Ok(value) => committed(value),
            Err(StoreError::Domain(e)) => {
                warn!(code = e.code(), error = %e, "ledger mutation rejected");
            }
            Err(e) => {
                error!(error = %e, "ledger store failure");
            }
        }
        result
    }

    // -------------------------
    // Account Store
    // -------------------------

    pub fn create_account(&self, owner_id: OwnerId, cmd: CreateAccount) -> Result<Account, StoreError> {
        self.mutate(
            "create_account",
            owner_id,
            None,
            |books| books.create_account(cmd, Utc::now()),
            |account| info!(account_id = %account.id, full_name = %account.full_name, "account created"),
        )
    }

    /// Rename, reparent and/or re-describe an account. Descendant full names
    /// are rewritten in the same unit of work.
    pub fn update_account(
        &self,
        owner_id: OwnerId,
        id: AccountId,
        cmd: UpdateAccount,
    ) -> Result<Account, StoreError> {
        self.mutate(
            "update_account",
            owner_id,
            Some(id.to_string()),
            |books| books.update_account(id, cmd, Utc::now()),
            |account| info!(full_name = %account.full_name, "account updated"),
        )
    }

    pub fn delete_account(&self, owner_id: OwnerId, id: AccountId) -> Result<(), StoreError> {
        self.mutate(
            "delete_account",
            owner_id,
            Some(id.to_string()),
            |books| books.delete_account(id).map(|_| ()),
            |_| info!("account deleted"),
        )
    }

    pub fn get_account(&self, owner_id: OwnerId, id: AccountId) -> Result<Account, StoreError> {
        self.store.read(owner_id, |books| books.account(id).cloned())
    }

    pub fn list_accounts(&self, owner_id: OwnerId) -> Result<Vec<Account>, StoreError> {
        self.store
            .read(owner_id, |books| Ok(books.list_accounts().into_iter().cloned().collect()))
    }

    pub fn account_balance(&self, owner_id: OwnerId, id: AccountId) -> Result<Decimal, StoreError> {
        self.store.read(owner_id, |books| account_balance(books, id))
    }

    pub fn account_tree(&self, owner_id: OwnerId) -> Result<Vec<AccountTreeNode>, StoreError> {
        self.store.read(owner_id, |books| Ok(account_tree(books)))
    }

    pub fn seed_default_accounts(&self, owner_id: OwnerId) -> Result<Vec<Account>, StoreError> {
        self.mutate(
            "seed_default_accounts",
            owner_id,
            None,
            |books| books.seed_default_accounts(Utc::now()),
            |created| info!(count = created.len(), "default chart of accounts created"),
        )
    }

    // -------------------------
    // Ledger Engine
    // -------------------------

    pub fn create_transaction(
        &self,
        owner_id: OwnerId,
        cmd: CreateTransaction,
    ) -> Result<TransactionDetail, StoreError> {
        self.mutate(
            "create_transaction",
            owner_id,
            None,
            |books| books.create_transaction(cmd, Utc::now()),
            |detail| {
                info!(
                    transaction_id = %detail.transaction.id,
                    splits = detail.splits.len(),
                    "transaction created"
                )
            },
        )
    }

    pub fn update_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
        cmd: UpdateTransaction,
    ) -> Result<TransactionDetail, StoreError> {
        self.mutate(
            "update_transaction",
            owner_id,
            Some(id.to_string()),
            |books| books.update_transaction(id, cmd, Utc::now()),
            |detail| info!(splits = detail.splits.len(), "transaction updated"),
        )
    }

    pub fn delete_transaction(&self, owner_id: OwnerId, id: TransactionId) -> Result<(), StoreError> {
        self.mutate(
            "delete_transaction",
            owner_id,
            Some(id.to_string()),
            |books| books.delete_transaction(id),
            |_| info!("transaction deleted"),
        )
    }

    pub fn void_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
        reason: Option<String>,
    ) -> Result<TransactionDetail, StoreError> {
        self.mutate(
            "void_transaction",
            owner_id,
            Some(id.to_string()),
            |books| books.void_transaction(id, reason, Utc::now()),
            |_| info!("transaction voided"),
        )
    }

    pub fn unvoid_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<TransactionDetail, StoreError> {
        self.mutate(
            "unvoid_transaction",
            owner_id,
            Some(id.to_string()),
            |books| books.unvoid_transaction(id, Utc::now()),
            |_| info!("transaction unvoided"),
        )
    }

    pub fn set_reconcile_status(
        &self,
        owner_id: OwnerId,
        split_id: SplitId,
        status: ReconcileStatus,
    ) -> Result<SplitDetail, StoreError> {
        self.mutate(
            "set_reconcile_status",
            owner_id,
            Some(split_id.to_string()),
            |books| books.set_reconcile_status(split_id, status, Utc::now()),
            |_| info!(status = status.as_str(), "split reconcile status set"),
        )
    }

    pub fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<TransactionDetail, StoreError> {
        self.store.read(owner_id, |books| books.transaction_detail(id))
    }

    /// Page through the owner's transactions, newest first. Missing paging
    /// parameters fall back to page 1 and the configured default page size.
    pub fn list_transactions(
        &self,
        owner_id: OwnerId,
        range: DateRange,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<TransactionPage, StoreError> {
        let page_size = page_size.unwrap_or(self.limits.default_page_size);
        if page_size > self.limits.max_page_size {
            return Err(DomainError::bad_request(format!(
                "pageSize must be between 1 and {}",
                self.limits.max_page_size
            ))
            .into());
        }

        let filter = TransactionFilter {
            range,
            page: page.unwrap_or(1),
            page_size,
        };
        self.store.read(owner_id, |books| books.list_transactions(&filter))
    }

    // -------------------------
    // Register Projector
    // -------------------------

    pub fn account_register(
        &self,
        owner_id: OwnerId,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountRegister, StoreError> {
        self.store
            .read(owner_id, |books| account_register(books, account_id, &range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedgerStore;
    use chrono::NaiveDate;
    use piggybank_ledger::{AccountType, Currency, SplitDraft};
    use rust_decimal_macros::dec;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn service() -> LedgerService<Arc<InMemoryLedgerStore>> {
        LedgerService::new(Arc::new(InMemoryLedgerStore::new()))
    }

    fn open(
        svc: &LedgerService<Arc<InMemoryLedgerStore>>,
        owner: OwnerId,
        parent: Option<AccountId>,
        name: &str,
        account_type: AccountType,
    ) -> AccountId {
        svc.create_account(
            owner,
            CreateAccount {
                parent_id: parent,
                name: name.into(),
                account_type,
                currency: Currency::Usd,
                placeholder: false,
                description: None,
            },
        )
        .unwrap()
        .id
    }

    fn leg(account_id: AccountId, amount: Decimal) -> SplitDraft {
        SplitDraft {
            account_id,
            amount,
            currency: Currency::Usd,
            memo: None,
            reconcile_status: None,
        }
    }

    fn spend(description: &str, legs: Vec<SplitDraft>) -> CreateTransaction {
        CreateTransaction {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            num: None,
            description: description.into(),
            notes: None,
            splits: legs,
        }
    }

    #[test]
    fn post_void_unvoid_and_delete_flow() {
        let svc = service();
        let owner = OwnerId::new();
        let food = open(&svc, owner, None, "Food", AccountType::Expense);
        let cash = open(&svc, owner, None, "Cash", AccountType::Asset);

        let detail = svc
            .create_transaction(owner, spend("lunch", vec![leg(food, dec!(50.00)), leg(cash, dec!(-50.00))]))
            .unwrap();
        let id = detail.transaction.id;
        assert_eq!(svc.account_balance(owner, food).unwrap(), dec!(50.00));

        svc.void_transaction(owner, id, Some("duplicate".into())).unwrap();
        let register = svc.account_register(owner, cash, DateRange::all()).unwrap();
        assert!(register.entries[0].voided);
        assert!(register.closing_balance.is_zero());

        svc.unvoid_transaction(owner, id).unwrap();
        assert_eq!(svc.account_balance(owner, cash).unwrap(), dec!(-50.00));

        let blocked = svc.delete_account(owner, cash).unwrap_err();
        assert!(matches!(blocked.domain(), Some(DomainError::Validation(_))));

        svc.delete_transaction(owner, id).unwrap();
        svc.delete_account(owner, cash).unwrap();
    }

    #[test]
    fn unbalanced_transaction_is_rejected_without_side_effects() {
        let svc = service();
        let owner = OwnerId::new();
        let food = open(&svc, owner, None, "Food", AccountType::Expense);
        let cash = open(&svc, owner, None, "Cash", AccountType::Asset);

        let err = svc
            .create_transaction(owner, spend("lunch", vec![leg(food, dec!(50.00)), leg(cash, dec!(-49.99))]))
            .unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        assert!(err.to_string().contains("0.01"));

        let page = svc.list_transactions(owner, DateRange::all(), None, None).unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn other_owners_see_not_found() {
        let svc = service();
        let alice = OwnerId::new();
        let bob = OwnerId::new();
        let cash = open(&svc, alice, None, "Cash", AccountType::Asset);

        let err = svc.get_account(bob, cash).unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::NotFound(_))));
        let err = svc.delete_account(bob, cash).unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::NotFound(_))));
        assert!(svc.get_account(alice, cash).is_ok());
    }

    #[test]
    fn listing_applies_page_limits() {
        let svc = service().with_page_limits(PageLimits {
            default_page_size: 2,
            max_page_size: 3,
        });
        let owner = OwnerId::new();
        let food = open(&svc, owner, None, "Food", AccountType::Expense);
        let cash = open(&svc, owner, None, "Cash", AccountType::Asset);
        for i in 0..3 {
            svc.create_transaction(
                owner,
                spend(&format!("meal {i}"), vec![leg(food, dec!(1)), leg(cash, dec!(-1))]),
            )
            .unwrap();
        }

        let page = svc.list_transactions(owner, DateRange::all(), None, None).unwrap();
        assert_eq!(page.page_size, 2);
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.total, 3);

        let err = svc.list_transactions(owner, DateRange::all(), None, Some(4)).unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::BadRequest(_))));
    }

    #[test]
    fn rename_propagates_through_service() {
        let svc = service();
        let owner = OwnerId::new();
        let assets = open(&svc, owner, None, "Assets", AccountType::Asset);
        let bank = open(&svc, owner, Some(assets), "Bank", AccountType::Asset);
        let checking = open(&svc, owner, Some(bank), "Checking", AccountType::Asset);

        svc.update_account(
            owner,
            bank,
            UpdateAccount {
                name: Some("Banks".into()),
                ..UpdateAccount::default()
            },
        )
        .unwrap();

        assert_eq!(svc.get_account(owner, checking).unwrap().full_name, "Assets:Banks:Checking");
    }

    #[test]
    fn oversized_amounts_are_rejected_and_owner_stays_usable() {
        let svc = service();
        let owner = OwnerId::new();
        let food = open(&svc, owner, None, "Food", AccountType::Expense);
        let cash = open(&svc, owner, None, "Cash", AccountType::Asset);

        let huge = Decimal::from_str_exact("60000000000000000000000000000").unwrap();
        let err = svc
            .create_transaction(owner, spend("overflow", vec![leg(food, huge), leg(cash, huge)]))
            .unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::BadRequest(_))));

        let err = svc
            .create_transaction(owner, spend("too big", vec![leg(food, huge), leg(cash, -huge)]))
            .unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::BadRequest(_))));

        assert_eq!(svc.list_accounts(owner).unwrap().len(), 2);
        assert!(svc.account_balance(owner, food).unwrap().is_zero());
        svc.create_transaction(owner, spend("lunch", vec![leg(food, dec!(12.50)), leg(cash, dec!(-12.50))]))
            .unwrap();
        assert_eq!(svc.account_balance(owner, food).unwrap(), dec!(12.50));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn success_lines_carry_mutation_span_fields() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let owner = OwnerId::new();
        let cash = tracing::subscriber::with_default(subscriber, || {
            let svc = service();
            let cash = open(&svc, owner, None, "Cash", AccountType::Asset);
            svc.delete_account(owner, cash).unwrap();
            cash
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let created = output.lines().find(|l| l.contains("account created")).unwrap();
        assert!(created.contains("ledger_mutation"), "{created}");
        assert!(created.contains("create_account"), "{created}");
        assert!(created.contains(&owner.to_string()), "{created}");

        let deleted = output.lines().find(|l| l.contains("account deleted")).unwrap();
        assert!(deleted.contains("delete_account"), "{deleted}");
        assert!(deleted.contains(&cash.to_string()), "{deleted}");
    }
}
