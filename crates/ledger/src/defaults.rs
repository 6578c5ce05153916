//! Starter chart of accounts for a new owner.

use chrono::{DateTime, Utc};

use piggybank_core::{AccountId, DomainError, DomainResult};

use crate::account::{Account, AccountType, Currency};
use crate::books::Books;
use crate::chart::CreateAccount;

struct Template {
    name: &'static str,
    placeholder: bool,
    children: &'static [Template],
}

const fn leaf(name: &'static str) -> Template {
    Template { name, placeholder: false, children: &[] }
}

const fn group(name: &'static str, children: &'static [Template]) -> Template {
    Template { name, placeholder: true, children }
}

const DEFAULT_CHART: &[(AccountType, Template)] = &[
    (
        AccountType::Asset,
        group(
            "Assets",
            &[leaf("Cash"), group("Bank", &[leaf("Checking")]), group("Investments", &[])],
        ),
    ),
    (
        AccountType::Liability,
        group("Liabilities", &[leaf("Credit Card"), group("Loans", &[])]),
    ),
    (
        AccountType::Equity,
        group("Equity", &[leaf("Opening Balances"), leaf("Retained Earnings")]),
    ),
    (
        AccountType::Income,
        group("Income", &[leaf("Salary"), leaf("Interest"), leaf("Other Income")]),
    ),
    (
        AccountType::Expense,
        group(
            "Expenses",
            &[
                group("Food", &[leaf("Groceries"), leaf("Restaurants")]),
                group("Housing", &[leaf("Rent"), leaf("Utilities")]),
                leaf("Transportation"),
                leaf("Entertainment"),
            ],
        ),
    ),
];

impl Books {
    /// Create the standard five-root chart in USD. Only allowed on books with
    /// no accounts yet.
    pub fn seed_default_accounts(&mut self, now: DateTime<Utc>) -> DomainResult<Vec<Account>> {
        if self.accounts().next().is_some() {
            return Err(DomainError::conflict("owner already has accounts"));
        }

        let mut created = Vec::new();
        for (account_type, template) in DEFAULT_CHART {
            self.seed_template(template, None, *account_type, now, &mut created)?;
        }
        Ok(created)
    }

    fn seed_template(
        &mut self,
        template: &Template,
        parent_id: Option<AccountId>,
        account_type: AccountType,
        now: DateTime<Utc>,
        created: &mut Vec<Account>,
    ) -> DomainResult<()> {
        let account = self.create_account(
            CreateAccount {
                parent_id,
                name: template.name.to_string(),
                account_type,
                currency: Currency::Usd,
                placeholder: template.placeholder,
                description: None,
            },
            now,
        )?;
        let id = account.id;
        created.push(account);

        for child in template.children {
            self.seed_template(child, Some(id), account_type, now, created)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piggybank_core::OwnerId;

    #[test]
    fn seeds_full_chart_once() {
        let mut books = Books::new(OwnerId::new());
        let created = books.seed_default_accounts(Utc::now()).unwrap();

        assert_eq!(created.len(), 24);
        let checking = created.iter().find(|a| a.name == "Checking").unwrap();
        assert_eq!(checking.full_name, "Assets:Bank:Checking");
        assert!(!checking.placeholder);
        let food = created.iter().find(|a| a.full_name == "Expenses:Food").unwrap();
        assert!(food.placeholder);
        assert_eq!(food.account_type, AccountType::Expense);

        let err = books.seed_default_accounts(Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
