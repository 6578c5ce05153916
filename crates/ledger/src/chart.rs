//! Chart of accounts: create, rename/reparent and delete accounts.
//!
//! Tree invariants held here:
//! - parent links form a forest (no cycles)
//! - a child's type equals its parent's type
//! - `full_name` is the `:`-joined chain of ancestor short names
//! - sibling short names are unique

use chrono::{DateTime, Utc};

use piggybank_core::{AccountId, DomainError, DomainResult};

use crate::account::{
    Account, AccountType, Currency, MAX_FULL_NAME_LEN, ensure_max_len, join_full_name,
    validate_account_name,
};
use crate::books::Books;

/// Command: CreateAccount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccount {
    pub parent_id: Option<AccountId>,
    pub name: String,
    pub account_type: AccountType,
    pub currency: Currency,
    pub placeholder: bool,
    pub description: Option<String>,
}

/// Command: UpdateAccount (rename, reparent, describe). Absent fields are kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateAccount {
    pub name: Option<String>,
    pub parent_id: Option<AccountId>,
    pub description: Option<String>,
}

impl Books {
    pub fn create_account(&mut self, cmd: CreateAccount, now: DateTime<Utc>) -> DomainResult<Account> {
        let name = validate_account_name(&cmd.name)?;

        let parent_full_name = match cmd.parent_id {
            Some(parent_id) => {
                let parent = self.account(parent_id).map_err(|_| {
                    DomainError::not_found(format!("parent account {parent_id} not found"))
                })?;
                if parent.account_type != cmd.account_type {
                    return Err(DomainError::validation(format!(
                        "account type must match parent account type ({})",
                        parent.account_type
                    )));
                }
                Some(parent.full_name.clone())
            }
            None => None,
        };

        self.ensure_sibling_name_free(cmd.parent_id, &name, None)?;
        let full_name = join_full_name(parent_full_name.as_deref(), &name);
        ensure_max_len("account full name", &full_name, MAX_FULL_NAME_LEN)?;

        let account = Account {
            id: AccountId::new(),
            owner_id: self.owner_id(),
            parent_id: cmd.parent_id,
            full_name,
            name,
            account_type: cmd.account_type,
            currency: cmd.currency,
            placeholder: cmd.placeholder,
            description: cmd.description,
            created_at: now,
            updated_at: now,
        };
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Rename and/or move an account, then rewrite the full name of the
    /// account and of every descendant.
    pub fn update_account(
        &mut self,
        id: AccountId,
        cmd: UpdateAccount,
        now: DateTime<Utc>,
    ) -> DomainResult<Account> {
        let current = self.account(id)?.clone();

        let name = match cmd.name.as_deref() {
            Some(raw) => validate_account_name(raw)?,
            None => current.name.clone(),
        };

        let parent_id = match cmd.parent_id {
            Some(new_parent) if Some(new_parent) != current.parent_id => {
                let parent = self.account(new_parent).map_err(|_| {
                    DomainError::not_found(format!("new parent account {new_parent} not found"))
                })?;
                if parent.account_type != current.account_type {
                    return Err(DomainError::validation(
                        "cannot move account to a parent of different type",
                    ));
                }
                if self.is_self_or_descendant(new_parent, id) {
                    return Err(DomainError::validation(
                        "cannot move account under itself or its own descendant",
                    ));
                }
                Some(new_parent)
            }
            _ => current.parent_id,
        };

        if name != current.name || parent_id != current.parent_id {
            self.ensure_sibling_name_free(parent_id, &name, Some(id))?;
        }

        let parent_full_name = match parent_id {
            Some(p) => Some(self.account(p)?.full_name.clone()),
            None => None,
        };

        let full_name = join_full_name(parent_full_name.as_deref(), &name);
        self.ensure_subtree_full_names_fit(id, &current.full_name, &full_name)?;

        if let Some(account) = self.accounts.get_mut(&id) {
            account.name = name;
            account.parent_id = parent_id;
            account.full_name = full_name;
            if cmd.description.is_some() {
                account.description = cmd.description;
            }
            account.updated_at = now;
        }
        self.propagate_full_names(id);

        self.account(id).cloned()
    }

    /// Delete an account that has neither child accounts nor postings.
    pub fn delete_account(&mut self, id: AccountId) -> DomainResult<Account> {
        self.account(id)?;

        if self.has_postings(id) {
            return Err(DomainError::validation(
                "cannot delete account with existing transactions",
            ));
        }
        if self.has_children(id) {
            return Err(DomainError::validation("cannot delete account with child accounts"));
        }

        self.accounts
            .remove(&id)
            .ok_or_else(|| DomainError::not_found(format!("account {id} not found")))
    }

    /// All accounts ordered by full name.
    pub fn list_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts().collect();
        accounts.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        accounts
    }

    fn ensure_sibling_name_free(
        &self,
        parent_id: Option<AccountId>,
        name: &str,
        except: Option<AccountId>,
    ) -> DomainResult<()> {
        let taken = self
            .children_of(parent_id)
            .any(|sibling| sibling.name == name && Some(sibling.id) != except);
        if taken {
            return Err(DomainError::conflict(format!(
                "an account named '{name}' already exists under this parent"
            )));
        }
        Ok(())
    }

    /// Every full name in the subtree of `root` shares its prefix, so the
    /// longest one grows by exactly the change in the root's full name.
    fn ensure_subtree_full_names_fit(&self, root: AccountId, old: &str, new: &str) -> DomainResult<()> {
        let longest = self
            .accounts()
            .filter(|a| self.is_self_or_descendant(a.id, root))
            .map(|a| a.full_name.chars().count())
            .max()
            .unwrap_or(0);
        let projected = longest.saturating_sub(old.chars().count()) + new.chars().count();
        if projected > MAX_FULL_NAME_LEN {
            return Err(DomainError::bad_request(format!(
                "account full name cannot be longer than {MAX_FULL_NAME_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Upward id-walk from `candidate`: true if `ancestor` is on the chain
    /// (including `candidate` itself).
    fn is_self_or_descendant(&self, candidate: AccountId, ancestor: AccountId) -> bool {
        let mut current = Some(candidate);
        // Bounded by the account count so a corrupt chain cannot spin forever.
        let mut steps = 0usize;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.accounts.len() {
                return true;
            }
            current = self.accounts.get(&id).and_then(|a| a.parent_id);
        }
        false
    }

    /// Recompute full names below `root` (depth-first).
    fn propagate_full_names(&mut self, root: AccountId) {
        let Some(root_full_name) = self.accounts.get(&root).map(|a| a.full_name.clone()) else {
            return;
        };

        let children: Vec<AccountId> = self.children_of(Some(root)).map(|a| a.id).collect();
        for child_id in children {
            if let Some(child) = self.accounts.get_mut(&child_id) {
                child.full_name = join_full_name(Some(&root_full_name), &child.name);
            }
            self.propagate_full_names(child_id);
        }
    }
}
