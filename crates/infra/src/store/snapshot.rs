//! Snapshot persistence for owner books.
//!
//! A snapshot is the whole `Books` value for one owner, serialized as JSON.
//! The in-memory store loads a snapshot the first time an owner is touched and
//! saves one after every committed write.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use piggybank_core::{DomainError, OwnerId};
use piggybank_ledger::Books;

use super::StoreError;

/// Snapshot backend used by [`super::InMemoryLedgerStore`].
pub trait SnapshotStore: Send + Sync {
    fn load(&self, owner_id: OwnerId) -> Result<Option<Books>, StoreError>;
    fn save(&self, books: &Books) -> Result<(), StoreError>;
}

impl<T> SnapshotStore for Box<T>
where
    T: SnapshotStore + ?Sized,
{
    fn load(&self, owner_id: OwnerId) -> Result<Option<Books>, StoreError> {
        (**self).load(owner_id)
    }

    fn save(&self, books: &Books) -> Result<(), StoreError> {
        (**self).save(books)
    }
}

/// Memory-only operation: nothing is loaded, nothing is saved.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl SnapshotStore for NoSnapshots {
    fn load(&self, _owner_id: OwnerId) -> Result<Option<Books>, StoreError> {
        Ok(None)
    }

    fn save(&self, _books: &Books) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One `<owner_id>.json` file per owner under a directory.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the previous snapshot, so readers never see a partially written file.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshots {
    dir: PathBuf,
}

impl JsonFileSnapshots {
    /// Use `dir` for snapshots, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, owner_id: OwnerId) -> PathBuf {
        self.dir.join(format!("{owner_id}.json"))
    }
}

impl SnapshotStore for JsonFileSnapshots {
    fn load(&self, owner_id: OwnerId) -> Result<Option<Books>, StoreError> {
        let bytes = match fs::read(self.path_for(owner_id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let books: Books = serde_json::from_slice(&bytes)?;
        if books.owner_id() != owner_id {
            return Err(DomainError::internal(format!(
                "snapshot for owner {owner_id} belongs to owner {}",
                books.owner_id()
            ))
            .into());
        }
        books.check_ownership()?;
        Ok(Some(books))
    }

    fn save(&self, books: &Books) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, books)?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(books.owner_id()))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use piggybank_ledger::{AccountType, CreateAccount, CreateTransaction, Currency, SplitDraft};
    use rust_decimal_macros::dec;

    fn sample_books() -> Books {
        let mut books = Books::new(OwnerId::new());
        let open = |books: &mut Books, name: &str, account_type| {
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
                    Utc::now(),
                )
                .unwrap()
                .id
        };
        let cash = open(&mut books, "Cash", AccountType::Asset);
        let food = open(&mut books, "Food", AccountType::Expense);
        books
            .create_transaction(
                CreateTransaction {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    num: Some("42".into()),
                    description: "groceries".into(),
                    notes: None,
                    splits: vec![
                        SplitDraft {
                            account_id: food,
                            amount: dec!(12.3456),
                            currency: Currency::Usd,
                            memo: None,
                            reconcile_status: None,
                        },
                        SplitDraft {
                            account_id: cash,
                            amount: dec!(-12.3456),
                            currency: Currency::Usd,
                            memo: Some("wallet".into()),
                            reconcile_status: None,
                        },
                    ],
                },
                Utc::now(),
            )
            .unwrap();
        books
    }

    #[test]
    fn missing_snapshot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonFileSnapshots::new(dir.path()).unwrap();
        assert!(snapshots.load(OwnerId::new()).unwrap().is_none());
    }

    #[test]
    fn saved_books_load_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonFileSnapshots::new(dir.path().join("nested")).unwrap();
        let books = sample_books();

        snapshots.save(&books).unwrap();
        let loaded = snapshots.load(books.owner_id()).unwrap().unwrap();
        assert_eq!(loaded, books);
    }

    #[test]
    fn snapshot_for_another_owner_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = JsonFileSnapshots::new(dir.path()).unwrap();
        let books = sample_books();
        snapshots.save(&books).unwrap();

        let impostor = OwnerId::new();
        fs::rename(
            dir.path().join(format!("{}.json", books.owner_id())),
            dir.path().join(format!("{impostor}.json")),
        )
        .unwrap();
        assert!(snapshots.load(impostor).is_err());
    }
}
