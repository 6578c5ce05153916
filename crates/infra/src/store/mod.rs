//! Ledger storage boundary.
//!
//! A `LedgerStore` hands out one owner's [`Books`] either read-only or as a
//! unit of work. The unit of work is all-or-nothing: the closure runs against
//! a working copy and only an `Ok` result is committed.
//!
//! ## Guarantees
//!
//! - **Owner isolation**: each owner has an independent set of books; ids from
//!   another owner simply do not resolve (`NotFound`).
//! - **Serialized writes**: writes to the same owner never interleave, so a
//!   rename racing a reparent cannot observe a half-propagated subtree.
//! - **Committed reads**: readers only ever see state produced by a complete,
//!   successful write.

pub mod in_memory;
pub mod snapshot;

use std::sync::Arc;

use thiserror::Error;

use piggybank_core::{DomainError, DomainResult, OwnerId};
use piggybank_ledger::Books;

pub use in_memory::InMemoryLedgerStore;
pub use snapshot::{JsonFileSnapshots, NoSnapshots, SnapshotStore};

/// Store operation error.
///
/// Domain rule failures pass through untouched; everything else is an
/// infrastructure failure the caller should report as internal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("ledger store lock poisoned")]
    Poisoned,

    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Owner-scoped unit-of-work access to books.
pub trait LedgerStore: Send + Sync {
    /// Run `f` against the owner's committed books.
    fn read<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&Books) -> DomainResult<T>,
    ) -> Result<T, StoreError>;

    /// Run `f` against a working copy of the owner's books and commit it only
    /// if `f` succeeds (and, when persistence is configured, the snapshot
    /// save succeeds too).
    fn write<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&mut Books) -> DomainResult<T>,
    ) -> Result<T, StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore,
{
    fn read<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&Books) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        (**self).read(owner_id, f)
    }

    fn write<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&mut Books) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        (**self).write(owner_id, f)
    }
}
