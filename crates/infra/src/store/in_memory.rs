use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use piggybank_core::{DomainResult, OwnerId};
use piggybank_ledger::Books;

use super::snapshot::{NoSnapshots, SnapshotStore};
use super::{LedgerStore, StoreError};

type Slot = Arc<RwLock<Books>>;

/// In-memory ledger store with one lock per owner.
///
/// Writes clone the owner's books, run the unit of work on the clone and swap
/// it in on success. A failed unit of work (or a failed snapshot save) drops
/// the clone, leaving the committed books untouched.
#[derive(Debug)]
pub struct InMemoryLedgerStore<C = NoSnapshots>
where
    C: SnapshotStore,
{
    owners: RwLock<HashMap<OwnerId, Slot>>,
    snapshots: C,
}

impl InMemoryLedgerStore {
    /// Memory-only store.
    pub fn new() -> Self {
        Self::with_snapshots(NoSnapshots)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InMemoryLedgerStore<C>
where
    C: SnapshotStore,
{
    /// Store that loads owner books lazily from `snapshots` and saves them
    /// after every committed write.
    pub fn with_snapshots(snapshots: C) -> Self {
        Self {
            owners: RwLock::new(HashMap::new()),
            snapshots,
        }
    }

    /// Slot of an owner already in memory or on disk. Owners with neither get
    /// no slot, so reads alone never grow the owner map.
    fn find_slot(&self, owner_id: OwnerId) -> Result<Option<Slot>, StoreError> {
        {
            let owners = self.owners.read().map_err(|_| StoreError::Poisoned)?;
            if let Some(slot) = owners.get(&owner_id) {
                return Ok(Some(Arc::clone(slot)));
            }
        }

        let mut owners = self.owners.write().map_err(|_| StoreError::Poisoned)?;
        // Another writer may have loaded it between the two locks.
        if let Some(slot) = owners.get(&owner_id) {
            return Ok(Some(Arc::clone(slot)));
        }

        Ok(self.snapshots.load(owner_id)?.map(|books| {
            let slot = Arc::new(RwLock::new(books));
            owners.insert(owner_id, Arc::clone(&slot));
            slot
        }))
    }

    fn slot_for_write(&self, owner_id: OwnerId) -> Result<Slot, StoreError> {
        if let Some(slot) = self.find_slot(owner_id)? {
            return Ok(slot);
        }
        let mut owners = self.owners.write().map_err(|_| StoreError::Poisoned)?;
        let slot = owners
            .entry(owner_id)
            .or_insert_with(|| Arc::new(RwLock::new(Books::new(owner_id))));
        Ok(Arc::clone(slot))
    }
}

impl<C> LedgerStore for InMemoryLedgerStore<C>
where
    C: SnapshotStore,
{
    fn read<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&Books) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        let Some(slot) = self.find_slot(owner_id)? else {
            return Ok(f(&Books::new(owner_id))?);
        };
        let books = slot.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&*books)?)
    }

    fn write<T>(
        &self,
        owner_id: OwnerId,
        f: impl FnOnce(&mut Books) -> DomainResult<T>,
    ) -> Result<T, StoreError> {
        let slot = self.slot_for_write(owner_id)?;
        // Units of work run on a clone, so a slot poisoned by a panicking
        // closure still holds the last committed books.
        let mut committed = slot.write().unwrap_or_else(PoisonError::into_inner);

        let mut working = committed.clone();
        let out = f(&mut working)?;

        self.snapshots.save(&working)?;
        *committed = working;
        Ok(out)
    }
}
