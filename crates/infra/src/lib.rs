//! Infrastructure layer: owner-partitioned storage and the ledger service facade.

pub mod service;
pub mod store;

pub use service::{LedgerService, PageLimits};
pub use store::{
    InMemoryLedgerStore, JsonFileSnapshots, LedgerStore, NoSnapshots, SnapshotStore, StoreError,
};
