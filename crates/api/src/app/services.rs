use std::sync::Arc;

use piggybank_infra::{
    InMemoryLedgerStore, JsonFileSnapshots, LedgerService, NoSnapshots, SnapshotStore, StoreError,
};

use crate::config::AppConfig;

pub type AppStore = Arc<InMemoryLedgerStore<Box<dyn SnapshotStore>>>;

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub ledger: LedgerService<AppStore>,
}

pub fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let snapshots: Box<dyn SnapshotStore> = match &config.storage.snapshot_dir {
        Some(dir) => {
            let snapshots = JsonFileSnapshots::new(dir)?;
            tracing::info!(dir = %snapshots.dir().display(), "persisting ledger snapshots");
            Box::new(snapshots)
        }
        None => {
            tracing::warn!("storage.snapshot_dir not set; ledger data lives in memory only");
            Box::new(NoSnapshots)
        }
    };

    let store = Arc::new(InMemoryLedgerStore::with_snapshots(snapshots));
    let ledger = LedgerService::new(store).with_page_limits(config.transactions.page_limits());
    Ok(AppServices { ledger })
}
