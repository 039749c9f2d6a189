mod config;
mod memory;
mod metrics;

pub use config::*;
pub use memory::MemoryBlockstore;
pub use metrics::*;

use chainwire_types::{ChainwireError, ChainwireResult};
use sled::{Db, Tree};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

/// Sled-backed node storage: the local block store and the node keypair.
#[derive(Clone)]
pub struct NodeStorage {
    db: Db,
    blocks: Tree,
    identity: Tree,
    storage_config: Arc<StorageConfig>,
    metrics: Arc<StorageMetrics>,
}

impl NodeStorage {
    pub fn open(config: StorageConfig) -> ChainwireResult<Self> {
        let path = &config.path;
        info!("Opening storage at {:?}", path);

        let sled_config = sled::Config::new()
            .path(path)
            .cache_capacity(config.cache_capacity_bytes)
            .mode(sled::Mode::HighThroughput)
            .flush_every_ms(config.flush_every_ms);

        let db = sled_config
            .open()
            .map_err(|e| ChainwireError::Storage(format!("Failed to open database: {}", e)))?;

        let storage = Self::create_from_db(db, config)?;
        info!("Storage opened with {} blocks", storage.block_count());
        Ok(storage)
    }

    pub fn in_memory() -> ChainwireResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| ChainwireError::Storage(format!("Failed to open temp database: {}", e)))?;

        Self::create_from_db(
            db,
            StorageConfig {
                path: std::path::PathBuf::new(),
                ..Default::default()
            },
        )
    }

    fn create_from_db(db: Db, config: StorageConfig) -> ChainwireResult<Self> {
        let blocks = Self::open_tree(&db, "blocks")?;
        let identity = Self::open_tree(&db, "identity")?;

        Ok(Self {
            db,
            blocks,
            identity,
            storage_config: Arc::new(config),
            metrics: Arc::new(StorageMetrics::new()),
        })
    }

    fn open_tree(db: &Db, name: &str) -> ChainwireResult<Tree> {
        db.open_tree(name)
            .map_err(|e| ChainwireError::Storage(format!("Failed to open {} tree: {}", name, e)))
    }

    pub fn flush(&self) -> ChainwireResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush()
            .map_err(|e| ChainwireError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }

    pub async fn flush_async(&self) -> ChainwireResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush_async()
            .await
            .map_err(|e| ChainwireError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> ChainwireResult<u64> {
        self.db
            .size_on_disk()
            .map_err(|e| ChainwireError::Storage(format!("Size error: {}", e)))
    }

    pub fn storage_metrics(&self) -> Arc<StorageMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &StorageConfig {
        &self.storage_config
    }

    pub fn is_in_memory(&self) -> bool {
        self.storage_config.path.as_os_str().is_empty()
    }
}

mod blocks;
mod identity;

#[cfg(test)]
mod tests;
