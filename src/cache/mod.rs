//! Two-tier cache for computed language data.
//!
//! - `memory`: in-process LRU with short TTLs (L1)
//! - `store`: durable key-value-with-metadata contract (L2), `sqlite` implements it
//! - `compression`: pluggable payload compression for L2
//! - `tier`: `CacheTier`, the single get/set/invalidate/stats entry point
//! - `sweeper`: background expiry task with a cancellation token

// Author: kelexine (https://github.com/kelexine)

pub mod compression;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod store;
pub mod sweeper;
pub mod tier;

pub use compression::{Compressor, GzipCompressor};
pub use memory::MemoryTier;
pub use models::{
    CacheEntry, CacheSource, CacheStats, EntryInfo, EntryMetadata, Invalidation, SetOptions,
    StoreSummary,
};
pub use sqlite::{SqliteConnector, SqliteStore};
pub use store::{DurableStore, EntryFilter, StoreConnector};
pub use sweeper::CacheSweeper;
pub use tier::{CacheTier, ENTRY_VERSION};
