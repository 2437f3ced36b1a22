//! On-disk tile cache.
//!
//! Tiles are stored as `<root>/<zoom>/<x>/<y>.<ext>` under one of two roots:
//!
//! - the **persistent root** (`<medium root>/<cache name>`), counted toward
//!   the size budget and cleaned by age, and
//! - the **scratch root**, used while caching is off; never counted and
//!   emptied on every cleaning pass.
//!
//! The pieces compose in [`crate::service::TileCache`]:
//!
//! - [`StorageLocationResolver`] picks the persistent root from a
//!   [`StorageMedium`] and purges it when a reconfiguration moves it.
//! - [`TileStore`] looks tiles up (touching their modification time) and
//!   persists rendered bytes.
//! - [`EvictionEngine`] keeps [`CacheState`] within the configured budget.

mod eviction;
mod path;
mod stats;
mod storage;
mod store;
pub mod walk;

pub use eviction::{CacheState, CleaningReport, EvictionEngine};
pub use path::tile_path;
pub use stats::CacheStats;
pub use storage::{
    FixedSpaceMedium, LocalStorage, StorageKind, StorageLocationResolver, StorageMedium,
    StorageRoot,
};
pub use store::{PersistedTile, TileStore};
