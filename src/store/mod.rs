//! Index store abstraction.
//!
//! The sweeper only needs to list index names and delete an index by name.
//! [`StoreConnector`] produces a fresh [`IndexStore`] for every sweep attempt
//! so no connection state survives between runs.

mod elasticsearch;
mod error;
#[cfg(test)]
pub mod memory;
mod traits;

pub use elasticsearch::{ElasticsearchConnector, ElasticsearchStore};
pub use error::{StoreError, StoreResult};
pub use traits::{IndexStore, StoreConnector};
