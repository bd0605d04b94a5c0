use async_trait::async_trait;

use super::error::StoreResult;

/// An index store the sweeper can enumerate and prune.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Names of every index currently in the store, in no particular order.
    async fn index_names(&self) -> StoreResult<Vec<String>>;

    /// Delete a single index by name. Irreversible.
    async fn delete_index(&self, name: &str) -> StoreResult<()>;
}

/// Creates a fresh store connection for each sweep attempt.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Connect and verify the store is reachable.
    async fn connect(&self) -> StoreResult<Box<dyn IndexStore>>;

    /// Human-readable endpoint, for logging.
    fn endpoint(&self) -> String;
}

#[async_trait]
impl<S: IndexStore + ?Sized> IndexStore for std::sync::Arc<S> {
    async fn index_names(&self) -> StoreResult<Vec<String>> {
        (**self).index_names().await
    }

    async fn delete_index(&self, name: &str) -> StoreResult<()> {
        (**self).delete_index(name).await
    }
}
