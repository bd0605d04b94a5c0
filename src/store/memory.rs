//! In-memory index store for tests.
//!
//! Records every delete request in order and can be told to fail specific
//! deletions, the next N listings, a specific listing, or the next N
//! connection attempts.

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
};

use async_trait::async_trait;

use super::{IndexStore, StoreConnector, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    indices: Mutex<Vec<String>>,
    delete_requests: Mutex<Vec<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_listings: AtomicU32,
    failing_listing_at: Mutex<Option<(u32, u16)>>,
    listings: AtomicU32,
}

impl MemoryStore {
    pub fn with_indices<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: Mutex::new(names.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Make every delete of `name` fail with a server error.
    pub fn fail_delete(&self, name: &str) {
        self.failing_deletes.lock().unwrap().insert(name.to_string());
    }

    /// Make the next `count` listings fail with a transient error.
    pub fn fail_next_listings(&self, count: u32) {
        self.failing_listings.store(count, Ordering::SeqCst);
    }

    /// Make the `number`th listing (1-based) fail with HTTP `status`.
    pub fn fail_listing(&self, number: u32, status: u16) {
        *self.failing_listing_at.lock().unwrap() = Some((number, status));
    }

    /// Every delete request received, in order, including failed ones.
    pub fn delete_requests(&self) -> Vec<String> {
        self.delete_requests.lock().unwrap().clone()
    }

    /// Indices still present.
    pub fn remaining(&self) -> Vec<String> {
        let mut names = self.indices.lock().unwrap().clone();
        names.sort();
        names
    }

    pub fn listings(&self) -> u32 {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn index_names(&self) -> StoreResult<Vec<String>> {
        let number = self.listings.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, status)) = *self.failing_listing_at.lock().unwrap()
            && at == number
        {
            return Err(StoreError::Status {
                status,
                body: "listing failed".to_string(),
            });
        }
        let pending = self.failing_listings.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_listings.store(pending - 1, Ordering::SeqCst);
            return Err(StoreError::Status {
                status: 503,
                body: "cluster_block_exception".to_string(),
            });
        }
        Ok(self.indices.lock().unwrap().clone())
    }

    async fn delete_index(&self, name: &str) -> StoreResult<()> {
        self.delete_requests.lock().unwrap().push(name.to_string());

        if self.failing_deletes.lock().unwrap().contains(name) {
            return Err(StoreError::Status {
                status: 500,
                body: format!("failed to delete {name}"),
            });
        }

        let mut indices = self.indices.lock().unwrap();
        match indices.iter().position(|i| i == name) {
            Some(pos) => {
                indices.remove(pos);
                Ok(())
            }
            None => Err(StoreError::Status {
                status: 404,
                body: "index_not_found_exception".to_string(),
            }),
        }
    }
}

/// Connector handing out the same shared [`MemoryStore`].
pub struct MemoryConnector {
    pub store: Arc<MemoryStore>,
    failing_connects: AtomicU32,
    connects: AtomicU32,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            failing_connects: AtomicU32::new(0),
            connects: AtomicU32::new(0),
        }
    }

    /// Make the next `count` connection attempts fail. `u32::MAX` fails forever.
    pub fn fail_next_connects(&self, count: u32) {
        self.failing_connects.store(count, Ordering::SeqCst);
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self) -> StoreResult<Box<dyn IndexStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let pending = self.failing_connects.load(Ordering::SeqCst);
        if pending > 0 {
            if pending != u32::MAX {
                self.failing_connects.store(pending - 1, Ordering::SeqCst);
            }
            return Err(StoreError::Unreachable("connection refused".to_string()));
        }
        Ok(Box::new(Arc::clone(&self.store)))
    }

    fn endpoint(&self) -> String {
        "memory://test".to_string()
    }
}
