use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use quay_store::QueueSession;
use quay_store::QueueStore;
use quay_store::StoreError;

use crate::store::DeterministicQueueStore;

/// In-memory session mapping cache names to [`DeterministicQueueStore`]s.
///
/// A released store is reactivated on the next lookup; a destroyed one is
/// replaced by an empty store.
pub struct DeterministicSession {
    service_name: String,
    max_queue_bytes: Option<u64>,
    stores: Mutex<HashMap<String, Arc<DeterministicQueueStore>>>,
}

impl DeterministicSession {
    /// Create a session whose stores are unbounded.
    pub fn new(service_name: &str) -> Arc<Self> {
        Arc::new(Self {
            service_name: service_name.to_string(),
            max_queue_bytes: None,
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// Create a session whose stores cap every queue at `max_bytes`.
    pub fn with_max_queue_size(service_name: &str, max_bytes: u64) -> Arc<Self> {
        Arc::new(Self {
            service_name: service_name.to_string(),
            max_queue_bytes: Some(max_bytes),
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// The concrete store behind `cache_name`, creating it if needed.
    pub fn deterministic_store(&self, cache_name: &str) -> Arc<DeterministicQueueStore> {
        let mut stores = self.stores.lock();
        if let Some(existing) = stores.get(cache_name)
            && existing.reactivate()
        {
            return Arc::clone(existing);
        }
        let store = match self.max_queue_bytes {
            Some(max) => DeterministicQueueStore::with_max_queue_size(cache_name, &self.service_name, max),
            None => DeterministicQueueStore::new(cache_name, &self.service_name),
        };
        stores.insert(cache_name.to_string(), Arc::clone(&store));
        store
    }

    /// Names of every cache resolved so far.
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl QueueSession for DeterministicSession {
    fn service_name(&self) -> &str {
        &self.service_name
    }

    async fn store(&self, cache_name: &str) -> Result<Arc<dyn QueueStore>, StoreError> {
        let store: Arc<dyn QueueStore> = self.deterministic_store(cache_name);
        Ok(store)
    }
}
