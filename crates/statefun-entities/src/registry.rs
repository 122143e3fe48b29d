//! Per-entity-id instance registry. Each instance is wrapped in its own
//! `tokio::sync::Mutex` so commands for one entity id serialize (the
//! single-writer guarantee) while different ids run fully concurrently.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct InstanceRegistry<T> {
    instances: RwLock<HashMap<String, Arc<Mutex<T>>>>,
}

impl<T> Default for InstanceRegistry<T> {
    fn default() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> InstanceRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance for `entity_id`, constructing it with `make` on
    /// first access.
    pub fn get_or_create(&self, entity_id: &str, make: impl FnOnce() -> T) -> Arc<Mutex<T>> {
        if let Some(existing) = self.instances.read().get(entity_id) {
            return existing.clone();
        }
        let mut instances = self.instances.write();
        instances
            .entry(entity_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(make())))
            .clone()
    }

    /// Drops an instance, e.g. after its passivation timeout elapses.
    pub fn passivate(&self, entity_id: &str) {
        self.instances.write().remove(entity_id);
    }

    pub fn active_count(&self) -> usize {
        self.instances.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_id_returns_the_same_instance() {
        let registry: InstanceRegistry<i64> = InstanceRegistry::new();
        let a = registry.get_or_create("e-1", || 0);
        {
            let mut guard = a.lock().await;
            *guard = 42;
        }
        let b = registry.get_or_create("e-1", || -1);
        assert_eq!(*b.lock().await, 42);
    }

    #[tokio::test]
    async fn passivate_forgets_the_instance() {
        let registry: InstanceRegistry<i64> = InstanceRegistry::new();
        registry.get_or_create("e-1", || 0);
        assert_eq!(registry.active_count(), 1);
        registry.passivate("e-1");
        assert_eq!(registry.active_count(), 0);
    }
}
