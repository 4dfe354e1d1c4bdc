//! A process-wide registry of protected resources with an LRU-driven GC pass.
//!
//! Registration is idempotent on name: registering an already-known name with
//! compatible options returns the existing resource; incompatible options fail
//! with [`RegistryError::IncompatibleOptions`]. Every insert (and an explicit
//! [`Registry::compact`] call, meant to be run on a periodic schedule) walks the
//! registry looking for idle entries older than `min_time_in_lru` to evict once
//! `max_size` is exceeded, skipping anything still in use.

use crate::config::{ResourceConfig, ResourceFingerprint};
use crate::error::{RegistryError, Result};
use crate::resource::ProtectedResource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry {
    resource: Arc<ProtectedResource>,
    fingerprint: ResourceFingerprint,
}

/// Bounds the registry holds entries to, and how long an idle entry must sit
/// before it becomes eligible for eviction.
#[derive(Debug, Clone, Copy)]
pub struct RegistryLimits {
    pub max_size: usize,
    pub min_time_in_lru: Duration,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_size: 500,
            min_time_in_lru: Duration::from_secs(300),
        }
    }
}

/// An ordered mapping from resource name to protected resource, bounded by
/// [`RegistryLimits`]. `HashMap` plus a per-resource `last_use` (tracked inside
/// [`ProtectedResource`] itself) stands in for a true LRU list — eviction scans
/// are O(n) over entries whose count is bounded by `max_size`, which the teacher's
/// own sliding-window primitive takes the same approach to at a smaller scale.
pub struct Registry {
    limits: RegistryLimits,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `config` under its name. If the name is already registered with
    /// compatible options, returns the existing resource unchanged; `config` is
    /// dropped without constructing a second bulkhead/breaker pair for it.
    pub fn register(&self, config: ResourceConfig) -> Result<Arc<ProtectedResource>> {
        let name = config.name.clone();
        let fingerprint = config.fingerprint();

        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(&name) {
                if entry.fingerprint != fingerprint {
                    return Err(RegistryError::IncompatibleOptions { name });
                }
                return Ok(Arc::clone(&entry.resource));
            }
        }

        let resource = Arc::new(ProtectedResource::register(config)?);
        {
            let mut entries = self.entries.lock().unwrap();
            entries
                .entry(name)
                .or_insert_with(|| Entry {
                    resource: Arc::clone(&resource),
                    fingerprint,
                });
        }
        self.compact();
        Ok(resource)
    }

    /// Looks up `name`, registering it via `make_config` on first use.
    pub fn retrieve_or_register(
        &self,
        name: &str,
        make_config: impl FnOnce() -> ResourceConfig,
    ) -> Result<Arc<ProtectedResource>> {
        if let Some(resource) = self.get(name) {
            return Ok(resource);
        }
        self.register(make_config())
    }

    /// Looks up a previously registered resource by name, without registering it.
    pub fn get(&self, name: &str) -> Option<Arc<ProtectedResource>> {
        self.entries
            .lock()
            .unwrap()
            .get(name)
            .map(|entry| Arc::clone(&entry.resource))
    }

    /// Removes `name` from the registry and tears down its underlying OS objects.
    /// Destructive to any other process still attached to the same resource.
    pub fn destroy(&self, name: &str) {
        let removed = self.entries.lock().unwrap().remove(name);
        if let Some(entry) = removed {
            if let Some(bulkhead) = entry.resource.bulkhead() {
                bulkhead.destroy();
            }
        }
    }

    /// Removes `name` from this process's bookkeeping, decrementing its bulkhead's
    /// registered-worker count, but leaves the underlying OS objects intact for
    /// any other process still attached.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let removed = self.entries.lock().unwrap().remove(name);
        if let Some(entry) = removed {
            if let Some(bulkhead) = entry.resource.bulkhead() {
                bulkhead.unregister_worker()?;
            }
        }
        Ok(())
    }

    /// Unregisters every entry currently in the registry.
    pub fn unregister_all(&self) -> Result<()> {
        let names: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
        for name in names {
            self.unregister(&name)?;
        }
        Ok(())
    }

    /// Destroys every entry and empties the registry. Mainly for test teardown,
    /// mirroring the full reset a test suite runs between cases.
    pub fn reset_all(&self) {
        let removed: Vec<Entry> = self.entries.lock().unwrap().drain().map(|(_, v)| v).collect();
        for entry in removed {
            if let Some(bulkhead) = entry.resource.bulkhead() {
                bulkhead.destroy();
            }
        }
    }

    /// Walks the registry looking for idle, long-unused entries to evict once
    /// `max_size` is exceeded. Called automatically after every insert; expose it
    /// directly too so a caller can run it on its own periodic schedule.
    pub fn compact(&self) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() <= self.limits.max_size {
            return;
        }

        let now = Instant::now();
        let mut candidates: Vec<(String, Instant)> = entries
            .iter()
            .filter(|(_, entry)| entry.resource.is_idle())
            .filter(|(_, entry)| now.duration_since(entry.resource.last_use()) >= self.limits.min_time_in_lru)
            .map(|(name, entry)| (name.clone(), entry.resource.last_use()))
            .collect();
        candidates.sort_by_key(|(_, last_use)| *last_use);

        let mut over_budget = entries.len().saturating_sub(self.limits.max_size);
        for (name, _) in candidates {
            if over_budget == 0 {
                break;
            }
            if let Some(entry) = entries.remove(&name) {
                if let Some(bulkhead) = entry.resource.bulkhead() {
                    bulkhead.destroy();
                }
                over_budget -= 1;
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfigBuilder;

    fn config(name: &str) -> ResourceConfig {
        ResourceConfigBuilder::new(name).tickets(1).build().unwrap()
    }

    #[test]
    fn register_is_idempotent_on_name() {
        let registry = Registry::default();
        let name = format!("registry-idempotent-{}", std::process::id());
        let first = registry.register(config(&name)).unwrap();
        let second = registry.register(config(&name)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        registry.reset_all();
    }

    #[test]
    fn incompatible_reregistration_is_rejected() {
        let registry = Registry::default();
        let name = format!("registry-incompatible-{}", std::process::id());
        registry.register(config(&name)).unwrap();
        let mismatched = ResourceConfigBuilder::new(&name)
            .tickets(4)
            .build()
            .unwrap();
        let err = registry.register(mismatched).unwrap_err();
        assert!(matches!(err, RegistryError::IncompatibleOptions { .. }));
        registry.reset_all();
    }

    #[test]
    fn destroy_removes_the_entry() {
        let registry = Registry::default();
        let name = format!("registry-destroy-{}", std::process::id());
        registry.register(config(&name)).unwrap();
        assert!(registry.get(&name).is_some());
        registry.destroy(&name);
        assert!(registry.get(&name).is_none());
    }

    #[test]
    fn retrieve_or_register_only_builds_once() {
        let registry = Registry::default();
        let name = format!("registry-ror-{}", std::process::id());
        let mut build_count = 0;
        let first = registry
            .retrieve_or_register(&name, || {
                build_count += 1;
                config(&name)
            })
            .unwrap();
        let second = registry
            .retrieve_or_register(&name, || {
                build_count += 1;
                config(&name)
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(build_count, 1);
        registry.reset_all();
    }

    #[test]
    fn compact_evicts_idle_entries_past_their_minimum_lifetime_once_over_budget() {
        let registry = Registry::new(RegistryLimits {
            max_size: 1,
            min_time_in_lru: Duration::from_nanos(1),
        });
        let first = format!("registry-compact-a-{}", std::process::id());
        let second = format!("registry-compact-b-{}", std::process::id());
        registry.register(config(&first)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        registry.register(config(&second)).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&second).is_some());
    }
}
