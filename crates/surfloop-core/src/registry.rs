use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use crate::surface::Surface;

/// Maps platform keys (window ids, native userdata) back to their surface.
///
/// Entries are weak, so a registry never keeps a surface alive.
pub struct SurfaceRegistry<K> {
    entries: Mutex<HashMap<K, Weak<Surface>>>,
}

impl<K: Eq + Hash> SurfaceRegistry<K> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the previous live surface under `key`, if any.
    pub fn insert(&self, key: K, surface: &Arc<Surface>) -> Option<Arc<Surface>> {
        self.entries
            .lock()
            .insert(key, Arc::downgrade(surface))
            .and_then(|w| w.upgrade())
    }

    /// `None` for unknown keys and for surfaces already dropped.
    pub fn get(&self, key: &K) -> Option<Arc<Surface>> {
        let mut entries = self.entries.lock();
        let found = entries.get(key)?.upgrade();
        if found.is_none() {
            entries.remove(key);
        }
        found
    }

    pub fn remove(&self, key: &K) -> Option<Arc<Surface>> {
        self.entries.lock().remove(key).and_then(|w| w.upgrade())
    }

    /// Drop dead entries. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, w| w.strong_count() > 0);
        before - entries.len()
    }

    /// Live surfaces, in no particular order.
    pub fn surfaces(&self) -> Vec<Arc<Surface>> {
        self.entries.lock().values().filter_map(Weak::upgrade).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K: Eq + Hash> Default for SurfaceRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn lookup_fails_once_surface_is_gone() {
        let reg = SurfaceRegistry::new();
        let a = Arc::new(Surface::new(HeadlessBackend::inert()));
        let b = Arc::new(Surface::new(HeadlessBackend::inert()));
        assert!(reg.insert(1u32, &a).is_none());
        reg.insert(2, &b);

        assert_eq!(reg.get(&1).map(|s| s.id()), Some(a.id()));
        assert_eq!(reg.surfaces().len(), 2);

        drop(a);
        assert!(reg.get(&1).is_none());
        assert_eq!(reg.len(), 1);
        assert!(reg.get(&3).is_none());
    }

    #[test]
    fn prune_and_replace() {
        let reg = SurfaceRegistry::new();
        let a = Arc::new(Surface::new(HeadlessBackend::inert()));
        let b = Arc::new(Surface::new(HeadlessBackend::inert()));
        reg.insert("main", &a);
        let old = reg.insert("main", &b);
        assert_eq!(old.map(|s| s.id()), Some(a.id()));

        reg.insert("aux", &a);
        drop(a);
        assert_eq!(reg.prune(), 1);
        assert_eq!(reg.len(), 1);

        assert_eq!(reg.remove(&"main").map(|s| s.id()), Some(b.id()));
        assert!(reg.is_empty());
    }
}
