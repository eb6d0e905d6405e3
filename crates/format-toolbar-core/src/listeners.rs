//! Keyed registry of listener guards.
//!
//! A guard is any value that unregisters its listener when dropped (for the
//! browser, `gloo_events::EventListener`). Attaching under a key that is
//! already present drops the old guard first, so showing and hiding the
//! popup repeatedly never stacks duplicate handlers.

use std::fmt;

pub struct ListenerRegistry<K, G> {
    entries: Vec<(K, G)>,
}

impl<K, G> Default for ListenerRegistry<K, G> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq + fmt::Debug, G> ListenerRegistry<K, G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `guard` under `key`, releasing any guard already there.
    pub fn attach(&mut self, key: K, guard: G) {
        if self.detach(&key) {
            tracing::trace!(target: "format_toolbar::listeners", ?key, "replaced listener");
        }
        self.entries.push((key, guard));
    }

    /// Release the guard under `key`. Returns whether one was registered.
    pub fn detach(&mut self, key: &K) -> bool {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Release every guard whose key matches `pred`. Returns how many.
    pub fn detach_where(&mut self, pred: impl Fn(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !pred(k));
        before - self.entries.len()
    }

    /// Release everything.
    pub fn detach_all(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        released
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
