//! Per-Tab Decision Cache
//!
//! Remembers the matcher outcome of each tab's top-level navigation so that
//! every sub-resource request of that page gets the same answer, even when the
//! sub-resource lives on another host.
//!
//! Entries are written on main-frame requests and removed when the tab closes.
//! There is no other expiry; the cache holds at most one entry per open tab.

use std::collections::HashMap;

use crate::policy::Outcome;

/// Browser tab identifier. `-1` marks requests that do not belong to a tab.
pub type TabId = i32;

/// Outcome of the last top-level navigation, by tab
#[derive(Debug, Default)]
pub struct TabDecisionCache {
    decisions: HashMap<TabId, Outcome>,
}

impl TabDecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a main-frame request, replacing any earlier one
    pub fn set(&mut self, tab_id: TabId, outcome: Outcome) {
        log::debug!("  📌 Tab {} decision: {:?}", tab_id, outcome);
        self.decisions.insert(tab_id, outcome);
    }

    pub fn get(&self, tab_id: TabId) -> Option<&Outcome> {
        self.decisions.get(&tab_id)
    }

    /// Forget a closed tab
    pub fn clear(&mut self, tab_id: TabId) {
        if self.decisions.remove(&tab_id).is_some() {
            log::debug!("  🗑️ Dropped decision for closed tab {}", tab_id);
        }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut cache = TabDecisionCache::new();
        assert!(cache.get(1).is_none());

        cache.set(1, Outcome::Disabled);
        assert_eq!(cache.get(1), Some(&Outcome::Disabled));
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let mut cache = TabDecisionCache::new();
        cache.set(7, Outcome::Disabled);
        cache.set(7, Outcome::CustomIdentity("A/1".into()));

        assert_eq!(cache.get(7), Some(&Outcome::CustomIdentity("A/1".into())));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut cache = TabDecisionCache::new();
        cache.set(3, Outcome::Allowed);
        cache.set(4, Outcome::Allowed);

        cache.clear(3);
        assert!(cache.get(3).is_none());
        assert_eq!(cache.get(4), Some(&Outcome::Allowed));

        // Clearing an unknown tab is a no-op
        cache.clear(99);
        assert_eq!(cache.len(), 1);

        cache.clear(4);
        assert!(cache.is_empty());
    }
}
