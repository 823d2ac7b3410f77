use crate::models::{Tab, TabId};
use std::collections::HashMap;

/// Last observed user interaction per tab, independent of the browser's own
/// `lastAccessed` heuristic.
#[derive(Debug, Default, Clone)]
pub struct ActivityTracker {
    records: HashMap<TabId, f64>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_activity(&mut self, tab_id: TabId, now: f64) {
        self.records.insert(tab_id, now);
    }

    /// Tracked timestamp, else the browser's `lastAccessed`, else `0` (no known activity).
    pub fn last_activity(&self, tab: &Tab) -> f64 {
        tab.id
            .and_then(|id| self.records.get(&id).copied())
            .or(tab.last_accessed)
            .unwrap_or(0.0)
    }

    pub fn forget(&mut self, tab_id: TabId) {
        self.records.remove(&tab_id);
    }

    /// Seed records for tabs that predate this process so they are not
    /// immediately considered idle.
    pub fn bulk_initialize(&mut self, tabs: &[Tab], now: f64) {
        for tab in tabs {
            if let Some(id) = tab.id {
                self.records.insert(id, tab.last_accessed.unwrap_or(now));
            }
        }
    }

    pub fn reset_all(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_activity_prefers_tracked_record() {
        let mut tracker = ActivityTracker::new();
        let tab = Tab::new(1, "https://example.com").accessed_at(100.0);

        tracker.record_activity(TabId(1), 500.0);
        assert_eq!(tracker.last_activity(&tab), 500.0);
    }

    #[test]
    fn test_last_activity_falls_back_to_last_accessed() {
        let tracker = ActivityTracker::new();
        let tab = Tab::new(1, "https://example.com").accessed_at(100.0);
        assert_eq!(tracker.last_activity(&tab), 100.0);
    }

    #[test]
    fn test_last_activity_zero_when_unknown() {
        let tracker = ActivityTracker::new();
        assert_eq!(tracker.last_activity(&Tab::new(1, "https://example.com")), 0.0);
        assert_eq!(tracker.last_activity(&Tab::default()), 0.0);
    }

    #[test]
    fn test_record_overwrites() {
        let mut tracker = ActivityTracker::new();
        tracker.record_activity(TabId(1), 100.0);
        tracker.record_activity(TabId(1), 50.0);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.last_activity(&Tab::new(1, "https://a.com")), 50.0);
    }

    #[test]
    fn test_forget_is_idempotent() {
        let mut tracker = ActivityTracker::new();
        tracker.record_activity(TabId(1), 100.0);

        tracker.forget(TabId(1));
        tracker.forget(TabId(1));
        tracker.forget(TabId(99));

        assert!(tracker.is_empty());
    }

    #[test]
    fn test_bulk_initialize_seeds_from_last_accessed_or_now() {
        let mut tracker = ActivityTracker::new();
        let tabs = vec![
            Tab::new(1, "https://a.com").accessed_at(100.0),
            Tab::new(2, "https://b.com"),
            Tab { id: None, ..Tab::default() },
        ];

        tracker.bulk_initialize(&tabs, 999.0);

        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.last_activity(&tabs[0]), 100.0);
        assert_eq!(tracker.last_activity(&tabs[1]), 999.0);
    }

    #[test]
    fn test_reset_all_clears_records() {
        let mut tracker = ActivityTracker::new();
        tracker.record_activity(TabId(1), 100.0);
        tracker.record_activity(TabId(2), 200.0);

        tracker.reset_all();

        assert!(tracker.is_empty());
        let tab = Tab::new(1, "https://a.com").accessed_at(7.0);
        assert_eq!(tracker.last_activity(&tab), 7.0);
    }
}
