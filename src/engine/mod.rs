//! The cleanup rule engine.
//!
//! [`run_cleanup`] is a pure decision over one snapshot: it never talks to the
//! browser. It returns the tabs to close, the side effects to request, and the
//! warning latch value to carry into the next run.

use crate::constants::{MILLIS_PER_MINUTE, WARNING_MARGIN};
use crate::duplicates::find_duplicates;
use crate::matcher::{host_of, matches_any};
use crate::models::{Settings, SettingsKey, Tab, TabId};
use crate::tracker::ActivityTracker;
use log::{debug, info};
use std::collections::HashSet;

/// Hysteresis latch for the "approaching tab limit" warning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarningState {
    pub warning_active: bool,
}

impl WarningState {
    /// Clear the latch when the limit or the master switch changed.
    pub fn reset_on(&mut self, changed: &[SettingsKey]) {
        if changed.iter().any(|key| matches!(key, SettingsKey::MaxTabs | SettingsKey::Enabled)) {
            self.warning_active = false;
        }
    }
}

/// Tab ids slated for closure, deduplicated, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseSet {
    ids: Vec<TabId>,
    seen: HashSet<TabId>,
}

impl CloseSet {
    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: TabId) -> bool {
        if self.seen.insert(id) {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[TabId] {
        &self.ids
    }
}

/// A side effect the engine asks its host to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetWarningIndicator(bool),
    Notify { title: String, message: String },
    CloseTabs(Vec<TabId>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupPlan {
    pub close_set: CloseSet,
    /// In the order they should be requested.
    pub actions: Vec<Action>,
    pub warning: WarningState,
}

impl CleanupPlan {
    fn unchanged(warning: WarningState) -> Self {
        Self { warning, ..Self::default() }
    }
}

fn is_whitelisted(tab: &Tab, settings: &Settings) -> bool {
    matches_any(&host_of(tab.url.as_deref()), &settings.whitelist)
}

/// Compute which tabs to close for one snapshot.
pub fn run_cleanup(
    tabs: &[Tab],
    settings: &Settings,
    activity: &ActivityTracker,
    warning: WarningState,
    now: f64,
) -> CleanupPlan {
    if !settings.enabled {
        debug!("Cleanup disabled, skipping run");
        return CleanupPlan::unchanged(warning);
    }

    let mut plan = CleanupPlan::unchanged(warning);
    check_warning(tabs.len(), settings, &mut plan);

    apply_tab_rules(tabs, settings, activity, now, &mut plan.close_set);
    apply_duplicates(tabs, settings, &mut plan.close_set);
    apply_max_tabs(tabs, settings, &mut plan.close_set);

    if !plan.close_set.is_empty() {
        let count = plan.close_set.len();
        info!("Closing {count} tabs: {:?}", plan.close_set.as_slice());
        plan.actions.push(Action::CloseTabs(plan.close_set.as_slice().to_vec()));
        if settings.notifications_enabled {
            plan.actions.push(Action::Notify {
                title: "Tabs closed".to_string(),
                message: format!("{count} tabs closed"),
            });
        }
    }

    plan
}

fn check_warning(tab_count: usize, settings: &Settings, plan: &mut CleanupPlan) {
    let threshold = settings.max_tabs - WARNING_MARGIN;
    let count = tab_count_f64(tab_count);

    if threshold > 0.0 && count >= threshold && !plan.warning.warning_active {
        info!("Tab count {count} reached warning threshold {threshold}");
        plan.warning.warning_active = true;
        plan.actions.push(Action::SetWarningIndicator(true));
        if settings.notifications_enabled {
            plan.actions.push(Action::Notify {
                title: "Approaching tab limit".to_string(),
                message: format!(
                    "You have {count} tabs open. The limit is {}.",
                    settings.max_tabs
                ),
            });
        }
    } else if count < threshold && plan.warning.warning_active {
        info!("Tab count {count} dropped below warning threshold {threshold}");
        plan.warning.warning_active = false;
        plan.actions.push(Action::SetWarningIndicator(false));
    }
}

fn tab_count_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

fn apply_tab_rules(
    tabs: &[Tab],
    settings: &Settings,
    activity: &ActivityTracker,
    now: f64,
    close_set: &mut CloseSet,
) {
    let idle_timeout_ms = settings.idle_timeout_minutes * MILLIS_PER_MINUTE;

    for tab in tabs.iter().filter(|tab| !tab.active) {
        let Some(id) = tab.id else { continue };
        let domain = host_of(tab.url.as_deref());

        if matches_any(&domain, &settings.whitelist) {
            debug!("Tab {id} ({domain}) is whitelisted");
            continue;
        }

        if matches_any(&domain, &settings.blacklist) {
            debug!("Tab {id} ({domain}) is blacklisted");
            close_set.insert(id);
            continue;
        }

        let last = activity.last_activity(tab);
        if last != 0.0 && now - last > idle_timeout_ms {
            debug!("Tab {id} idle for {}ms", now - last);
            close_set.insert(id);
        }
    }
}

fn apply_duplicates(tabs: &[Tab], settings: &Settings, close_set: &mut CloseSet) {
    let duplicates = find_duplicates(tabs);
    for tab in tabs {
        let Some(id) = tab.id else { continue };
        if duplicates.contains(&id) && !tab.active && !is_whitelisted(tab, settings) {
            debug!("Tab {id} duplicates another tab");
            close_set.insert(id);
        }
    }
}

fn apply_max_tabs(tabs: &[Tab], settings: &Settings, close_set: &mut CloseSet) {
    let max_tabs = settings.max_tabs;
    let mut remaining = tabs.len().saturating_sub(close_set.len());
    if max_tabs <= 0.0 || tab_count_f64(remaining) <= max_tabs {
        return;
    }

    let mut oldest_first: Vec<&Tab> = tabs.iter().collect();
    oldest_first.sort_by(|a, b| a.last_accessed_or_zero().total_cmp(&b.last_accessed_or_zero()));

    for tab in oldest_first {
        if tab_count_f64(remaining) <= max_tabs {
            break;
        }
        let Some(id) = tab.id else { continue };
        if tab.active || close_set.contains(id) || is_whitelisted(tab, settings) {
            continue;
        }
        debug!("Tab {id} evicted to honour the {max_tabs} tab limit");
        close_set.insert(id);
        remaining -= 1;
    }
}
