//! Runs the rule engine against live collaborators.
//!
//! [`CleanupService`] owns the state that outlives a single run (activity
//! records and the warning latch), fetches the inputs, and carries out the
//! engine's action requests. Collaborator failures are logged here and never
//! propagate to the trigger that started the run.

use crate::engine::{run_cleanup, Action, WarningState};
use crate::error::AppError;
use crate::models::{Settings, SettingsKey, Tab, TabId};
use crate::tracker::ActivityTracker;
use log::{debug, error, info, warn};
use std::time::{SystemTime, UNIX_EPOCH};

pub trait TabSource {
    fn fetch_all_tabs(&self) -> Result<Vec<Tab>, AppError>;
}

pub trait SettingsSource {
    fn fetch_settings(&self) -> Result<Settings, AppError>;
}

pub trait BrowserActions {
    fn close_tabs(&self, ids: &[TabId]) -> Result<(), AppError>;
    fn notify(&self, title: &str, message: &str) -> Result<(), AppError>;
    fn set_warning_indicator(&self, enabled: bool) -> Result<(), AppError>;
}

/// A snapshot that was already delivered to us is its own tab source.
impl TabSource for [Tab] {
    fn fetch_all_tabs(&self) -> Result<Vec<Tab>, AppError> {
        Ok(self.to_vec())
    }
}

impl TabSource for Vec<Tab> {
    fn fetch_all_tabs(&self) -> Result<Vec<Tab>, AppError> {
        Ok(self.clone())
    }
}

impl SettingsSource for Settings {
    fn fetch_settings(&self) -> Result<Settings, AppError> {
        Ok(self.clone())
    }
}

/// How a cleanup run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Disabled,
    Aborted { reason: String },
    Completed { closed: Vec<TabId>, close_failed: bool },
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[derive(Debug, Default)]
pub struct CleanupService {
    activity: ActivityTracker,
    warning: WarningState,
}

impl CleanupService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub fn warning(&self) -> WarningState {
        self.warning
    }

    /// Seed activity records from the tabs open at process start.
    pub fn initialize<T: TabSource + ?Sized>(&mut self, tabs: &T, now: f64) {
        match tabs.fetch_all_tabs() {
            Ok(tabs) => {
                self.activity.bulk_initialize(&tabs, now);
                info!("Activity tracker initialized with {} tabs", self.activity.len());
            }
            Err(e) => warn!("Could not enumerate tabs for activity tracking: {e}"),
        }
    }

    pub fn run<T, S, B>(&mut self, tabs: &T, settings: &S, browser: &B, now: f64) -> RunReport
    where
        T: TabSource + ?Sized,
        S: SettingsSource + ?Sized,
        B: BrowserActions + ?Sized,
    {
        let settings = match settings.fetch_settings() {
            Ok(settings) => settings,
            Err(e) => {
                error!("Cleanup aborted, settings unavailable: {e}");
                return RunReport::Aborted { reason: e.to_string() };
            }
        };
        if !settings.enabled {
            return RunReport::Disabled;
        }

        let tabs = match tabs.fetch_all_tabs() {
            Ok(tabs) => tabs,
            Err(e) => {
                error!("Cleanup aborted, tab snapshot unavailable: {e}");
                return RunReport::Aborted { reason: e.to_string() };
            }
        };

        let plan = run_cleanup(&tabs, &settings, &self.activity, self.warning, now);
        self.warning = plan.warning;

        let mut close_failed = false;
        for action in plan.actions {
            match action {
                Action::CloseTabs(ids) => {
                    if let Err(e) = browser.close_tabs(&ids) {
                        error!("Failed to close {} tabs: {e}", ids.len());
                        close_failed = true;
                    }
                }
                Action::Notify { title, message } => {
                    // Only the "tabs closed" notification follows a close request.
                    if close_failed {
                        debug!("Skipping '{title}' notification after failed close");
                        continue;
                    }
                    if let Err(e) = browser.notify(&title, &message) {
                        warn!("Notification '{title}' failed: {e}");
                    }
                }
                Action::SetWarningIndicator(enabled) => {
                    if let Err(e) = browser.set_warning_indicator(enabled) {
                        warn!("Failed to set warning indicator to {enabled}: {e}");
                    }
                }
            }
        }

        RunReport::Completed {
            closed: plan.close_set.as_slice().to_vec(),
            close_failed,
        }
    }

    pub fn on_tab_activated(&mut self, tab_id: TabId, now: f64) {
        self.activity.record_activity(tab_id, now);
    }

    /// Only navigations count as activity; title or favicon updates do not.
    pub fn on_tab_updated(&mut self, tab_id: TabId, url_changed: bool, now: f64) {
        if url_changed {
            self.activity.record_activity(tab_id, now);
        }
    }

    /// Records the new tab. The caller follows up with a cleanup run.
    pub fn on_tab_created(&mut self, tab: &Tab, now: f64) {
        if let Some(id) = tab.id {
            self.activity.record_activity(id, now);
        }
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.activity.forget(tab_id);
    }

    pub fn on_settings_changed(&mut self, changed: &[SettingsKey]) {
        let before = self.warning.warning_active;
        self.warning.reset_on(changed);
        if before && !self.warning.warning_active {
            debug!("Warning latch reset after settings change: {changed:?}");
        }
    }

    pub fn reset_activity(&mut self) {
        self.activity.reset_all();
    }
}
