use crate::db::{with_connection, Database};
use crate::error::AppError;
use crate::models::{Settings, SettingsKey};
use crate::service::SettingsSource;
use crate::validation::validate_settings;
use std::sync::{Arc, Mutex};

/// SQLite-backed settings, shared between the host loop and its callers.
pub struct SettingsStore {
    db: Arc<Mutex<Database>>,
}

impl SettingsStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub fn load(&self) -> Result<Settings, AppError> {
        with_connection(&self.db, "load settings", Settings::load)
    }

    /// Validate and persist `settings`. Returns what was stored and which keys changed.
    pub fn update(&self, settings: &Settings) -> Result<(Settings, Vec<SettingsKey>), AppError> {
        let settings = validate_settings(settings)?;
        with_connection(&self.db, "save settings", |conn| {
            let previous = Settings::load(conn)?;
            settings.save(conn)?;
            let changed = previous.changed_keys(&settings);
            Ok((settings, changed))
        })
    }
}

impl SettingsSource for SettingsStore {
    fn fetch_settings(&self) -> Result<Settings, AppError> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_update_reports_changed_keys() {
        let (db, _dir) = setup_test_db();
        let store = SettingsStore::new(Arc::new(Mutex::new(db)));

        let requested = Settings { max_tabs: 8.0, enabled: false, ..Settings::default() };
        let (stored, changed) = store.update(&requested).unwrap();

        assert_eq!(stored, requested);
        assert_eq!(changed, vec![SettingsKey::Enabled, SettingsKey::MaxTabs]);
        assert_eq!(store.fetch_settings().unwrap(), requested);
    }

    #[test]
    fn test_update_rejects_invalid_settings() {
        let (db, _dir) = setup_test_db();
        let store = SettingsStore::new(Arc::new(Mutex::new(db)));

        let requested = Settings { whitelist: vec!["http://x.com".into()], ..Settings::default() };
        assert!(store.update(&requested).is_err());
        assert_eq!(store.load().unwrap(), Settings::default());
    }
}
