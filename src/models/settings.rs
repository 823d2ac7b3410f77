use crate::error::AppError;
use log::warn;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

/// User settings, immutable for the duration of one cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    /// Any JSON number is accepted; fractional minutes are honoured.
    pub idle_timeout_minutes: f64,
    /// `0` means unlimited.
    pub max_tabs: f64,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_timeout_minutes: 30.0,
            max_tabs: 20.0,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            notifications_enabled: true,
        }
    }
}

/// Names of the individual settings, as stored and as reported in change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingsKey {
    Enabled,
    IdleTimeoutMinutes,
    MaxTabs,
    Whitelist,
    Blacklist,
    NotificationsEnabled,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 6] = [
        SettingsKey::Enabled,
        SettingsKey::IdleTimeoutMinutes,
        SettingsKey::MaxTabs,
        SettingsKey::Whitelist,
        SettingsKey::Blacklist,
        SettingsKey::NotificationsEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsKey::Enabled => "enabled",
            SettingsKey::IdleTimeoutMinutes => "idleTimeoutMinutes",
            SettingsKey::MaxTabs => "maxTabs",
            SettingsKey::Whitelist => "whitelist",
            SettingsKey::Blacklist => "blacklist",
            SettingsKey::NotificationsEnabled => "notificationsEnabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

impl Settings {
    /// Keys whose values differ between `self` and `other`.
    pub fn changed_keys(&self, other: &Settings) -> Vec<SettingsKey> {
        SettingsKey::ALL
            .into_iter()
            .filter(|key| match key {
                SettingsKey::Enabled => self.enabled != other.enabled,
                SettingsKey::IdleTimeoutMinutes => {
                    self.idle_timeout_minutes.to_bits() != other.idle_timeout_minutes.to_bits()
                }
                SettingsKey::MaxTabs => self.max_tabs.to_bits() != other.max_tabs.to_bits(),
                SettingsKey::Whitelist => self.whitelist != other.whitelist,
                SettingsKey::Blacklist => self.blacklist != other.blacklist,
                SettingsKey::NotificationsEnabled => {
                    self.notifications_enabled != other.notifications_enabled
                }
            })
            .collect()
    }

    fn field_json(&self, key: SettingsKey) -> serde_json::Result<String> {
        match key {
            SettingsKey::Enabled => serde_json::to_string(&self.enabled),
            SettingsKey::IdleTimeoutMinutes => serde_json::to_string(&self.idle_timeout_minutes),
            SettingsKey::MaxTabs => serde_json::to_string(&self.max_tabs),
            SettingsKey::Whitelist => serde_json::to_string(&self.whitelist),
            SettingsKey::Blacklist => serde_json::to_string(&self.blacklist),
            SettingsKey::NotificationsEnabled => serde_json::to_string(&self.notifications_enabled),
        }
    }

    /// Overwrite one field from its stored JSON. The field is untouched on error.
    fn set_field(&mut self, key: SettingsKey, raw: &str) -> serde_json::Result<()> {
        match key {
            SettingsKey::Enabled => self.enabled = serde_json::from_str(raw)?,
            SettingsKey::IdleTimeoutMinutes => {
                self.idle_timeout_minutes = serde_json::from_str(raw)?;
            }
            SettingsKey::MaxTabs => self.max_tabs = serde_json::from_str(raw)?,
            SettingsKey::Whitelist => self.whitelist = serde_json::from_str(raw)?,
            SettingsKey::Blacklist => self.blacklist = serde_json::from_str(raw)?,
            SettingsKey::NotificationsEnabled => {
                self.notifications_enabled = serde_json::from_str(raw)?;
            }
        }
        Ok(())
    }

    /// Load settings from the key/value table.
    ///
    /// Keys that are absent, unreadable or of the wrong type fall back to defaults.
    pub fn load(conn: &Connection) -> Result<Self, AppError> {
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut settings = Settings::default();
        for row in rows {
            let (key, raw) = row?;
            let Some(field) = SettingsKey::parse(&key) else {
                warn!("Ignoring unknown settings key '{key}'");
                continue;
            };
            if let Err(e) = settings.set_field(field, &raw) {
                warn!("Using default for settings key '{key}', stored value {raw} is invalid: {e}");
            }
        }

        Ok(settings)
    }

    /// Persist every field, replacing what was stored.
    pub fn save(&self, conn: &Connection) -> Result<(), AppError> {
        let tx = conn.unchecked_transaction()?;
        for key in SettingsKey::ALL {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key.as_str(), self.field_json(key)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_load_returns_seeded_defaults() {
        let (db, _dir) = setup_test_db();
        let settings = Settings::load(db.connection()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let settings = Settings {
            enabled: false,
            idle_timeout_minutes: 90.5,
            max_tabs: 0.0,
            whitelist: vec!["docs.rs".into(), "github.com".into()],
            blacklist: vec!["bad.com".into()],
            notifications_enabled: false,
        };
        settings.save(conn).unwrap();

        assert_eq!(Settings::load(conn).unwrap(), settings);
    }

    #[test]
    fn test_load_fills_missing_keys_with_defaults() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        conn.execute("DELETE FROM settings WHERE key != 'maxTabs'", []).unwrap();
        conn.execute("UPDATE settings SET value = '7' WHERE key = 'maxTabs'", []).unwrap();

        let settings = Settings::load(conn).unwrap();
        assert_eq!(settings.max_tabs, 7.0);
        assert_eq!(settings.idle_timeout_minutes, Settings::default().idle_timeout_minutes);
        assert!(settings.enabled);
    }

    #[test]
    fn test_load_ignores_unknown_keys() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        conn.execute("INSERT INTO settings (key, value) VALUES ('theme', '\"dark\"')", []).unwrap();

        assert_eq!(Settings::load(conn).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_defaults_wrong_typed_values() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        conn.execute("UPDATE settings SET value = '\"10\"' WHERE key = 'maxTabs'", []).unwrap();
        conn.execute("UPDATE settings SET value = '[1, 2]' WHERE key = 'enabled'", []).unwrap();
        conn.execute("UPDATE settings SET value = '{' WHERE key = 'whitelist'", []).unwrap();
        conn.execute("UPDATE settings SET value = '45' WHERE key = 'idleTimeoutMinutes'", [])
            .unwrap();

        let settings = Settings::load(conn).unwrap();
        assert_eq!(settings.max_tabs, Settings::default().max_tabs);
        assert!(settings.enabled);
        assert!(settings.whitelist.is_empty());
        assert_eq!(settings.idle_timeout_minutes, 45.0);
    }

    #[test]
    fn test_fractional_and_integer_numbers_accepted() {
        let settings: Settings =
            serde_json::from_str(r#"{"idleTimeoutMinutes": 0.5, "maxTabs": 12}"#).unwrap();
        assert_eq!(settings.idle_timeout_minutes, 0.5);
        assert_eq!(settings.max_tabs, 12.0);
    }

    #[test]
    fn test_changed_keys_reports_only_differences() {
        let before = Settings::default();
        let after = Settings {
            max_tabs: 5.0,
            blacklist: vec!["bad.com".into()],
            ..Settings::default()
        };

        assert_eq!(
            before.changed_keys(&after),
            vec![SettingsKey::MaxTabs, SettingsKey::Blacklist]
        );
        assert!(before.changed_keys(&before).is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"maxTabs": 3, "whitelist": ["example.com"]}"#).unwrap();
        assert_eq!(settings.max_tabs, 3.0);
        assert_eq!(settings.whitelist, vec!["example.com".to_string()]);
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn test_settings_key_parse() {
        for key in SettingsKey::ALL {
            assert_eq!(SettingsKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SettingsKey::parse("theme"), None);
    }
}
