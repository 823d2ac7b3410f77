pub mod settings;
pub mod tab;

pub use settings::{Settings, SettingsKey};
pub use tab::{Tab, TabId};
