use serde::{Deserialize, Serialize};
use std::fmt;

/// Browser-assigned tab identifier, stable for the tab's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tab as reported by the browser. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub id: Option<TabId>,
    #[serde(default)]
    pub url: Option<String>,
    /// The focused tab of its window.
    #[serde(default)]
    pub active: bool,
    /// Browser heuristic, milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_accessed: Option<f64>,
}

impl Tab {
    pub fn new(id: i64, url: &str) -> Self {
        Self {
            id: Some(TabId(id)),
            url: Some(url.to_string()),
            active: false,
            last_accessed: None,
        }
    }

    pub fn accessed_at(mut self, last_accessed: f64) -> Self {
        self.last_accessed = Some(last_accessed);
        self
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// `lastAccessed` with missing treated as the oldest possible time.
    pub fn last_accessed_or_zero(&self) -> f64 {
        self.last_accessed.unwrap_or(0.0)
    }
}
