use crate::models::{Tab, TabId};
use std::collections::{HashMap, HashSet};

/// Ids of redundant tabs among groups sharing the exact same URL.
///
/// Each group keeps one tab: an active member if there is one, otherwise the
/// most recently accessed (first seen wins a tie). Tabs without a url or id
/// never take part, and active tabs are never reported.
pub fn find_duplicates(tabs: &[Tab]) -> HashSet<TabId> {
    let mut groups: HashMap<&str, Vec<&Tab>> = HashMap::new();
    for tab in tabs {
        if let (Some(url), Some(_)) = (tab.url.as_deref(), tab.id) {
            groups.entry(url).or_default().push(tab);
        }
    }

    let mut duplicates = HashSet::new();
    for members in groups.values().filter(|members| members.len() > 1) {
        let Some(keeper) = select_keeper(members) else {
            continue;
        };
        duplicates.extend(
            members
                .iter()
                .filter(|tab| !tab.active && tab.id != Some(keeper))
                .filter_map(|tab| tab.id),
        );
    }
    duplicates
}

fn select_keeper(members: &[&Tab]) -> Option<TabId> {
    if let Some(active) = members.iter().find(|tab| tab.active) {
        return active.id;
    }

    let mut keeper: Option<&Tab> = None;
    for &tab in members {
        let newer = keeper.map_or(true, |current| {
            tab.last_accessed_or_zero() > current.last_accessed_or_zero()
        });
        if newer {
            keeper = Some(tab);
        }
    }
    keeper.and_then(|tab| tab.id)
}
