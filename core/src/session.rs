//! Session flags
//!
//! Boot-seen flag and the frequent-apps launch counters, persisted as one
//! small blob.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentApp {
    pub app_id: String,
    pub count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub boot_seen: bool,
    pub frequent_apps: Vec<FrequentApp>,
}

impl Session {
    /// Record an app launch, keeping the list sorted by launch count.
    pub fn bump_frequent(&mut self, app_id: &str) {
        match self
            .frequent_apps
            .iter_mut()
            .find(|entry| entry.app_id == app_id)
        {
            Some(entry) => entry.count += 1,
            None => self.frequent_apps.push(FrequentApp {
                app_id: app_id.to_string(),
                count: 1,
            }),
        }
        self.frequent_apps.sort_by(|a, b| b.count.cmp(&a.count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_frequent_counts_and_sorts() {
        let mut session = Session::default();
        session.bump_frequent("files");
        session.bump_frequent("settings");
        session.bump_frequent("settings");

        assert_eq!(session.frequent_apps[0].app_id, "settings");
        assert_eq!(session.frequent_apps[0].count, 2);
        assert_eq!(session.frequent_apps[1].count, 1);
    }
}
