//! Target SDK change decision.
//!
//! Compares the last recorded target SDK of a package against the one the
//! device reports now:
//! - no record yet: first sighting, record it but stay quiet
//! - same value: nothing to do, whatever else changed in the update
//! - different value: record it and report raised or lowered

use serde::Serialize;

use crate::sdk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    FirstSeen,
    Unchanged,
    Changed { old: i32, new: i32 },
}

pub fn decide(previous: Option<i32>, current: i32) -> Decision {
    match previous {
        None => Decision::FirstSeen,
        Some(old) if old == current => Decision::Unchanged,
        Some(old) => Decision::Changed { old, new: current },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Raised,
    Lowered,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Raised => "raised",
            Direction::Lowered => "lowered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkChange {
    pub app_label: String,
    pub package_name: String,
    pub old_sdk: i32,
    pub new_sdk: i32,
}

impl SdkChange {
    pub fn direction(&self) -> Direction {
        if self.new_sdk > self.old_sdk {
            Direction::Raised
        } else {
            Direction::Lowered
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} ({}): target SDK {} {} -> {}",
            self.app_label,
            self.package_name,
            self.direction().as_str(),
            sdk::describe(self.old_sdk),
            sdk::describe(self.new_sdk),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_is_first_seen() {
        assert_eq!(decide(None, 33), Decision::FirstSeen);
    }

    #[test]
    fn equal_is_unchanged() {
        assert_eq!(decide(Some(33), 33), Decision::Unchanged);
    }

    #[test]
    fn difference_is_changed() {
        assert_eq!(decide(Some(30), 33), Decision::Changed { old: 30, new: 33 });
        assert_eq!(decide(Some(33), 29), Decision::Changed { old: 33, new: 29 });
    }

    #[test]
    fn direction_and_description() {
        let change = SdkChange {
            app_label: "Chrome".to_string(),
            package_name: "com.android.chrome".to_string(),
            old_sdk: 30,
            new_sdk: 33,
        };
        assert_eq!(change.direction(), Direction::Raised);
        assert_eq!(
            change.describe(),
            "Chrome (com.android.chrome): target SDK raised API 30 (Android 11) -> API 33 (Android 13)"
        );

        let lowered = SdkChange { old_sdk: 34, new_sdk: 28, ..change };
        assert_eq!(lowered.direction(), Direction::Lowered);
    }
}
