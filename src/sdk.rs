/// Marketing version for an API level, e.g. 33 -> "Android 13".
pub fn android_version_name(api: i32) -> Option<&'static str> {
    let name = match api {
        1 => "Android 1.0",
        2 => "Android 1.1",
        3 => "Android 1.5",
        4 => "Android 1.6",
        5..=7 => "Android 2.0",
        8 => "Android 2.2",
        9 | 10 => "Android 2.3",
        11..=13 => "Android 3",
        14 | 15 => "Android 4.0",
        16 => "Android 4.1",
        17 => "Android 4.2",
        18 => "Android 4.3",
        19 | 20 => "Android 4.4",
        21 => "Android 5.0",
        22 => "Android 5.1",
        23 => "Android 6",
        24 => "Android 7.0",
        25 => "Android 7.1",
        26 => "Android 8.0",
        27 => "Android 8.1",
        28 => "Android 9",
        29 => "Android 10",
        30 => "Android 11",
        31 => "Android 12",
        32 => "Android 12L",
        33 => "Android 13",
        34 => "Android 14",
        35 => "Android 15",
        36 => "Android 16",
        _ => return None,
    };
    Some(name)
}

/// "API 33 (Android 13)", or just "API 99" for levels not in the table.
pub fn describe(api: i32) -> String {
    match android_version_name(api) {
        Some(name) => format!("API {api} ({name})"),
        None => format!("API {api}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_levels() {
        assert_eq!(android_version_name(33), Some("Android 13"));
        assert_eq!(android_version_name(0), None);
        assert_eq!(describe(30), "API 30 (Android 11)");
        assert_eq!(describe(999), "API 999");
    }
}
