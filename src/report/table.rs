//! Plain text tables for the terminal.
//!
//! - apps: one line per tracked app, sorted as the store returns them
//! - history: one app's versions, newest first
//! - stats: apps per target SDK with a bar scaled to the largest bucket

use super::{format_date, AppRow, SdkCount};
use crate::sdk;
use crate::store::VersionRecord;

pub fn render_apps(rows: &[AppRow]) -> String {
    if rows.is_empty() {
        return String::from("No apps tracked yet. Run 'sdkwatch sync' first.\n");
    }

    let mut output = format!(
        "{:<24} {:<40} {:>6} {:<16} {:<16}\n",
        "App", "Package", "Target", "Version", "Updated"
    );
    output.push_str(&"-".repeat(106));
    output.push('\n');

    for row in rows {
        let target = row
            .target_sdk
            .map(|sdk| sdk.to_string())
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "{:<24} {:<40} {:>6} {:<16} {:<16}\n",
            truncate(&row.title, 24),
            truncate(&row.package_name, 40),
            target,
            truncate(row.version_name.as_deref().unwrap_or("-"), 16),
            row.last_update_time.map(format_date).unwrap_or_else(|| "-".to_string())
        ));
    }

    output.push_str(&format!("\n{} apps\n", rows.len()));
    output
}

pub fn render_history(package_name: &str, versions: &[VersionRecord]) -> String {
    if versions.is_empty() {
        return format!("No history for {package_name}.\n");
    }

    let mut output = format!("{package_name}\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for version in versions {
        output.push_str(&format!(
            "  {:<16} {:<22} {:<16} ({})\n",
            format_date(version.last_update_time),
            sdk::describe(version.target_sdk),
            truncate(&version.version_name, 16),
            version.version
        ));
    }

    output
}

pub fn render_stats(counts: &[SdkCount]) -> String {
    if counts.is_empty() {
        return String::from("No apps tracked yet.\n");
    }

    let widest = counts.iter().map(|c| c.apps).max().unwrap_or(1).max(1);
    let total: usize = counts.iter().map(|c| c.apps).sum();

    let mut output = String::new();
    for count in counts {
        let bar_len = (count.apps * 30).div_ceil(widest);
        output.push_str(&format!(
            "  {:<22} {:>5}  {}\n",
            sdk::describe(count.target_sdk),
            count.apps,
            "#".repeat(bar_len)
        ));
    }

    output.push_str(&format!("\n{:>30}\n", format!("TOTAL: {total}")));
    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("com.example.extremely.long", 10), "com.exa...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn stats_bars_scale_to_largest() {
        let counts = vec![
            SdkCount { target_sdk: 34, android_version: Some("Android 14"), apps: 10 },
            SdkCount { target_sdk: 28, android_version: Some("Android 9"), apps: 1 },
        ];
        let output = render_stats(&counts);
        assert!(output.contains(&"#".repeat(30)));
        assert!(output.contains("TOTAL: 11"));
    }

    #[test]
    fn empty_history_message() {
        assert_eq!(render_history("a.b", &[]), "No history for a.b.\n");
    }
}
