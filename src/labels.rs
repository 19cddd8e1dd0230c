//! Display label and color for newly registered apps.
//!
//! Resolved once, when an app is first seen. Over adb there is no cheap way
//! to read the launcher label or icon, so the default labeler derives both
//! from the package name.

use crate::error::{Error, Result};
use crate::source::InstalledPackage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLabel {
    pub title: String,
    pub background_color: u32,
}

pub trait AppLabeler: Send + Sync {
    fn resolve(&self, package: &InstalledPackage) -> Result<AppLabel>;
}

pub struct PackageNameLabeler;

impl AppLabeler for PackageNameLabeler {
    fn resolve(&self, package: &InstalledPackage) -> Result<AppLabel> {
        let name = package.package_name.trim();
        if name.is_empty() {
            return Err(Error::Label(package.package_name.clone()));
        }

        Ok(AppLabel {
            title: title_from_package(name),
            background_color: color_from_package(name),
        })
    }
}

/// `com.example.my_notes` -> `My Notes`
fn title_from_package(name: &str) -> String {
    let segment = name.rsplit('.').find(|s| !s.is_empty()).unwrap_or(name);

    let words: Vec<String> = segment
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        name.to_string()
    } else {
        words.join(" ")
    }
}

/// Opaque ARGB color, stable for a given package name (FNV-1a over the bytes).
fn color_from_package(name: &str) -> u32 {
    let hash = name.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    });
    0xFF00_0000 | (hash & 0x00FF_FFFF)
}
