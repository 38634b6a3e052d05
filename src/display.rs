//! Toolbar icon and tooltip
//!
//! Recomputed on every identity update and pushed to `browserAction`.

use serde::Serialize;

/// Icon sizes shipped with the extension
pub const ICON_SIZES: [u32; 4] = [16, 32, 48, 64];

/// What the toolbar button should show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub enabled: bool,
    pub title: String,
    /// `(size, path)` pairs for `setIcon({path})`
    #[serde(skip)]
    pub icon_paths: Vec<(u32, String)>,
}

impl DisplayState {
    /// `identity` is the effective raw identity; `browser_ua` is the real
    /// `navigator.userAgent`, shown when spoofing is off.
    pub fn new(identity: &str, browser_ua: &str) -> Self {
        let enabled = !identity.is_empty();
        let folder = if enabled { "active/" } else { "" };

        let icon_paths = ICON_SIZES
            .iter()
            .map(|size| (*size, format!("data/icons/{}{}.png", folder, size)))
            .collect();

        let shown = if enabled { identity } else { browser_ua };
        let title = format!(
            "UserAgent Switcher ({})\n\nUser-Agent String: {}",
            if enabled { "enabled" } else { "disabled" },
            shown
        );

        Self {
            enabled,
            title,
            icon_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_display() {
        let display = DisplayState::new("Spoofed/1.0", "Real/1.0");
        assert!(display.enabled);
        assert_eq!(
            display.title,
            "UserAgent Switcher (enabled)\n\nUser-Agent String: Spoofed/1.0"
        );
        assert_eq!(display.icon_paths.len(), 4);
        assert_eq!(display.icon_paths[0], (16, "data/icons/active/16.png".to_string()));
        assert_eq!(display.icon_paths[3], (64, "data/icons/active/64.png".to_string()));
    }

    #[test]
    fn test_disabled_display_shows_browser_ua() {
        let display = DisplayState::new("", "Real/1.0");
        assert!(!display.enabled);
        assert!(display.title.starts_with("UserAgent Switcher (disabled)"));
        assert!(display.title.ends_with("User-Agent String: Real/1.0"));
        assert_eq!(display.icon_paths[1], (32, "data/icons/32.png".to_string()));
    }
}
