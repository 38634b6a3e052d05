//! Identity profile derived from a raw User-Agent string.
//!
//! The header path only needs the raw string. The page path also needs
//! `navigator.appVersion`, `platform` and `vendor`, which are derived here.

use serde::{Deserialize, Serialize};

/// Shown instead of a UA string while custom mode is active.
pub const CUSTOM_MODE_LABEL: &str = "Mapped from user's JSON object";

/// What the UA parser extracted from a string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUa {
    pub os_name: Option<String>,
    pub device_vendor: Option<String>,
}

/// User-agent string parser.
///
/// Implementations must not fail: anything they cannot recognize is left as
/// `None`.
pub trait UaParser {
    fn parse(&self, user_agent: &str) -> ParsedUa;
}

/// The four `navigator` identity values, plus the string they came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    pub raw: String,
    pub user_agent: String,
    pub app_version: String,
    pub platform: String,
    pub vendor: String,
}

impl IdentityProfile {
    /// Derive a profile from `raw`. An empty `raw` yields the empty profile
    /// without consulting the parser.
    pub fn derive(raw: &str, parser: &dyn UaParser) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let parsed = parser.parse(raw);
        Self {
            raw: raw.to_string(),
            user_agent: raw.to_string(),
            app_version: app_version(raw).to_string(),
            platform: parsed.os_name.unwrap_or_default(),
            vendor: parsed.device_vendor.unwrap_or_default(),
        }
    }

    /// Empty profile means spoofing is off
    pub fn is_enabled(&self) -> bool {
        !self.raw.is_empty()
    }
}

/// `navigator.appVersion` is the UA without its product token.
fn app_version(raw: &str) -> &str {
    let s = raw.strip_prefix("Mozilla/").unwrap_or(raw);
    s.strip_prefix("Opera/").unwrap_or(s)
}
