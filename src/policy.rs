//! Host Matching Policy
//!
//! Classifies the host of a URL against the active filtering mode.
//!
//! ## Modes
//!
//! - **Blacklist**: override everywhere except the listed hosts. An empty list
//!   blocks nothing.
//! - **Whitelist**: override only on the listed hosts. An empty list allows
//!   nothing.
//! - **Custom**: each listed host gets its own identity string.
//!
//! Matching is exact and case-sensitive on the extracted host. There is no
//! wildcard or subdomain support: `www.example.com` does not match
//! `example.com`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Which list decides whether a tab gets its identity overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Override everywhere except blacklisted hosts
    #[default]
    Blacklist,

    /// Override only on whitelisted hosts
    Whitelist,

    /// Per-host identity strings
    Custom,
}

impl Mode {
    /// Parse the storage representation (`blacklist`, `whitelist`, `custom`)
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "blacklist" => Some(Mode::Blacklist),
            "whitelist" => Some(Mode::Whitelist),
            "custom" => Some(Mode::Custom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Blacklist => "blacklist",
            Mode::Whitelist => "whitelist",
            Mode::Custom => "custom",
        }
    }
}

/// Matcher result for one top-level navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Leave the real identity alone
    Disabled,

    /// Apply the global identity
    Allowed,

    /// Apply this host-specific identity
    CustomIdentity(String),
}

impl Outcome {
    pub fn is_disabled(&self) -> bool {
        matches!(self, Outcome::Disabled)
    }
}

/// The active filtering policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    pub mode: Mode,
    pub blacklist: HashSet<String>,
    pub whitelist: HashSet<String>,
    pub custom: HashMap<String, String>,
}

impl Policy {
    /// Classify `url` under the active mode.
    pub fn matches(&self, url: &str) -> Outcome {
        match self.mode {
            Mode::Blacklist => {
                if self.blacklist.contains(hostname(url)) {
                    Outcome::Disabled
                } else {
                    Outcome::Allowed
                }
            }
            Mode::Whitelist => {
                // Empty whitelist: nothing is allowed
                if self.whitelist.contains(hostname(url)) {
                    Outcome::Allowed
                } else {
                    Outcome::Disabled
                }
            }
            Mode::Custom => match self.custom.get(hostname(url)) {
                Some(identity) => Outcome::CustomIdentity(identity.clone()),
                None => Outcome::Disabled,
            },
        }
    }
}

/// Extract the authority part of a URL without a URL parser.
///
/// Everything between `//` and the next `/` (or `?`, or the end of input).
/// Input without `//` is returned unchanged. Userinfo and port are kept, so
/// `http://example.com:8080/` yields `example.com:8080`.
pub fn hostname(url: &str) -> &str {
    let Some(scheme_end) = url.find("//") else {
        return url;
    };
    let rest = &url[scheme_end + 2..];

    if let Some(slash) = rest.find('/') {
        &rest[..slash]
    } else if let Some(query) = rest.find('?') {
        &rest[..query]
    } else {
        rest
    }
}
