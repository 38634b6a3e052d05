//! Configuration snapshot and change deltas
//!
//! The extension settings live in `chrome.storage.local` under five keys:
//!
//! | key         | shape                     | default       |
//! |-------------|---------------------------|---------------|
//! | `ua`        | string                    | `""`          |
//! | `blacklist` | array of hostnames        | `[]`          |
//! | `whitelist` | array of hostnames        | `[]`          |
//! | `custom`    | object hostname → UA      | `{}`          |
//! | `mode`      | `blacklist`/`whitelist`/`custom` | `blacklist` |
//!
//! Values are read leniently: a missing or malformed key falls back to its
//! default and logs a warning. A broken options page must never take the
//! request pipeline down with it.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::{Result, SwitcherError};
use crate::policy::{Mode, Policy};

/// A storage key the switcher reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Ua,
    Blacklist,
    Whitelist,
    Custom,
    Mode,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::Ua,
        ConfigKey::Blacklist,
        ConfigKey::Whitelist,
        ConfigKey::Custom,
        ConfigKey::Mode,
    ];

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "ua" => Some(ConfigKey::Ua),
            "blacklist" => Some(ConfigKey::Blacklist),
            "whitelist" => Some(ConfigKey::Whitelist),
            "custom" => Some(ConfigKey::Custom),
            "mode" => Some(ConfigKey::Mode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Ua => "ua",
            ConfigKey::Blacklist => "blacklist",
            ConfigKey::Whitelist => "whitelist",
            ConfigKey::Custom => "custom",
            ConfigKey::Mode => "mode",
        }
    }

    /// Whether a change to this key invalidates the identity profile
    pub fn affects_identity(&self) -> bool {
        matches!(self, ConfigKey::Ua | ConfigKey::Mode)
    }
}

/// In-memory copy of the extension settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Global identity string. Empty disables spoofing outside custom mode.
    pub ua: String,
    pub policy: Policy,
}

impl Config {
    /// Defaults object for `chrome.storage.local.get`
    pub fn defaults_object() -> Value {
        json!({
            "ua": "",
            "blacklist": [],
            "whitelist": [],
            "custom": {},
            "mode": "blacklist",
        })
    }

    /// Build a config from a full storage snapshot.
    pub fn from_snapshot(snapshot: &Value) -> Self {
        let mut config = Config::default();
        for key in ConfigKey::ALL {
            if let Err(e) = config.apply(key, snapshot.get(key.as_str())) {
                log::warn!("⚠️ {}", e);
            }
        }
        log::info!(
            "Loaded configuration: mode={}, {} blacklisted, {} whitelisted, {} custom",
            config.policy.mode.as_str(),
            config.policy.blacklist.len(),
            config.policy.whitelist.len(),
            config.policy.custom.len()
        );
        config
    }

    /// Set one key. `None` (key absent or removed) restores the default.
    ///
    /// On a malformed value the default is stored as well, and the error is
    /// returned for the caller to log.
    pub fn apply(&mut self, key: ConfigKey, value: Option<&Value>) -> Result<()> {
        let value = match value {
            None | Some(Value::Null) => {
                self.reset(key);
                return Ok(());
            }
            Some(v) => v,
        };

        let parsed = match key {
            ConfigKey::Ua => parse_string(key, value).map(|s| self.ua = s),
            ConfigKey::Blacklist => {
                parse_host_list(key, value).map(|l| self.policy.blacklist = l.into_iter().collect())
            }
            ConfigKey::Whitelist => {
                parse_host_list(key, value).map(|l| self.policy.whitelist = l.into_iter().collect())
            }
            ConfigKey::Custom => parse_custom_map(key, value).map(|m| self.policy.custom = m),
            ConfigKey::Mode => parse_mode(value).map(|m| self.policy.mode = m),
        };

        if parsed.is_err() {
            self.reset(key);
        }
        parsed
    }

    fn reset(&mut self, key: ConfigKey) {
        let defaults = Config::default();
        match key {
            ConfigKey::Ua => self.ua = defaults.ua,
            ConfigKey::Blacklist => self.policy.blacklist = defaults.policy.blacklist,
            ConfigKey::Whitelist => self.policy.whitelist = defaults.policy.whitelist,
            ConfigKey::Custom => self.policy.custom = defaults.policy.custom,
            ConfigKey::Mode => self.policy.mode = defaults.policy.mode,
        }
    }
}

/// One `storage.onChanged` entry
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: ConfigKey,
    /// `None` when the key was removed
    pub new_value: Option<Value>,
}

/// Parse a `storage.onChanged` payload (`{key: {oldValue, newValue}}`).
/// Keys the switcher does not own are skipped.
pub fn parse_changes(changes: &Value) -> Vec<StorageChange> {
    let Some(entries) = changes.as_object() else {
        log::warn!("⚠️ Ignoring storage change payload that is not an object");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|(name, change)| {
            let key = ConfigKey::parse(name)?;
            Some(StorageChange {
                key,
                new_value: change.get("newValue").cloned(),
            })
        })
        .collect()
}

fn invalid(key: ConfigKey, reason: &str) -> SwitcherError {
    SwitcherError::InvalidConfig {
        key: key.as_str().to_string(),
        reason: reason.to_string(),
    }
}

fn parse_string(key: ConfigKey, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(key, "expected a string"))
}

fn parse_host_list(key: ConfigKey, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(key, "expected an array of hostnames"))?;

    let hosts: Vec<String> = items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect();
    if hosts.len() != items.len() {
        log::warn!(
            "⚠️ Dropped {} non-string entries from `{}`",
            items.len() - hosts.len(),
            key.as_str()
        );
    }
    Ok(hosts)
}

fn parse_custom_map(key: ConfigKey, value: &Value) -> Result<HashMap<String, String>> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid(key, "expected an object of hostname to User-Agent"))?;

    let total = map.len();
    let kept: HashMap<String, String> = map
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|ua| (k.clone(), ua.to_string())))
        .collect();
    if kept.len() != total {
        log::warn!(
            "⚠️ Dropped {} non-string values from `{}`",
            total - kept.len(),
            key.as_str()
        );
    }
    Ok(kept)
}

fn parse_mode(value: &Value) -> Result<Mode> {
    let name = value
        .as_str()
        .ok_or_else(|| invalid(ConfigKey::Mode, "expected a string"))?;
    Mode::parse(name).ok_or_else(|| SwitcherError::UnknownMode(name.to_string()))
}
