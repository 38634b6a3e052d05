//! Application state
//!
//! Everything the event handlers need, owned in one place:
//!
//! ```text
//! storage snapshot ──► Config ──► IdentityProfile
//!                        │              │
//!  onBeforeSendHeaders ──┼──► resolver ─┴─► User-Agent header
//!  onCommitted ──────────┴──► cache ──────► navigator script
//!  tabs.onRemoved ──────────► cache.clear
//! ```
//!
//! Lifecycle: built from the startup snapshot, mutated only by
//! [`AppState::apply_changes`] and the tab cache, read by the request and
//! navigation handlers. The browser layer owns the only instance and hands it
//! to one callback at a time.

use crate::config::{Config, StorageChange};
use crate::display::DisplayState;
use crate::events::{BeforeSendHeadersDetails, BlockingResponse, CommittedDetails};
use crate::interceptor::injector::profile_for_page;
use crate::interceptor::{is_injectable_url, rewrite_user_agent, Injection};
use crate::policy::{Mode, Outcome};
use crate::profile::{IdentityProfile, UaParser, CUSTOM_MODE_LABEL};
use crate::resolver::{resolve, EffectiveIdentity};
use crate::tab_cache::{TabDecisionCache, TabId};

/// Listener registration change caused by a configuration update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Identity became non-empty: register both listeners
    Enable,
    /// Identity became empty: unregister both listeners
    Disable,
    Unchanged,
}

/// Result of merging a batch of storage changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub toggle: Toggle,
    /// The profile was recomputed; the display needs a refresh
    pub identity_changed: bool,
}

pub struct AppState {
    config: Config,
    profile: IdentityProfile,
    cache: TabDecisionCache,
    parser: Box<dyn UaParser>,
}

impl AppState {
    pub fn new(config: Config, parser: Box<dyn UaParser>) -> Self {
        let mut state = Self {
            config,
            profile: IdentityProfile::default(),
            cache: TabDecisionCache::new(),
            parser,
        };
        state.refresh_profile();
        state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn profile(&self) -> &IdentityProfile {
        &self.profile
    }

    pub fn decision(&self, tab_id: TabId) -> Option<&Outcome> {
        self.cache.get(tab_id)
    }

    /// Whether the interceptor and injector should be registered
    pub fn is_enabled(&self) -> bool {
        self.profile.is_enabled()
    }

    /// The raw identity the profile is built from: the configured UA, or the
    /// custom-mode label.
    pub fn effective_identity(&self) -> &str {
        match self.config.policy.mode {
            Mode::Custom => CUSTOM_MODE_LABEL,
            Mode::Blacklist | Mode::Whitelist => &self.config.ua,
        }
    }

    /// The toggle that brings a fresh browser session in line with this state
    pub fn initial_toggle(&self) -> Toggle {
        if self.is_enabled() {
            Toggle::Enable
        } else {
            Toggle::Disable
        }
    }

    /// Merge storage deltas and recompute the identity if `ua` or `mode` moved.
    pub fn apply_changes(&mut self, changes: &[StorageChange]) -> ConfigUpdate {
        let was_enabled = self.is_enabled();
        let mut identity_changed = false;

        for change in changes {
            if let Err(e) = self.config.apply(change.key, change.new_value.as_ref()) {
                log::warn!("⚠️ {}", e);
            }
            identity_changed |= change.key.affects_identity();
        }

        if identity_changed {
            self.refresh_profile();
        }

        let toggle = match (was_enabled, self.is_enabled()) {
            (false, true) => Toggle::Enable,
            (true, false) => Toggle::Disable,
            _ => Toggle::Unchanged,
        };
        if toggle != Toggle::Unchanged {
            log::info!("🔀 User-Agent override {:?}", toggle);
        }

        ConfigUpdate {
            toggle,
            identity_changed,
        }
    }

    /// Blocking header rewrite. Returns the modified headers, or `None` to let
    /// the request go out untouched.
    pub fn on_before_send_headers(
        &mut self,
        mut details: BeforeSendHeadersDetails,
    ) -> Option<BlockingResponse> {
        if !self.is_enabled() {
            return None;
        }

        let identity = resolve(
            &self.config.policy,
            &self.profile,
            &mut self.cache,
            details.context(),
        );
        if identity == EffectiveIdentity::NoOverride {
            return None;
        }

        if rewrite_user_agent(&mut details.request_headers, &identity) {
            Some(BlockingResponse {
                request_headers: details.request_headers,
            })
        } else {
            None
        }
    }

    /// Script to inject for a committed navigation, if any.
    pub fn on_committed(&self, details: &CommittedDetails) -> Option<Injection> {
        if !self.is_enabled() || !details.is_top_level() || !is_injectable_url(&details.url) {
            return None;
        }

        let profile = profile_for_page(
            self.config.policy.mode,
            &self.profile,
            self.cache.get(details.tab_id),
            self.parser.as_ref(),
        )?;
        log::debug!("💉 Injecting navigator identity into tab {}", details.tab_id);
        Some(Injection::new(details.tab_id, &profile))
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.cache.clear(tab_id);
    }

    pub fn display(&self, browser_ua: &str) -> DisplayState {
        DisplayState::new(self.effective_identity(), browser_ua)
    }

    fn refresh_profile(&mut self) {
        let raw = self.effective_identity().to_string();
        self.profile = IdentityProfile::derive(&raw, self.parser.as_ref());
    }
}
