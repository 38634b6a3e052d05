//! Identity Resolver
//!
//! Turns the policy and the tab's cached decision into the identity a request
//! should carry. Main-frame requests refresh the cache first; everything else
//! reads it as-is, so a page and all of its sub-resources agree.

use crate::policy::{Mode, Outcome, Policy};
use crate::profile::IdentityProfile;
use crate::tab_cache::{TabDecisionCache, TabId};

/// `webRequest` resource type, reduced to what the resolver cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Top-level document load
    MainFrame,
    /// Anything else: sub frames, scripts, images, XHR...
    SubResource,
}

impl RequestKind {
    pub fn from_resource_type(resource_type: &str) -> Self {
        if resource_type == "main_frame" {
            RequestKind::MainFrame
        } else {
            RequestKind::SubResource
        }
    }
}

/// A request as the resolver sees it
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub tab_id: TabId,
    pub url: &'a str,
    pub kind: RequestKind,
}

/// Identity to put on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveIdentity {
    NoOverride,
    Override(String),
}

/// Resolve the identity for `request`, recording the tab decision on
/// main-frame loads.
pub fn resolve(
    policy: &Policy,
    profile: &IdentityProfile,
    cache: &mut TabDecisionCache,
    request: RequestContext<'_>,
) -> EffectiveIdentity {
    if request.kind == RequestKind::MainFrame {
        cache.set(request.tab_id, policy.matches(request.url));
    }
    resolve_cached(policy.mode, profile, cache.get(request.tab_id))
}

/// Resolve from an already-recorded decision. Never re-runs the matcher.
pub fn resolve_cached(
    mode: Mode,
    profile: &IdentityProfile,
    decision: Option<&Outcome>,
) -> EffectiveIdentity {
    match mode {
        Mode::Blacklist | Mode::Whitelist => match decision {
            Some(Outcome::Disabled) => EffectiveIdentity::NoOverride,
            _ => EffectiveIdentity::Override(profile.user_agent.clone()),
        },
        Mode::Custom => match decision {
            Some(Outcome::CustomIdentity(identity)) => {
                EffectiveIdentity::Override(identity.clone())
            }
            _ => EffectiveIdentity::NoOverride,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(ua: &str) -> IdentityProfile {
        IdentityProfile {
            raw: ua.into(),
            user_agent: ua.into(),
            ..Default::default()
        }
    }

    fn main_frame(tab_id: TabId, url: &str) -> RequestContext<'_> {
        RequestContext {
            tab_id,
            url,
            kind: RequestKind::MainFrame,
        }
    }

    fn sub_resource(tab_id: TabId, url: &str) -> RequestContext<'_> {
        RequestContext {
            tab_id,
            url,
            kind: RequestKind::SubResource,
        }
    }

    #[test]
    fn test_request_kind() {
        assert_eq!(RequestKind::from_resource_type("main_frame"), RequestKind::MainFrame);
        assert_eq!(RequestKind::from_resource_type("sub_frame"), RequestKind::SubResource);
        assert_eq!(RequestKind::from_resource_type("script"), RequestKind::SubResource);
    }

    #[test]
    fn test_blacklisted_page_keeps_decision_for_sub_resources() {
        let mut policy = Policy::default();
        policy.blacklist.insert("example.com".into());
        let profile = profile("Spoofed/1.0");
        let mut cache = TabDecisionCache::new();

        let first = resolve(&policy, &profile, &mut cache, main_frame(1, "http://example.com/page"));
        assert_eq!(first, EffectiveIdentity::NoOverride);
        assert_eq!(cache.get(1), Some(&Outcome::Disabled));

        // cdn.example.org is not blacklisted, but the tab decision wins
        let sub = resolve(&policy, &profile, &mut cache, sub_resource(1, "http://cdn.example.org/a.js"));
        assert_eq!(sub, EffectiveIdentity::NoOverride);
    }

    #[test]
    fn test_next_navigation_overwrites() {
        let mut policy = Policy::default();
        policy.blacklist.insert("example.com".into());
        let profile = profile("Spoofed/1.0");
        let mut cache = TabDecisionCache::new();

        resolve(&policy, &profile, &mut cache, main_frame(1, "http://example.com/"));
        let next = resolve(&policy, &profile, &mut cache, main_frame(1, "http://other.test/"));
        assert_eq!(next, EffectiveIdentity::Override("Spoofed/1.0".into()));
        assert_eq!(cache.get(1), Some(&Outcome::Allowed));
    }

    #[test]
    fn test_unknown_tab_uses_global_identity() {
        let policy = Policy::default();
        let profile = profile("Spoofed/1.0");
        let mut cache = TabDecisionCache::new();

        let id = resolve(&policy, &profile, &mut cache, sub_resource(-1, "https://api.test/"));
        assert_eq!(id, EffectiveIdentity::Override("Spoofed/1.0".into()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_custom_mode() {
        let mut policy = Policy {
            mode: Mode::Custom,
            ..Default::default()
        };
        policy.custom.insert("foo.com".into(), "Custom/2.0".into());
        let profile = profile(crate::profile::CUSTOM_MODE_LABEL);
        let mut cache = TabDecisionCache::new();

        let id = resolve(&policy, &profile, &mut cache, main_frame(2, "http://foo.com/"));
        assert_eq!(id, EffectiveIdentity::Override("Custom/2.0".into()));
        assert_eq!(cache.get(2), Some(&Outcome::CustomIdentity("Custom/2.0".into())));

        let unmapped = resolve(&policy, &profile, &mut cache, main_frame(3, "http://bar.com/"));
        assert_eq!(unmapped, EffectiveIdentity::NoOverride);

        // No decision yet: custom mode never falls back to the label
        let orphan = resolve(&policy, &profile, &mut cache, sub_resource(4, "http://foo.com/x"));
        assert_eq!(orphan, EffectiveIdentity::NoOverride);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut policy = Policy {
            mode: Mode::Whitelist,
            ..Default::default()
        };
        policy.whitelist.insert("ok.test".into());
        let profile = profile("Spoofed/1.0");
        let mut cache = TabDecisionCache::new();

        resolve(&policy, &profile, &mut cache, main_frame(9, "https://ok.test/"));
        let a = resolve(&policy, &profile, &mut cache, sub_resource(9, "https://elsewhere.test/"));
        let b = resolve(&policy, &profile, &mut cache, sub_resource(9, "https://elsewhere.test/"));
        assert_eq!(a, b);
        assert_eq!(a, EffectiveIdentity::Override("Spoofed/1.0".into()));
    }
}
