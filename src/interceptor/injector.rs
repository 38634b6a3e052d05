//! Page Identity Injector
//!
//! Once a top-level navigation commits, a content script is executed in the
//! tab at `document_start` in every frame. It adds a `<script>` element to the
//! page so the getters are defined in the page's own world, where
//! fingerprinting code reads them.
//!
//! The values are frozen at injection time. A later configuration change only
//! affects the next navigation.

use serde::Serialize;
use serde_json::Value;

use crate::policy::{Mode, Outcome};
use crate::profile::{IdentityProfile, UaParser};
use crate::resolver::{resolve_cached, EffectiveIdentity};
use crate::tab_cache::TabId;

/// `tabs.executeScript` details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteScriptDetails {
    pub code: String,
    pub run_at: &'static str,
    pub all_frames: bool,
}

/// A content script ready to be executed in a tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub tab_id: TabId,
    pub details: ExecuteScriptDetails,
}

impl Injection {
    pub fn new(tab_id: TabId, profile: &IdentityProfile) -> Self {
        Self {
            tab_id,
            details: ExecuteScriptDetails {
                code: content_script(profile),
                run_at: "document_start",
                all_frames: true,
            },
        }
    }
}

/// Schemes the injector handles (`http`, `https`, `ftp`)
pub fn is_injectable_url(url: &str) -> bool {
    url.starts_with("http") || url.starts_with("ftp")
}

/// Pick the profile a committed page should see, if any.
///
/// The page sees the identity its requests carry: the same mode-first
/// resolution as the header path. A custom UA gets a profile derived from it.
/// In custom mode the global profile is only a label and is never injected.
pub fn profile_for_page(
    mode: Mode,
    global: &IdentityProfile,
    decision: Option<&Outcome>,
    parser: &dyn UaParser,
) -> Option<IdentityProfile> {
    match resolve_cached(mode, global, decision) {
        EffectiveIdentity::NoOverride => None,
        EffectiveIdentity::Override(identity) => match mode {
            Mode::Custom => Some(IdentityProfile::derive(&identity, parser)),
            Mode::Blacklist | Mode::Whitelist => Some(global.clone()),
        },
    }
}

/// Source run in the page world: redefines the `navigator` identity getters.
pub fn page_script(profile: &IdentityProfile) -> String {
    let getters = [
        ("userAgent", &profile.user_agent),
        ("appVersion", &profile.app_version),
        ("platform", &profile.platform),
        ("vendor", &profile.vendor),
    ];

    let mut script = String::from(
        "{\n  const define = (name, value) => Object.defineProperty(navigator, name, \
         { get: () => value, configurable: true, enumerable: true });\n",
    );
    for (name, value) in getters {
        script.push_str(&format!(
            "  define({}, {});\n",
            js_string(name),
            js_string(value)
        ));
    }
    script.push('}');
    script
}

/// Content-script source that plants [`page_script`] into the document.
pub fn content_script(profile: &IdentityProfile) -> String {
    format!(
        "{{\n  const script = document.createElement('script');\n  \
         script.textContent = {};\n  \
         document.documentElement.appendChild(script);\n  \
         script.remove();\n}}",
        js_string(&page_script(profile))
    )
}

/// JSON string literal, with the two line terminators JSON allows raw but
/// older script engines reject.
fn js_string(value: &str) -> String {
    Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::StubParser;

    fn profile(ua: &str) -> IdentityProfile {
        IdentityProfile::derive(ua, &StubParser)
    }

    #[test]
    fn test_injectable_schemes() {
        assert!(is_injectable_url("https://site.test"));
        assert!(is_injectable_url("http://site.test/a"));
        assert!(is_injectable_url("ftp://files.test/"));

        assert!(!is_injectable_url("chrome://settings"));
        assert!(!is_injectable_url("about:blank"));
        assert!(!is_injectable_url("file:///etc/hosts"));
        assert!(!is_injectable_url(""));
    }

    #[test]
    fn test_page_script_values() {
        let p = profile("Mozilla/5.0 (Windows NT 10.0)");
        let script = page_script(&p);

        assert!(script.contains(r#"define("userAgent", "Mozilla/5.0 (Windows NT 10.0)");"#));
        assert!(script.contains(r#"define("appVersion", "5.0 (Windows NT 10.0)");"#));
        assert!(script.contains(r#"define("platform", "Windows");"#));
        assert!(script.contains(r#"define("vendor", "");"#));
    }

    #[test]
    fn test_quotes_and_backslashes_escaped() {
        let p = profile(r#"Evil' "UA" \ `tick` ${x}</script>"#);
        let script = page_script(&p);

        assert!(script.contains(r#""Evil' \"UA\" \\ `tick` ${x}</script>""#));

        // The page script is embedded as a single literal in the content script
        let outer = content_script(&p);
        let start = outer.find("script.textContent = ").unwrap() + "script.textContent = ".len();
        let end = outer.find(";\n  document.documentElement").unwrap();
        let embedded: String = serde_json::from_str(&outer[start..end]).unwrap();
        assert_eq!(embedded, script);
    }

    #[test]
    fn test_line_breaks_escaped() {
        let script = page_script(&profile("A\nB\u{2028}C"));
        assert!(script.contains(r#""A\nB\u2028C""#));
        assert_eq!(script.matches('\n').count(), 6);
    }

    #[test]
    fn test_execute_details() {
        let injection = Injection::new(5, &profile("Spoofed/1.0"));
        assert_eq!(injection.tab_id, 5);

        let value = serde_json::to_value(&injection.details).unwrap();
        assert_eq!(value["runAt"], "document_start");
        assert_eq!(value["allFrames"], true);
        assert!(value["code"].as_str().unwrap().contains("Spoofed/1.0"));
    }

    #[test]
    fn test_profile_for_page() {
        let global = profile("Spoofed/1.0");

        assert_eq!(
            profile_for_page(Mode::Blacklist, &global, None, &StubParser),
            Some(global.clone())
        );
        assert_eq!(
            profile_for_page(Mode::Whitelist, &global, Some(&Outcome::Allowed), &StubParser),
            Some(global.clone())
        );
        assert_eq!(
            profile_for_page(Mode::Blacklist, &global, Some(&Outcome::Disabled), &StubParser),
            None
        );

        let custom = profile_for_page(
            Mode::Custom,
            &global,
            Some(&Outcome::CustomIdentity("Mozilla/5.0 (iPhone)".into())),
            &StubParser,
        )
        .unwrap();
        assert_eq!(custom.user_agent, "Mozilla/5.0 (iPhone)");
        assert_eq!(custom.vendor, "Apple");

        assert_eq!(profile_for_page(Mode::Custom, &global, None, &StubParser), None);
    }

    #[test]
    fn test_profile_for_page_follows_current_mode() {
        let global = profile("Spoofed/1.0");
        let stale_custom = Outcome::CustomIdentity("Custom/2.0".into());

        // Left over from custom mode: the header path sends the global UA
        assert_eq!(
            profile_for_page(Mode::Blacklist, &global, Some(&stale_custom), &StubParser),
            Some(global.clone())
        );
        assert_eq!(
            profile_for_page(Mode::Whitelist, &global, Some(&stale_custom), &StubParser),
            Some(global.clone())
        );

        // Left over from blacklist mode: custom mode sends nothing
        assert_eq!(
            profile_for_page(Mode::Custom, &global, Some(&Outcome::Allowed), &StubParser),
            None
        );
    }
}
