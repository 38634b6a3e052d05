//! Header Rewrite Interceptor
//!
//! Runs inside the blocking `webRequest.onBeforeSendHeaders` callback. The
//! request is held until this returns, so nothing here may await or do I/O.

use serde::{Deserialize, Serialize};

use crate::resolver::EffectiveIdentity;

/// One entry of `webRequest.HttpHeaders`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(
        rename = "binaryValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub binary_value: Option<Vec<u8>>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            binary_value: None,
        }
    }

    /// The network layer reports the UA header in one of these two spellings
    fn is_user_agent(&self) -> bool {
        self.name == "User-Agent" || self.name == "user-agent"
    }
}

/// Overwrite the first `User-Agent` header with `identity`.
///
/// Returns `true` when a header was changed. Headers are left untouched for
/// [`EffectiveIdentity::NoOverride`] and when no UA header is present.
pub fn rewrite_user_agent(headers: &mut [HttpHeader], identity: &EffectiveIdentity) -> bool {
    let EffectiveIdentity::Override(user_agent) = identity else {
        return false;
    };

    match headers.iter_mut().find(|h| h.is_user_agent()) {
        Some(header) => {
            header.value = Some(user_agent.clone());
            header.binary_value = None;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_headers(ua_name: &str) -> Vec<HttpHeader> {
        vec![
            HttpHeader::new("Accept", "text/html"),
            HttpHeader::new(ua_name, "RealBrowser/99"),
            HttpHeader::new("Accept-Language", "en-US"),
        ]
    }

    #[test]
    fn test_rewrites_canonical_name() {
        let mut headers = request_headers("User-Agent");
        let changed =
            rewrite_user_agent(&mut headers, &EffectiveIdentity::Override("Spoofed/1.0".into()));

        assert!(changed);
        assert_eq!(headers[1].value.as_deref(), Some("Spoofed/1.0"));
        assert_eq!(headers[0].value.as_deref(), Some("text/html"));
        assert_eq!(headers[2].value.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_rewrites_lowercase_name() {
        let mut headers = request_headers("user-agent");
        assert!(rewrite_user_agent(
            &mut headers,
            &EffectiveIdentity::Override("Custom/2.0".into())
        ));
        assert_eq!(headers[1].value.as_deref(), Some("Custom/2.0"));
    }

    #[test]
    fn test_other_casings_not_matched() {
        let mut headers = request_headers("USER-AGENT");
        assert!(!rewrite_user_agent(
            &mut headers,
            &EffectiveIdentity::Override("Spoofed/1.0".into())
        ));
        assert_eq!(headers[1].value.as_deref(), Some("RealBrowser/99"));
    }

    #[test]
    fn test_no_override_leaves_headers() {
        let mut headers = request_headers("User-Agent");
        let before = headers.clone();
        assert!(!rewrite_user_agent(&mut headers, &EffectiveIdentity::NoOverride));
        assert_eq!(headers, before);
    }

    #[test]
    fn test_missing_header_and_empty_list() {
        let mut headers = vec![HttpHeader::new("Accept", "*/*")];
        assert!(!rewrite_user_agent(
            &mut headers,
            &EffectiveIdentity::Override("Spoofed/1.0".into())
        ));

        let mut empty: Vec<HttpHeader> = Vec::new();
        assert!(!rewrite_user_agent(
            &mut empty,
            &EffectiveIdentity::Override("Spoofed/1.0".into())
        ));
    }

    #[test]
    fn test_header_wire_shape() {
        let header: HttpHeader =
            serde_json::from_value(serde_json::json!({ "name": "User-Agent", "value": "X" }))
                .unwrap();
        assert_eq!(header, HttpHeader::new("User-Agent", "X"));

        let out = serde_json::to_value(&header).unwrap();
        assert_eq!(out, serde_json::json!({ "name": "User-Agent", "value": "X" }));
    }
}
