//! Typed payloads of the browser events the switcher listens to.
//!
//! Field names follow the WebExtensions API; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::interceptor::HttpHeader;
use crate::resolver::{RequestContext, RequestKind};
use crate::tab_cache::TabId;

/// `webRequest.onBeforeSendHeaders` details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeSendHeadersDetails {
    #[serde(default = "no_tab")]
    pub tab_id: TabId,
    pub url: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub request_headers: Vec<HttpHeader>,
}

impl BeforeSendHeadersDetails {
    pub fn context(&self) -> RequestContext<'_> {
        RequestContext {
            tab_id: self.tab_id,
            url: &self.url,
            kind: RequestKind::from_resource_type(&self.resource_type),
        }
    }
}

/// Return value of a blocking `onBeforeSendHeaders` listener
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingResponse {
    pub request_headers: Vec<HttpHeader>,
}

/// `webNavigation.onCommitted` details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedDetails {
    pub tab_id: TabId,
    pub frame_id: i64,
    #[serde(default)]
    pub url: String,
}

impl CommittedDetails {
    pub fn is_top_level(&self) -> bool {
        self.frame_id == 0
    }
}

fn no_tab() -> TabId {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_before_send_headers_details() {
        let details: BeforeSendHeadersDetails = serde_json::from_value(json!({
            "requestId": "42",
            "tabId": 3,
            "frameId": 0,
            "url": "http://example.com/page",
            "type": "main_frame",
            "requestHeaders": [{ "name": "User-Agent", "value": "Real/1" }],
            "timeStamp": 1.5,
        }))
        .unwrap();

        assert_eq!(details.tab_id, 3);
        assert_eq!(details.request_headers.len(), 1);
        assert_eq!(details.context().kind, RequestKind::MainFrame);
    }

    #[test]
    fn test_background_request_defaults() {
        let details: BeforeSendHeadersDetails =
            serde_json::from_value(json!({ "url": "https://update.test/" })).unwrap();
        assert_eq!(details.tab_id, -1);
        assert!(details.request_headers.is_empty());
        assert_eq!(details.context().kind, RequestKind::SubResource);
    }

    #[test]
    fn test_blocking_response_shape() {
        let response = BlockingResponse {
            request_headers: vec![HttpHeader::new("User-Agent", "Spoofed/1.0")],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "requestHeaders": [{ "name": "User-Agent", "value": "Spoofed/1.0" }] })
        );
    }

    #[test]
    fn test_committed_details() {
        let top: CommittedDetails = serde_json::from_value(json!({
            "tabId": 5, "frameId": 0, "url": "https://site.test", "transitionType": "link",
        }))
        .unwrap();
        assert!(top.is_top_level());

        let sub: CommittedDetails =
            serde_json::from_value(json!({ "tabId": 5, "frameId": 12, "url": "https://ad.test" }))
                .unwrap();
        assert!(!sub.is_top_level());
    }
}
