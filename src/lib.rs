//! # UA Switcher WASM
//!
//! Per-tab User-Agent switching for browser extensions, compiled to
//! WebAssembly and driven from the extension's background page.
//!
//! ## Architecture
//!
//! ```text
//! chrome.storage ──► Config ──► IdentityProfile ──► (un)register listeners
//!                                      │
//! main-frame request ──► Policy::matches ──► TabDecisionCache
//!                                      │
//!                   ┌──────────── resolver ────────────┐
//!                   ▼                                  ▼
//!        User-Agent header rewrite           navigator getter script
//! ```
//!
//! ## Features
//!
//! - **Three modes**: blacklist, whitelist, or a custom host → UA map
//! - **One decision per navigation**: every request of a page carries the
//!   identity chosen for its top-level document
//! - **Consistent page view**: `navigator.userAgent`, `appVersion`, `platform`
//!   and `vendor` match the header
//! - **Off means off**: an empty UA detaches every listener
//!
//! The decision engine ([`policy`], [`tab_cache`], [`resolver`], [`interceptor`],
//! [`state`]) is plain Rust with no browser dependency. [`extension`] binds it to
//! the WebExtensions APIs.

use wasm_bindgen::prelude::*;

// Modules
pub mod config;
pub mod display;
mod error;
pub mod events;
pub mod extension;
pub mod interceptor;
pub mod policy;
pub mod profile;
pub mod resolver;
pub mod state;
pub mod tab_cache;

pub use error::{ErrorCode, ErrorInfo, Result, SwitcherError};
pub use config::{parse_changes, Config, ConfigKey, StorageChange};
pub use display::{DisplayState, ICON_SIZES};
pub use events::{BeforeSendHeadersDetails, BlockingResponse, CommittedDetails};
pub use extension::{UaParserJs, UaSwitcher};
pub use interceptor::{is_injectable_url, rewrite_user_agent, HttpHeader, Injection};
pub use policy::{hostname, Mode, Outcome, Policy};
pub use profile::{IdentityProfile, ParsedUa, UaParser, CUSTOM_MODE_LABEL};
pub use resolver::{resolve, EffectiveIdentity, RequestContext, RequestKind};
pub use state::{AppState, ConfigUpdate, Toggle};
pub use tab_cache::{TabDecisionCache, TabId};

/// Initialize the UA switcher module
///
/// This sets up logging.
#[wasm_bindgen(start)]
pub fn init() {
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&JsValue::from_str("ua-switcher: logger already set"));
        return;
    }

    log::info!("UA switcher WASM module initialized");
}
