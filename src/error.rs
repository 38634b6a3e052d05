//! Error types for the UA switcher
//!
//! Nothing in the decision engine is fatal. Every failure either degrades to a
//! default (configuration, parsing) or is swallowed by the caller (injection).
//! This module gives those failures a name, a code and a user-facing message.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, SwitcherError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigInvalid = 100,
    UnknownMode = 101,

    // Browser API errors (2xx)
    ApiUnavailable = 200,
    ListenerFailed = 201,
    StorageFailed = 202,

    // Page errors (3xx)
    InjectionFailed = 300,

    // Collaborator errors (4xx)
    ParserFailed = 400,

    // Internal errors (9xx)
    JsException = 900,
    InternalError = 901,
}

/// Main error type for the UA switcher
#[derive(Error, Debug, Clone)]
pub enum SwitcherError {
    // ===== Configuration Errors =====
    #[error("Invalid configuration for `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    // ===== Browser API Errors =====
    #[error("Browser API unavailable: {0}")]
    ApiUnavailable(String),

    #[error("Listener registration failed: {0}")]
    Listener(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // ===== Page Errors =====
    #[error("Script injection failed in tab {tab_id}: {reason}")]
    Injection { tab_id: i32, reason: String },

    // ===== Collaborator Errors =====
    #[error("User-agent parser failed: {0}")]
    Parser(String),

    // ===== Internal Errors =====
    #[error("JavaScript exception: {0}")]
    Js(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwitcherError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            SwitcherError::InvalidConfig { .. } => ErrorCode::ConfigInvalid,
            SwitcherError::UnknownMode(_) => ErrorCode::UnknownMode,
            SwitcherError::ApiUnavailable(_) => ErrorCode::ApiUnavailable,
            SwitcherError::Listener(_) => ErrorCode::ListenerFailed,
            SwitcherError::Storage(_) => ErrorCode::StorageFailed,
            SwitcherError::Injection { .. } => ErrorCode::InjectionFailed,
            SwitcherError::Parser(_) => ErrorCode::ParserFailed,
            SwitcherError::Js(_) => ErrorCode::JsException,
            SwitcherError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the pipeline carries on with a default after this error.
    ///
    /// Injection into restricted pages, malformed storage values and parser
    /// failures never interrupt a request or a navigation.
    pub fn is_swallowed(&self) -> bool {
        matches!(
            self,
            SwitcherError::Injection { .. }
                | SwitcherError::InvalidConfig { .. }
                | SwitcherError::UnknownMode(_)
                | SwitcherError::Parser(_)
        )
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            SwitcherError::InvalidConfig { key, .. } => format!(
                "The saved value for \"{}\" could not be read. The default will be used.",
                key
            ),
            SwitcherError::UnknownMode(_) => {
                "Unknown filtering mode. Falling back to blacklist mode.".into()
            }
            SwitcherError::ApiUnavailable(_) => {
                "A required browser API is missing. Check the extension permissions.".into()
            }
            SwitcherError::Listener(_) => {
                "Could not attach to browser requests. Try reloading the extension.".into()
            }
            SwitcherError::Storage(_) => {
                "Failed to read saved settings. Defaults are in effect.".into()
            }
            SwitcherError::Injection { .. } => {
                "This page does not allow identity spoofing.".into()
            }
            SwitcherError::Parser(_) => {
                "The User-Agent string could not be analyzed. Platform and vendor are left blank."
                    .into()
            }
            SwitcherError::Js(_) | SwitcherError::Internal(_) => {
                "An internal error occurred. Please report this bug.".into()
            }
        }
    }

    /// Wrap a thrown JavaScript value.
    pub fn from_js(value: &JsValue) -> Self {
        SwitcherError::Js(js_error_message(value))
    }
}

/// Best-effort text for a thrown JavaScript value.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

impl From<SwitcherError> for JsValue {
    fn from(err: SwitcherError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for SwitcherError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        SwitcherError::Internal(err.to_string())
    }
}

/// Error information for JavaScript consumption
#[derive(Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub is_swallowed: bool,
}

impl From<&SwitcherError> for ErrorInfo {
    fn from(err: &SwitcherError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            is_swallowed: err.is_swallowed(),
        }
    }
}
