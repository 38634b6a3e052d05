//! Enforcement points
//!
//! Two places apply a resolved identity:
//!
//! - [`headers`]: the blocking `onBeforeSendHeaders` rewrite of `User-Agent`
//! - [`injector`]: the `document_start` script that patches `navigator`
//!
//! Both are registered and unregistered together, whenever the global identity
//! switches between empty and non-empty.

pub mod headers;
pub mod injector;

pub use headers::{rewrite_user_agent, HttpHeader};
pub use injector::{is_injectable_url, Injection};
