//! Browser boundary
//!
//! Everything that talks to the WebExtensions APIs lives here. The rest of the
//! crate is plain Rust and never touches `JsValue`.

pub mod chrome;
mod switcher;
mod ua_parser;

pub use switcher::UaSwitcher;
pub use ua_parser::UaParserJs;
