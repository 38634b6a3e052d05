//! Binding to the page-global `UAParser` (ua-parser-js), loaded by the
//! background page before the wasm module.

use js_sys::Reflect;
use wasm_bindgen::prelude::*;

use crate::error::{js_error_message, SwitcherError};
use crate::profile::{ParsedUa, UaParser};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = UAParser)]
    type JsUaParser;

    #[wasm_bindgen(constructor, js_class = "UAParser", catch)]
    fn new(user_agent: &str) -> Result<JsUaParser, JsValue>;

    #[wasm_bindgen(method, js_class = "UAParser", js_name = getOS, catch)]
    fn get_os(this: &JsUaParser) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_class = "UAParser", js_name = getDevice, catch)]
    fn get_device(this: &JsUaParser) -> Result<JsValue, JsValue>;
}

/// [`UaParser`] backed by ua-parser-js
#[derive(Debug, Default, Clone, Copy)]
pub struct UaParserJs;

impl UaParserJs {
    pub fn is_available() -> bool {
        Reflect::get(&js_sys::global(), &JsValue::from_str("UAParser"))
            .map(|v| v.is_function())
            .unwrap_or(false)
    }
}

impl UaParser for UaParserJs {
    fn parse(&self, user_agent: &str) -> ParsedUa {
        // Reported once by `UaSwitcher::attach`
        if !Self::is_available() {
            return ParsedUa::default();
        }

        let parser = match JsUaParser::new(user_agent) {
            Ok(p) => p,
            Err(e) => {
                log::debug!("{}", SwitcherError::Parser(js_error_message(&e)));
                return ParsedUa::default();
            }
        };

        ParsedUa {
            os_name: parser.get_os().ok().and_then(|os| string_field(&os, "name")),
            device_vendor: parser
                .get_device()
                .ok()
                .and_then(|device| string_field(&device, "vendor")),
        }
    }
}

fn string_field(obj: &JsValue, name: &str) -> Option<String> {
    Reflect::get(obj, &JsValue::from_str(name))
        .ok()
        .and_then(|v| v.as_string())
        .filter(|s| !s.is_empty())
}
