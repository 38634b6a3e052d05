//! `chrome.*` accessors over `Reflect`.
//!
//! The extension APIs have no web-sys bindings, so namespaces, events and
//! methods are looked up by name on the global object. Firefox exposes the
//! same callback API under `chrome`.

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::display::DisplayState;
use crate::error::{js_error_message, Result, SwitcherError};
use crate::interceptor::injector::ExecuteScriptDetails;
use crate::tab_cache::TabId;

/// Resolve a dotted path below `chrome`, e.g. `["webRequest", "onBeforeSendHeaders"]`.
pub fn api(path: &[&str]) -> Result<JsValue> {
    let mut current = Reflect::get(&js_sys::global(), &JsValue::from_str("chrome"))
        .map_err(|e| SwitcherError::from_js(&e))?;

    for (depth, segment) in path.iter().enumerate() {
        if current.is_undefined() || current.is_null() {
            return Err(SwitcherError::ApiUnavailable(format!(
                "chrome.{}",
                path[..depth].join(".")
            )));
        }
        current = Reflect::get(&current, &JsValue::from_str(segment))
            .map_err(|e| SwitcherError::from_js(&e))?;
    }

    if current.is_undefined() || current.is_null() {
        return Err(SwitcherError::ApiUnavailable(format!("chrome.{}", path.join("."))));
    }
    Ok(current)
}

/// Call `target[method](...args)`.
pub fn call_method(target: &JsValue, method: &str, args: &Array) -> Result<JsValue> {
    let func: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(|e| SwitcherError::from_js(&e))?
        .dyn_into()
        .map_err(|_| SwitcherError::ApiUnavailable(format!("{} is not a function", method)))?;
    Reflect::apply(&func, target, args).map_err(|e| SwitcherError::from_js(&e))
}

/// Serialize to a plain JS object (not a `Map`).
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

/// `chrome.runtime.lastError.message`, read inside an API callback.
pub fn last_error() -> Option<String> {
    let error = api(&["runtime", "lastError"]).ok()?;
    Some(js_error_message(&error))
}

/// `event.addListener(listener, ...extra)`
pub fn add_listener(event: &[&str], listener: &JsValue, extra: &[JsValue]) -> Result<()> {
    let target = api(event)?;
    let args = Array::of1(listener);
    for value in extra {
        args.push(value);
    }
    call_method(&target, "addListener", &args)
        .map(|_| ())
        .map_err(|e| SwitcherError::Listener(format!("{}: {}", event.join("."), e)))
}

/// `event.removeListener(listener)`
pub fn remove_listener(event: &[&str], listener: &JsValue) -> Result<()> {
    let target = api(event)?;
    call_method(&target, "removeListener", &Array::of1(listener))
        .map(|_| ())
        .map_err(|e| SwitcherError::Listener(format!("{}: {}", event.join("."), e)))
}

/// `chrome.storage.local.get(defaults)`, resolved with the stored values
/// merged over `defaults`.
pub async fn storage_get(defaults: &JsValue) -> Result<JsValue> {
    let local = api(&["storage", "local"])?;
    let defaults = defaults.clone();

    let mut call_error = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        // Callback form works on every browser that ships the API
        if let Err(e) = call_method(&local, "get", &Array::of2(&defaults, &resolve)) {
            call_error = Some(e);
        }
    });
    if let Some(e) = call_error {
        return Err(SwitcherError::Storage(e.to_string()));
    }

    JsFuture::from(promise)
        .await
        .map_err(|e| SwitcherError::Storage(js_error_message(&e)))
}

/// `chrome.tabs.executeScript(tabId, details, callback)`.
///
/// Failures (restricted pages, closed tabs) are logged and dropped.
pub fn execute_script(tab_id: TabId, details: &ExecuteScriptDetails) {
    let result = (|| -> Result<()> {
        let tabs = api(&["tabs"])?;
        let callback = Closure::once_into_js(move || {
            if let Some(reason) = last_error() {
                let err = SwitcherError::Injection { tab_id, reason };
                log::debug!("{}", err);
            }
        });
        let args = Array::of3(&JsValue::from(tab_id), &to_js(details)?, &callback);
        call_method(&tabs, "executeScript", &args)?;
        Ok(())
    })();

    if let Err(e) = result {
        let err = SwitcherError::Injection {
            tab_id,
            reason: e.to_string(),
        };
        log::debug!("{}", err);
    }
}

/// Push icon and tooltip to `browserAction` (or `action` on MV3 builds).
pub fn set_display(display: &DisplayState) -> Result<()> {
    let action = api(&["browserAction"]).or_else(|_| api(&["action"]))?;

    let paths = Object::new();
    for (size, path) in &display.icon_paths {
        Reflect::set(&paths, &JsValue::from(*size), &JsValue::from_str(path))
            .map_err(|e| SwitcherError::from_js(&e))?;
    }
    let icon = Object::new();
    Reflect::set(&icon, &JsValue::from_str("path"), &paths)
        .map_err(|e| SwitcherError::from_js(&e))?;
    call_method(&action, "setIcon", &Array::of1(&icon))?;

    let title = Object::new();
    Reflect::set(
        &title,
        &JsValue::from_str("title"),
        &JsValue::from_str(&display.title),
    )
    .map_err(|e| SwitcherError::from_js(&e))?;
    call_method(&action, "setTitle", &Array::of1(&title))?;

    Ok(())
}

/// The browser's own `navigator.userAgent`
pub fn browser_user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}
