//! The exported background-page object.
//!
//! ```javascript
//! import init, { UaSwitcher } from './pkg/ua_switcher_wasm.js';
//! await init();
//! const switcher = await UaSwitcher.start();
//! ```
//!
//! `start()` loads the settings and subscribes to storage and tab events. The
//! request and navigation listeners are attached only while an identity is
//! configured, and detached again when it is cleared.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Array;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use super::chrome;
use super::ua_parser::UaParserJs;
use crate::config::{parse_changes, Config};
use crate::error::{ErrorInfo, Result, SwitcherError};
use crate::events::{BeforeSendHeadersDetails, CommittedDetails};
use crate::state::{AppState, Toggle};
use crate::tab_cache::TabId;

const BEFORE_SEND_HEADERS: &[&str] = &["webRequest", "onBeforeSendHeaders"];
const COMMITTED: &[&str] = &["webNavigation", "onCommitted"];
const STORAGE_CHANGED: &[&str] = &["storage", "onChanged"];
const TAB_REMOVED: &[&str] = &["tabs", "onRemoved"];

/// Listener closures alive while enforcement is on
struct Enforcement {
    before_send_headers: Closure<dyn FnMut(JsValue) -> JsValue>,
    committed: Closure<dyn FnMut(JsValue)>,
}

struct Inner {
    state: RefCell<AppState>,
    enforcement: RefCell<Option<Enforcement>>,
    /// Whether this instance drives the browser APIs itself
    attached: Cell<bool>,
    last_error: RefCell<Option<SwitcherError>>,
}

/// UA switcher bound to the extension APIs
#[wasm_bindgen]
pub struct UaSwitcher {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl UaSwitcher {
    /// Build from a settings snapshot without touching any browser API.
    #[wasm_bindgen(constructor)]
    pub fn new(snapshot: JsValue) -> UaSwitcher {
        let snapshot: Value = if snapshot.is_undefined() || snapshot.is_null() {
            Value::Null
        } else {
            serde_wasm_bindgen::from_value(snapshot).unwrap_or_else(|e| {
                log::warn!("⚠️ Unreadable settings snapshot, using defaults: {}", e);
                Value::Null
            })
        };

        let state = AppState::new(Config::from_snapshot(&snapshot), Box::new(UaParserJs));
        UaSwitcher {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                enforcement: RefCell::new(None),
                attached: Cell::new(false),
                last_error: RefCell::new(None),
            }),
        }
    }

    /// Load settings from `chrome.storage.local` and attach to the browser.
    pub async fn start() -> std::result::Result<UaSwitcher, JsValue> {
        let defaults = chrome::to_js(&Config::defaults_object())?;
        let snapshot = match chrome::storage_get(&defaults).await {
            Ok(s) => s,
            Err(e) => {
                log::warn!("⚠️ {}", e);
                JsValue::UNDEFINED
            }
        };

        let switcher = UaSwitcher::new(snapshot);
        switcher.attach()?;
        Ok(switcher)
    }

    /// Subscribe to storage and tab events and apply the current identity.
    pub fn attach(&self) -> std::result::Result<(), JsValue> {
        if self.inner.attached.replace(true) {
            return Ok(());
        }
        if !UaParserJs::is_available() {
            log::warn!(
                "⚠️ {}",
                SwitcherError::Parser("UAParser is not loaded, platform and vendor stay blank".into())
            );
        }

        let weak = Rc::downgrade(&self.inner);
        let on_changed = Closure::wrap(Box::new(move |changes: JsValue, _area: JsValue| {
            if let Some(inner) = weak.upgrade() {
                inner.storage_changed(changes);
            }
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        chrome::add_listener(STORAGE_CHANGED, on_changed.as_ref(), &[])?;
        on_changed.forget();

        let weak = Rc::downgrade(&self.inner);
        let on_removed = Closure::wrap(Box::new(move |tab_id: JsValue, _info: JsValue| {
            if let (Some(inner), Some(id)) = (weak.upgrade(), tab_id.as_f64()) {
                inner.state.borrow_mut().on_tab_removed(id as TabId);
            }
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        chrome::add_listener(TAB_REMOVED, on_removed.as_ref(), &[])?;
        on_removed.forget();

        let toggle = self.inner.state.borrow().initial_toggle();
        if let Err(e) = self.inner.apply_toggle(toggle) {
            self.inner.report(e.clone());
            return Err(e.into());
        }
        self.inner.refresh_display();

        log::info!("✅ UA switcher attached");
        Ok(())
    }

    /// `webRequest.onBeforeSendHeaders` entry point. Returns a blocking
    /// response or `undefined`.
    #[wasm_bindgen(js_name = handleBeforeSendHeaders)]
    pub fn handle_before_send_headers(&self, details: JsValue) -> JsValue {
        self.inner.before_send_headers(details)
    }

    /// `webNavigation.onCommitted` entry point.
    #[wasm_bindgen(js_name = handleCommitted)]
    pub fn handle_committed(&self, details: JsValue) {
        self.inner.committed(details)
    }

    /// `storage.onChanged` entry point.
    #[wasm_bindgen(js_name = handleStorageChanged)]
    pub fn handle_storage_changed(&self, changes: JsValue) {
        self.inner.storage_changed(changes)
    }

    /// `tabs.onRemoved` entry point.
    #[wasm_bindgen(js_name = handleTabRemoved)]
    pub fn handle_tab_removed(&self, tab_id: i32) {
        self.inner.state.borrow_mut().on_tab_removed(tab_id)
    }

    #[wasm_bindgen(getter)]
    pub fn enabled(&self) -> bool {
        self.inner.state.borrow().is_enabled()
    }

    /// Current identity profile as `{raw, userAgent, appVersion, platform, vendor}`
    #[wasm_bindgen(getter)]
    pub fn profile(&self) -> std::result::Result<JsValue, JsValue> {
        Ok(chrome::to_js(self.inner.state.borrow().profile())?)
    }

    /// Most recent browser-side failure as
    /// `{code, message, user_message, is_swallowed}`, or `null`.
    #[wasm_bindgen(getter, js_name = lastError)]
    pub fn last_error(&self) -> std::result::Result<JsValue, JsValue> {
        match self.inner.last_error.borrow().as_ref() {
            Some(err) => Ok(chrome::to_js(&ErrorInfo::from(err))?),
            None => Ok(JsValue::NULL),
        }
    }
}

impl Inner {
    fn before_send_headers(&self, details: JsValue) -> JsValue {
        let details: BeforeSendHeadersDetails = match serde_wasm_bindgen::from_value(details) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("⚠️ Unreadable request details: {}", e);
                return JsValue::UNDEFINED;
            }
        };

        let response = self.state.borrow_mut().on_before_send_headers(details);
        match response.map(|r| chrome::to_js(&r)) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                log::warn!("⚠️ {}", e);
                JsValue::UNDEFINED
            }
            None => JsValue::UNDEFINED,
        }
    }

    fn committed(&self, details: JsValue) {
        let details: CommittedDetails = match serde_wasm_bindgen::from_value(details) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("⚠️ Unreadable navigation details: {}", e);
                return;
            }
        };

        let injection = self.state.borrow().on_committed(&details);
        if let Some(injection) = injection {
            chrome::execute_script(injection.tab_id, &injection.details);
        }
    }

    fn storage_changed(self: &Rc<Self>, changes: JsValue) {
        let changes: Value = match serde_wasm_bindgen::from_value(changes) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("⚠️ Unreadable storage changes: {}", e);
                return;
            }
        };

        let update = self.state.borrow_mut().apply_changes(&parse_changes(&changes));
        if !self.attached.get() {
            return;
        }
        if let Err(e) = self.apply_toggle(update.toggle) {
            self.report(e);
        }
        if update.identity_changed {
            self.refresh_display();
        }
    }

    /// Attach or detach the two enforcement listeners.
    fn apply_toggle(self: &Rc<Self>, toggle: Toggle) -> Result<()> {
        match toggle {
            Toggle::Enable => {
                if self.enforcement.borrow().is_some() {
                    return Ok(());
                }
                let enforcement = self.enforcement_listeners();

                let filter = chrome::to_js(&serde_json::json!({ "urls": ["*://*/*"] }))?;
                let extra = Array::of2(
                    &JsValue::from_str("blocking"),
                    &JsValue::from_str("requestHeaders"),
                );
                chrome::add_listener(
                    BEFORE_SEND_HEADERS,
                    enforcement.before_send_headers.as_ref(),
                    &[filter, extra.into()],
                )?;
                if let Err(e) = chrome::add_listener(COMMITTED, enforcement.committed.as_ref(), &[])
                {
                    // Roll back so both listeners stay off together
                    if let Err(rollback) = chrome::remove_listener(
                        BEFORE_SEND_HEADERS,
                        enforcement.before_send_headers.as_ref(),
                    ) {
                        log::error!("❌ {}", rollback);
                        enforcement.before_send_headers.forget();
                    }
                    return Err(e);
                }

                *self.enforcement.borrow_mut() = Some(enforcement);
                log::info!("🛡️ Request and navigation listeners registered");
            }
            Toggle::Disable => {
                let Some(enforcement) = self.enforcement.borrow_mut().take() else {
                    return Ok(());
                };
                let Enforcement {
                    before_send_headers,
                    committed,
                } = enforcement;

                // A closure still registered with the browser must outlive this call
                let mut failure = None;
                if let Err(e) = chrome::remove_listener(BEFORE_SEND_HEADERS, before_send_headers.as_ref())
                {
                    before_send_headers.forget();
                    failure = Some(e);
                }
                if let Err(e) = chrome::remove_listener(COMMITTED, committed.as_ref()) {
                    committed.forget();
                    match failure {
                        Some(_) => log::error!("❌ {}", e),
                        None => failure = Some(e),
                    }
                }
                if let Some(e) = failure {
                    return Err(e);
                }
                log::info!("Request and navigation listeners removed");
            }
            Toggle::Unchanged => {}
        }
        Ok(())
    }

    fn enforcement_listeners(self: &Rc<Self>) -> Enforcement {
        let weak: Weak<Inner> = Rc::downgrade(self);
        let before_send_headers = Closure::wrap(Box::new(move |details: JsValue| -> JsValue {
            match weak.upgrade() {
                Some(inner) => inner.before_send_headers(details),
                None => JsValue::UNDEFINED,
            }
        }) as Box<dyn FnMut(JsValue) -> JsValue>);

        let weak: Weak<Inner> = Rc::downgrade(self);
        let committed = Closure::wrap(Box::new(move |details: JsValue| {
            if let Some(inner) = weak.upgrade() {
                inner.committed(details);
            }
        }) as Box<dyn FnMut(JsValue)>);

        Enforcement {
            before_send_headers,
            committed,
        }
    }

    fn report(&self, err: SwitcherError) {
        if err.is_swallowed() {
            log::warn!("⚠️ {}", err);
        } else {
            log::error!("❌ {}", err);
        }
        *self.last_error.borrow_mut() = Some(err);
    }

    fn refresh_display(&self) {
        let display = self.state.borrow().display(&chrome::browser_user_agent());
        if let Err(e) = chrome::set_display(&display) {
            log::debug!("Display not updated: {}", e);
        }
    }
}
