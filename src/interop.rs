//! stripe_billing_intercept/src/interop.rs
//!
//! Load Stripe.js v2 at runtime (no inline JS) and keep its publishable key
//! in sync with the billing block.
//!
//! # Overview
//! `ensure_stripe_js()` injects a single
//! `<script id="stripejs-v2" src="https://js.stripe.com/v2/">` into `<head>`
//! on first use and sets the publishable key once the script's `load` event
//! fires. When `window.Stripe` already exists the key is set right away, which
//! is what happens after the host swaps in a different processor's block.

use log::{debug, warn};
use wasm_bindgen::{prelude::Closure, JsCast, JsValue};
use web_sys::js_sys::Reflect;
use web_sys::HtmlScriptElement;

use crate::bindings::set_publishable_key;
use crate::error::{js_to_dom_error, InterceptError};

const SCRIPT_ID: &str = "stripejs-v2";

/// Whether `window.Stripe` is present (script loaded & parsed).
pub fn stripe_js_loaded() -> bool {
    web_sys::window()
        .and_then(|win| Reflect::has(&win, &JsValue::from_str("Stripe")).ok())
        .unwrap_or(false)
}

/// Make Stripe.js available and point it at `publishable_key`.
pub fn ensure_stripe_js(src: &str, publishable_key: &str) -> Result<(), InterceptError> {
    if stripe_js_loaded() {
        return apply_key(publishable_key);
    }

    let document = gloo_utils::document();
    let key = publishable_key.to_string();
    let onload = Closure::once_into_js(move || {
        if let Err(e) = apply_key(&key) {
            warn!("{e}");
        }
    });

    // Injected earlier but still loading: queue another key update.
    if let Some(existing) = document.get_element_by_id(SCRIPT_ID) {
        return existing
            .add_event_listener_with_callback("load", onload.unchecked_ref())
            .map_err(js_to_dom_error);
    }

    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(js_to_dom_error)?
        .dyn_into()
        .map_err(|_| InterceptError::Dom("created element is not a <script>".into()))?;
    script.set_id(SCRIPT_ID);
    script.set_src(src);
    script.set_onload(Some(onload.unchecked_ref()));

    debug!("loading {src}");
    gloo_utils::head()
        .append_child(&script)
        .map(|_| ())
        .map_err(js_to_dom_error)
}

fn apply_key(publishable_key: &str) -> Result<(), InterceptError> {
    set_publishable_key(publishable_key).map_err(|_| InterceptError::SdkNotLoaded)
}
