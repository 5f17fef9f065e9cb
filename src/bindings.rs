//! stripe_billing_intercept/src/bindings.rs
//!
//! Low‐level wasm-bindgen bindings to Stripe.js v2 and the host page's
//! CiviCRM scripts.
//!
//! v2 is callback based: `Stripe.card.createToken(params, handler)` calls
//! `handler(status, response)` exactly once on a later event-loop turn.
//! Higher-level wrappers live in `client.rs` and `processor.rs`.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// `Stripe.setPublishableKey(key)`
    ///
    /// ```js
    ///   Stripe.setPublishableKey("pk_test_...");
    /// ```
    #[wasm_bindgen(catch, js_namespace = Stripe, js_name = setPublishableKey)]
    pub fn set_publishable_key(publishable_key: &str) -> Result<(), JsValue>;

    /// `Stripe.card.createToken({ name, number, cvc, ... }, handler)`
    ///
    /// `handler` must be a JS function of `(status, response)`.
    #[wasm_bindgen(catch, js_namespace = ["Stripe", "card"], js_name = createToken)]
    pub fn create_card_token(params: &JsValue, handler: &JsValue) -> Result<(), JsValue>;
}

#[wasm_bindgen]
extern "C" {
    /// `CRM.api3(entity, action, params)`
    ///
    /// Returns a jQuery deferred resolving with the API envelope
    /// (`{ is_error, result, error_message }`).
    #[wasm_bindgen(catch, js_namespace = CRM, js_name = api3)]
    pub fn crm_api3(entity: &str, action: &str, params: &JsValue) -> Result<JsValue, JsValue>;

    /// A jQuery collection.
    pub type JQuery;

    /// `jQuery(target)`. Throws when jQuery is not on the page.
    #[wasm_bindgen(catch, js_name = jQuery)]
    pub fn jquery(target: &JsValue) -> Result<JQuery, JsValue>;

    /// jQuery Validation's `$(form).valid()`. Throws when the plugin is not loaded.
    #[wasm_bindgen(method, catch)]
    pub fn valid(this: &JQuery) -> Result<JsValue, JsValue>;
}
