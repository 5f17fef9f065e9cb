//! stripe_billing_intercept/src/error.rs
//!
//! Provider error shape and local failure taxonomy.

use serde::Deserialize;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::JsValue;

/// Representation of a Stripe.js error object (`response.error`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StripeError {
    /// Human-readable message, shown to the user as-is.
    pub message: String,
    /// Stripe’s error type, e.g. `"card_error"`.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Optional Stripe error code, e.g. `"card_declined"`.
    #[serde(default)]
    pub code: Option<String>,
}

impl StripeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            code: None,
        }
    }
}

impl std::fmt::Display for StripeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Local failures. None of these reach the host page as exceptions except
/// `InvalidConfig` from `install`.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    #[error("invalid interceptor config: {0}")]
    InvalidConfig(String),
    #[error("no billing form on this page")]
    FormNotFound,
    #[error("billing form has no primary submit control")]
    SubmitControlNotFound,
    #[error("Stripe.js is not loaded")]
    SdkNotLoaded,
    #[error("{0}")]
    Provider(StripeError),
    #[error("no response from the payment provider after {0} ms")]
    Timeout(u32),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("CiviCRM API call failed: {0}")]
    Api(String),
}

impl From<InterceptError> for JsValue {
    fn from(err: InterceptError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Convert any caught `JsValue` into a `StripeError` with best effort.
pub fn js_to_stripe_error(value: JsValue) -> StripeError {
    from_value::<StripeError>(value.clone())
        .unwrap_or_else(|_| StripeError::new(value.as_string().unwrap_or_else(|| format!("{:?}", value))))
}

/// Convert a failed web-sys call into `InterceptError::Dom`.
pub fn js_to_dom_error(value: JsValue) -> InterceptError {
    InterceptError::Dom(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

/// Convert a thrown or rejected `CRM.api3` call into `InterceptError::Api`.
pub fn js_to_api_error(value: JsValue) -> InterceptError {
    InterceptError::Api(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
