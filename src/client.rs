//! stripe_billing_intercept/src/client.rs
//!
//! Tokenization Client adapter: one `Stripe.card.createToken` call per
//! guarded submission, surfaced as a future.
//!
//! This module provides:
//! - `TokenizationRequest`, read from the billing form at call time.
//! - `TokenizationResult`, the one-shot outcome handed to the controller.
//! - `Tokenizer`, the seam the controller's web glue drives.
//! - `StripeJsTokenizer`, the Stripe.js v2 implementation.
//! - `with_timeout()` to bound an outstanding call when configured.
//!
//! # Example Usage
//! ```rust,ignore
//! let request = TokenizationRequest::from_form(&form, &config);
//! wasm_bindgen_futures::spawn_local(async move {
//!     match StripeJsTokenizer.request_token(request).await {
//!         TokenizationResult::Token(id)    => log::debug!("got token"),
//!         TokenizationResult::Failure(err) => log::warn!("{}", err.message),
//!     }
//! });
//! ```
//!
//! There is no retry: a failure goes back to the user, who resubmits.

use futures::channel::oneshot;
use futures::future::{self, Either, LocalBoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsValue;

use crate::bindings::create_card_token;
use crate::config::InterceptorConfig;
use crate::dom::BillingForm;
use crate::error::{js_to_stripe_error, InterceptError, StripeError};

/// Card data for `Stripe.card.createToken`. Lives only as long as the call.
#[derive(Serialize, Clone, PartialEq)]
pub struct TokenizationRequest {
    pub name: String,
    pub address_zip: String,
    pub number: String,
    pub cvc: String,
    pub exp_month: String,
    pub exp_year: String,
}

impl std::fmt::Debug for TokenizationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizationRequest")
            .field("name", &self.name)
            .field("address_zip", &self.address_zip)
            .field("number", &"[redacted]")
            .field("cvc", &"[redacted]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish()
    }
}

impl TokenizationRequest {
    pub fn from_form<F: BillingForm>(form: &F, config: &InterceptorConfig) -> Self {
        let value = |id: &str| form.field_value(id).unwrap_or_default();
        let name = format!(
            "{} {}",
            value(&config.first_name_field),
            value(&config.last_name_field)
        );
        Self {
            name: name.trim().to_string(),
            address_zip: value(&config.postal_code_field),
            number: value(&config.card_number_field),
            cvc: value(&config.cvv_field),
            exp_month: value(&config.exp_month_field),
            exp_year: value(&config.exp_year_field),
        }
    }
}

/// The `response` argument of the createToken handler.
#[derive(Deserialize, Debug, Default)]
pub struct TokenResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<StripeError>,
}

/// Outcome of one tokenization call.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenizationResult {
    /// Opaque, single-use card token (`tok_...`).
    Token(String),
    /// Provider (or local) failure; `message` is shown to the user.
    Failure(StripeError),
}

impl TokenizationResult {
    pub fn from_response(response: TokenResponse) -> Self {
        match response {
            TokenResponse { error: Some(err), .. } => Self::Failure(err),
            TokenResponse { id: Some(id), .. } if !id.is_empty() => Self::Token(id),
            _ => Self::Failure(StripeError::new("The payment provider returned no token.")),
        }
    }

    pub fn from_js(response: JsValue) -> Self {
        match from_value::<TokenResponse>(response) {
            Ok(response) => Self::from_response(response),
            Err(e) => Self::Failure(StripeError::new(e.to_string())),
        }
    }

    pub fn from_error(err: InterceptError) -> Self {
        match err {
            InterceptError::Provider(err) => Self::Failure(err),
            other => Self::Failure(StripeError::new(other.to_string())),
        }
    }
}

/// Exchanges card data for a token. Called at most once per guarded submission.
pub trait Tokenizer {
    fn request_token(&self, request: TokenizationRequest) -> LocalBoxFuture<'static, TokenizationResult>;
}

/// `Stripe.card.createToken` from Stripe.js v2.
#[derive(Clone, Copy, Debug, Default)]
pub struct StripeJsTokenizer;

impl Tokenizer for StripeJsTokenizer {
    fn request_token(&self, request: TokenizationRequest) -> LocalBoxFuture<'static, TokenizationResult> {
        let params = match to_value(&request) {
            Ok(params) => params,
            Err(e) => return future::ready(TokenizationResult::Failure(StripeError::new(e.to_string()))).boxed_local(),
        };
        drop(request);

        let (tx, rx) = oneshot::channel::<JsValue>();
        // Frees itself after the single call Stripe.js makes.
        let handler = Closure::once_into_js(move |_status: JsValue, response: JsValue| {
            let _ = tx.send(response);
        });

        if let Err(e) = create_card_token(&params, &handler) {
            let err = js_to_stripe_error(e);
            return future::ready(TokenizationResult::Failure(err)).boxed_local();
        }

        async move {
            match rx.await {
                Ok(response) => TokenizationResult::from_js(response),
                Err(_) => TokenizationResult::from_error(InterceptError::SdkNotLoaded),
            }
        }
        .boxed_local()
    }
}

/// Resolve `call` as a failure if it has not finished within `timeout_ms`.
pub async fn with_timeout(
    call: LocalBoxFuture<'static, TokenizationResult>,
    timeout_ms: Option<u32>,
) -> TokenizationResult {
    let Some(ms) = timeout_ms else {
        return call.await;
    };
    let timer = gloo_timers::future::TimeoutFuture::new(ms).boxed_local();
    match future::select(call, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => TokenizationResult::from_error(InterceptError::Timeout(ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeForm, RAW_CVV, RAW_PAN};

    #[test]
    fn request_is_read_from_form_fields() {
        let cfg = InterceptorConfig::default();
        let request = TokenizationRequest::from_form(&FakeForm::native(), &cfg);
        assert_eq!(request.name, "Ada Lovelace");
        assert_eq!(request.address_zip, "90210");
        assert_eq!(request.number, RAW_PAN);
        assert_eq!(request.cvc, RAW_CVV);
        assert_eq!((request.exp_month.as_str(), request.exp_year.as_str()), ("12", "2030"));

        let wire = serde_json::to_value(&request).unwrap();
        for key in ["name", "address_zip", "number", "cvc", "exp_month", "exp_year"] {
            assert!(wire.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn debug_output_never_shows_card_data() {
        let cfg = InterceptorConfig::default();
        let request = TokenizationRequest::from_form(&FakeForm::native(), &cfg);
        let shown = format!("{request:?}");
        assert!(!shown.contains(RAW_PAN));
        assert!(!shown.contains(RAW_CVV));
    }

    #[test]
    fn success_response_yields_token() {
        let response: TokenResponse = serde_json::from_str(r#"{"id":"tok_123","object":"token"}"#).unwrap();
        assert_eq!(
            TokenizationResult::from_response(response),
            TokenizationResult::Token("tok_123".into())
        );
    }

    #[test]
    fn error_response_yields_provider_message() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"error":{"message":"Your card was declined.","type":"card_error","code":"card_declined"}}"#,
        )
        .unwrap();
        match TokenizationResult::from_response(response) {
            TokenizationResult::Failure(err) => {
                assert_eq!(err.message, "Your card was declined.");
                assert_eq!(err.code.as_deref(), Some("card_declined"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn empty_response_is_a_failure() {
        assert!(matches!(
            TokenizationResult::from_response(TokenResponse::default()),
            TokenizationResult::Failure(_)
        ));
    }

    #[test]
    fn timeout_error_reads_as_retry_message() {
        let TokenizationResult::Failure(err) = TokenizationResult::from_error(InterceptError::Timeout(30000)) else {
            panic!("timeout must fail");
        };
        assert!(err.message.contains("30000 ms"));
    }

    #[test]
    fn no_timeout_awaits_the_call() {
        let call = future::ready(TokenizationResult::Token("tok_9".into())).boxed_local();
        let result = futures::executor::block_on(with_timeout(call, None));
        assert_eq!(result, TokenizationResult::Token("tok_9".into()));
    }
}
