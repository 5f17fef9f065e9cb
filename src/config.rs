//! stripe_billing_intercept/src/config.rs
//!
//! Page markers and knobs for the interceptor.
//!
//! The host page passes a plain JS object to `BillingInterceptor::install`;
//! every field is optional and falls back to the CiviCRM defaults below.
//!
//! ```js
//! const interceptor = BillingInterceptor.install({
//!     debug: true,
//!     tokenizationTimeoutMs: 30000,
//! });
//! ```

use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::InterceptError;

/// Configuration for one interceptor instance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptorConfig {
    /// Hidden input holding the Stripe publishable key.
    pub pub_key_field: String,
    /// Hidden input holding the id of the Stripe payment processor.
    pub processor_id_field: String,
    /// Class of the alternate (webform) template's form.
    pub alternate_form_class: String,
    /// Primary submit control in the native template.
    pub native_submit_selector: String,
    /// Primary submit control in the alternate template.
    pub alternate_submit_selector: String,
    /// Radio group name used by the native template.
    pub native_processor_radio: String,
    /// Radio group name used by the alternate template.
    pub alternate_processor_radio: String,
    /// Wrapper present when the native template offers a processor choice.
    pub processor_section_class: String,
    /// Single-select processor control (back-office forms).
    pub processor_select_field: String,
    /// Alternate template container hidden when nothing is payable.
    pub payment_block_field: String,

    pub card_number_field: String,
    pub cvv_field: String,
    /// Dedicated token input, when the template renders one.
    pub token_field: String,
    pub exp_month_field: String,
    pub exp_year_field: String,
    pub first_name_field: String,
    pub last_name_field: String,
    pub postal_code_field: String,
    pub discount_code_field: String,

    /// Class carried by every error banner the interceptor renders.
    pub banner_class: String,
    /// Label shown on the submit control while a token is pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_label: Option<String>,
    pub duplicate_warning: String,

    pub stripe_js_url: String,
    /// Regular expressions for ajax URLs after which the payment block has
    /// been replaced. Unanchored, so they match anywhere in the URL.
    pub reload_url_patterns: Vec<String>,
    /// Give up on the provider after this long. `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenization_timeout_ms: Option<u32>,
    pub debug: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            pub_key_field: "stripe-pub-key".into(),
            processor_id_field: "stripe-id".into(),
            alternate_form_class: "webform-client-form".into(),
            native_submit_selector: "[type=\"submit\"].validate".into(),
            alternate_submit_selector: "[type=\"submit\"].webform-submit".into(),
            native_processor_radio: "payment_processor_id".into(),
            alternate_processor_radio:
                "submitted[civicrm_1_contribution_1_contribution_payment_processor_id]".into(),
            processor_section_class: "payment_processor-section".into(),
            processor_select_field: "payment_processor_id".into(),
            payment_block_field: "billing-payment-block".into(),
            card_number_field: "credit_card_number".into(),
            cvv_field: "cvv2".into(),
            token_field: "stripe-token".into(),
            exp_month_field: "credit_card_exp_date_M".into(),
            exp_year_field: "credit_card_exp_date_Y".into(),
            first_name_field: "billing_first_name".into(),
            last_name_field: "billing_last_name".into(),
            postal_code_field: "billing_postal_code-5".into(),
            discount_code_field: "discountcode".into(),
            banner_class: "stripe-message".into(),
            processing_label: Some("Processing…".into()),
            duplicate_warning: "Form already submitted. Please wait.".into(),
            stripe_js_url: "https://js.stripe.com/v2/".into(),
            reload_url_patterns: vec![
                "/civicrm/payment/form?".into(),
                "/civicrm/contact/view/participant?".into(),
            ],
            tokenization_timeout_ms: None,
            debug: false,
        }
    }
}

impl InterceptorConfig {
    /// Read a config object handed over by the host page.
    /// `undefined` and `null` both mean "all defaults".
    pub fn from_js(value: JsValue) -> Result<Self, InterceptError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_wasm_bindgen::from_value(value)
            .map_err(|e| InterceptError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject reload patterns that are not valid regular expressions.
    pub fn validate(&self) -> Result<(), InterceptError> {
        for pattern in &self.reload_url_patterns {
            Regex::new(pattern).map_err(|e| {
                InterceptError::InvalidConfig(format!("reloadUrlPatterns `{pattern}`: {e}"))
            })?;
        }
        Ok(())
    }

    /// Whether an ajax completion for `url` means the payment block was swapped.
    pub fn is_reload_url(&self, url: &str) -> bool {
        self.reload_url_patterns.iter().any(|pattern| match Regex::new(pattern) {
            Ok(re) => re.is_match(url),
            Err(e) => {
                warn!("skipping reload pattern `{pattern}`: {e}");
                false
            }
        })
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn partial_object_keeps_defaults() {
        let cfg: InterceptorConfig = serde_json::from_str(
            r#"{ "cardNumberField": "cc", "tokenizationTimeoutMs": 5000, "debug": true }"#,
        )
        .unwrap();
        assert_eq!(cfg.card_number_field, "cc");
        assert_eq!(cfg.tokenization_timeout_ms, Some(5000));
        assert_eq!(cfg.cvv_field, "cvv2");
        assert_eq!(cfg.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn reload_urls_match_payment_block_swaps_only() {
        let cfg = InterceptorConfig::default();
        assert!(cfg.is_reload_url("/civicrm/payment/form?formName=Main&processor_id=3"));
        assert!(cfg.is_reload_url("https://x.org/civicrm/contact/view/participant?reset=1"));
        assert!(!cfg.is_reload_url("/civicrm/ajax/rest?entity=Contact"));
    }

    #[rstest]
    #[case("/civicrm/payment/form", true)]
    #[case("/civicrm/payment/form?formName=Main", true)]
    #[case("https://x.org/civicrm/contact/view/participant", true)]
    #[case("/civicrm/contact/view/participant?reset=1&cid=2", true)]
    #[case("/civicrm/payment/for", true)]
    #[case("/civicrm/contribute/transact?reset=1", false)]
    fn reload_patterns_are_regular_expressions(#[case] url: &str, #[case] reload: bool) {
        assert_eq!(InterceptorConfig::default().is_reload_url(url), reload);
    }

    #[test]
    fn malformed_reload_pattern_is_rejected() {
        let cfg = InterceptorConfig {
            reload_url_patterns: vec!["/civicrm/(payment".into()],
            ..InterceptorConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(InterceptError::InvalidConfig(_))));
        assert!(!cfg.is_reload_url("/civicrm/(payment"));
        assert!(InterceptorConfig::default().validate().is_ok());
    }
}
