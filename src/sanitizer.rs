//! stripe_billing_intercept/src/sanitizer.rs
//!
//! Field Sanitizer: overwrites raw card data before the form leaves the page.
//!
//! The card-number field doubles as the token channel: it is the one input
//! every host submit pipeline posts. Templates that render a dedicated token
//! input get the token there instead, and the card-number field keeps a
//! masked last-four.

use crate::config::InterceptorConfig;
use crate::dom::BillingForm;

/// What the CVV field always holds after a successful tokenization.
pub const MASKED_CVV: &str = "000";
const MASKED_PAN_PREFIX: &str = "000000000000";

/// Apply a tokenization outcome to the card fields.
///
/// `Some(token)` carries the token and masks the raw values; `None` means
/// the attempt was abandoned and the raw values are wiped entirely.
/// Safe to call more than once with the same argument.
pub fn sanitize<F: BillingForm>(form: &F, config: &InterceptorConfig, token: Option<&str>) {
    match token {
        Some(token) => carry_token(form, config, token),
        None => clear(form, config),
    }
}

fn carry_token<F: BillingForm>(form: &F, config: &InterceptorConfig, token: &str) {
    if form.has_field(&config.token_field) {
        let masked = form
            .field_value(&config.card_number_field)
            .map(|raw| mask_card_number(&raw))
            .unwrap_or_default();
        form.set_field_value(&config.card_number_field, &masked);
        form.set_field_value(&config.token_field, token);
    } else {
        form.set_field_value(&config.card_number_field, token);
    }
    form.set_field_value(&config.cvv_field, MASKED_CVV);
}

/// Empty both raw card fields.
pub fn clear<F: BillingForm>(form: &F, config: &InterceptorConfig) {
    form.set_field_value(&config.card_number_field, "");
    form.set_field_value(&config.cvv_field, "");
}

/// Zero prefix plus the last four digits; never a valid card number.
pub fn mask_card_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().filter(char::is_ascii_digit).collect();
    let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("{MASKED_PAN_PREFIX}{last4}")
}
