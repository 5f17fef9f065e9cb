//! stripe_billing_intercept/src/ui.rs
//!
//! UI State Controller: the submit control's locked/unlocked state and the
//! tokenization error banner.

use crate::config::InterceptorConfig;
use crate::dom::BillingForm;
use crate::locator::FormContext;

/// Disable the submit control and show the processing label.
///
/// The current label is captured once; a second `lock` before `unlock`
/// keeps the original.
pub fn lock<F: BillingForm>(ctx: &mut FormContext<F>, config: &InterceptorConfig) {
    let selector = ctx.submit_selector.as_str();
    if ctx.saved_label.is_none() {
        ctx.saved_label = ctx.form.control_label(selector);
    }
    ctx.form.set_control_disabled(selector, true);
    if let Some(label) = &config.processing_label {
        ctx.form.set_control_label(selector, label);
    }
}

/// Re-enable the submit control, restore its label and, with a message,
/// replace whatever tokenization banner is showing.
pub fn unlock<F: BillingForm>(
    ctx: &mut FormContext<F>,
    config: &InterceptorConfig,
    message: Option<&str>,
) {
    let selector = ctx.submit_selector.as_str();
    ctx.form.set_control_disabled(selector, false);
    if let Some(label) = ctx.saved_label.take() {
        ctx.form.set_control_label(selector, &label);
    }

    if let Some(message) = message {
        ctx.form.remove_banners(&config.banner_class);
        ctx.form.show_banner(&config.banner_class, message);
    }
}
