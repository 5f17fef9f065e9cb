//! stripe_billing_intercept/src/guard.rs
//!
//! Submission Guard: the single-shot latch around a guarded submission and
//! the filter for submit actions that are not payments at all.

use log::debug;

use crate::config::InterceptorConfig;
use crate::dom::BillingForm;
use crate::locator::FormContext;

/// Per-form submission flags. Only the guard and the UI controller write it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmissionState {
    /// One-way latch; only an aborted tokenization resets it.
    pub submitted: bool,
    /// Set by a non-payment control or Enter in the discount field,
    /// consumed by the next submit classification.
    pub suppress_interception: bool,
}

/// The control that triggered a submit event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerControl {
    /// The primary submit control, or Enter pressed in the form.
    Primary,
    /// A control with the `cancel` class.
    Cancel,
    /// Webform "previous page".
    PreviousPage,
    /// Any control marked `formnovalidate` (discount codes, navigation).
    SkipValidation,
}

impl TriggerControl {
    pub fn is_non_payment(self) -> bool {
        !matches!(self, TriggerControl::Primary)
    }
}

/// Outcome of screening a submit event before classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Go on to processor classification.
    Continue,
    /// Not a payment submit; let the browser submit natively.
    NonPayment,
    /// A guarded submission is already in flight; drop this event.
    Duplicate,
}

/// A non-payment control was clicked.
pub fn note_non_payment<F>(ctx: &mut FormContext<F>) {
    debug!("adding submit-dont-process");
    ctx.state.suppress_interception = true;
}

/// A key was pressed in the discount-code field.
pub fn note_discount_key<F>(ctx: &mut FormContext<F>, key: &str) {
    if key == "Enter" {
        note_non_payment(ctx);
    }
}

/// Screen a submit event. Always consumes the suppression flag.
pub fn screen<F: BillingForm>(
    ctx: &mut FormContext<F>,
    trigger: TriggerControl,
    config: &InterceptorConfig,
) -> Screen {
    let suppressed = std::mem::take(&mut ctx.state.suppress_interception);

    if ctx.state.submitted {
        debug!("form already submitted");
        ctx.form.warn_user(&config.duplicate_warning);
        return Screen::Duplicate;
    }
    if suppressed || trigger.is_non_payment() {
        debug!("non-payment submit detected - not submitting payment");
        return Screen::NonPayment;
    }
    Screen::Continue
}

/// Close the latch if the host's validation passes.
pub fn admit<F: BillingForm>(ctx: &mut FormContext<F>) -> bool {
    if !ctx.form.is_valid() {
        debug!("host validation failed");
        return false;
    }
    ctx.state.submitted = true;
    true
}

/// Reopen the latch after an aborted tokenization.
pub fn release<F>(ctx: &mut FormContext<F>) {
    ctx.state.submitted = false;
}
