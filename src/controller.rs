//! stripe_billing_intercept/src/controller.rs
//!
//! The submission-interception state machine for one bound billing form.
//!
//! ```text
//! Idle ─submit─▶ classify ─PassThrough─▶ native submit
//!                   │
//!                Intercept ─▶ Locked/Pending ─Token─▶ Sanitized ─▶ Resubmitted
//!                                   │
//!                                Failure ─▶ Unlocked ─▶ Idle
//! ```
//!
//! `handle_submit` runs synchronously inside the submit handler. When it
//! returns `SubmitDecision::Tokenize` the caller cancels the event, issues the
//! tokenization call and later feeds its result to `complete`, which is the
//! only path that resubmits the form. Each pending call carries an attempt id
//! so a stale or repeated result is ignored.

use log::{debug, warn};

use crate::client::{TokenizationRequest, TokenizationResult};
use crate::config::InterceptorConfig;
use crate::dom::BillingForm;
use crate::guard::{self, Screen, TriggerControl};
use crate::locator::FormContext;
use crate::sanitizer;
use crate::selection::{classify, Classification};
use crate::ui;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending { attempt: u64 },
    /// Terminal for this page view.
    Resubmitted,
}

/// What the submit handler must do with the current event.
#[derive(Debug, PartialEq)]
pub enum SubmitDecision {
    /// Leave the event alone; the browser submits natively.
    Native,
    /// Cancel the event and do nothing else.
    Drop,
    /// Cancel the event and tokenize `request`, then call `complete(attempt, ..)`.
    Tokenize {
        attempt: u64,
        request: TokenizationRequest,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Resubmitted,
    Failed,
    /// Result for an attempt that is no longer pending.
    Ignored,
}

pub struct SubmitController<F> {
    ctx: FormContext<F>,
    config: InterceptorConfig,
    phase: Phase,
    attempts: u64,
}

impl<F: BillingForm> SubmitController<F> {
    pub fn new(ctx: FormContext<F>, config: InterceptorConfig) -> Self {
        Self {
            ctx,
            config,
            phase: Phase::Idle,
            attempts: 0,
        }
    }

    pub fn context(&self) -> &FormContext<F> {
        &self.ctx
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A control that must not trigger payment was clicked.
    pub fn note_non_payment_click(&mut self) {
        guard::note_non_payment(&mut self.ctx);
    }

    /// Key pressed in the discount-code field.
    pub fn note_discount_key(&mut self, key: &str) {
        guard::note_discount_key(&mut self.ctx, key);
    }

    /// Webforms route back/next on the value of the clicked submit control.
    pub fn record_submit_value(&self, value: &str) {
        if self.ctx.is_alternate_template() {
            self.ctx.form.set_field_value("action", value);
        }
    }

    /// Classify a submit event.
    pub fn handle_submit(&mut self, trigger: TriggerControl) -> SubmitDecision {
        debug!("submit handler");

        match guard::screen(&mut self.ctx, trigger, &self.config) {
            Screen::Duplicate => return SubmitDecision::Drop,
            Screen::NonPayment => return self.pass_through(),
            Screen::Continue => {}
        }
        if let Classification::PassThrough(_) = classify(&self.ctx, &self.config) {
            return self.pass_through();
        }
        if !guard::admit(&mut self.ctx) {
            return SubmitDecision::Drop;
        }

        ui::lock(&mut self.ctx, &self.config);
        self.attempts += 1;
        let attempt = self.attempts;
        self.phase = Phase::Pending { attempt };
        debug!("getting Stripe token (attempt {attempt})");

        SubmitDecision::Tokenize {
            attempt,
            request: TokenizationRequest::from_form(&self.ctx.form, &self.config),
        }
    }

    /// Resume the suspended submission with the tokenization result.
    pub fn complete(&mut self, attempt: u64, result: TokenizationResult) -> Completion {
        if self.phase != (Phase::Pending { attempt }) {
            debug!("ignoring result for attempt {attempt}, phase is {:?}", self.phase);
            return Completion::Ignored;
        }

        match result {
            TokenizationResult::Token(token) => {
                sanitizer::sanitize(&self.ctx.form, &self.config, Some(&token));
                self.ctx.restore_inline_onclick();
                match self.ctx.form.submit_programmatically() {
                    Ok(()) => {
                        self.phase = Phase::Resubmitted;
                        Completion::Resubmitted
                    }
                    Err(e) => {
                        warn!("resubmit failed: {e}");
                        // The raw values are gone; never leave a masked number behind.
                        sanitizer::sanitize(&self.ctx.form, &self.config, None);
                        self.fail(&e.to_string())
                    }
                }
            }
            TokenizationResult::Failure(err) => self.fail(&err.message),
        }
    }

    /// Drop an in-flight attempt, e.g. because the billing block is being
    /// re-rendered. A late result for it is then ignored.
    pub fn abandon(&mut self) {
        if let Phase::Pending { attempt } = self.phase {
            debug!("abandoning attempt {attempt}");
            sanitizer::sanitize(&self.ctx.form, &self.config, None);
            guard::release(&mut self.ctx);
            ui::unlock(&mut self.ctx, &self.config, None);
            self.phase = Phase::Idle;
        }
    }

    fn fail(&mut self, message: &str) -> Completion {
        guard::release(&mut self.ctx);
        ui::unlock(&mut self.ctx, &self.config, Some(message));
        self.phase = Phase::Idle;
        Completion::Failed
    }

    fn pass_through(&self) -> SubmitDecision {
        self.ctx.restore_inline_onclick();
        SubmitDecision::Native
    }
}
