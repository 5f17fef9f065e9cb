//! stripe_billing_intercept/src/selection.rs
//!
//! Processor Selection Resolver: decides whether the payment method the user
//! has chosen right now is the tokenizing processor.
//!
//! Nothing here is cached. The selection is read from the form on every
//! submit attempt because the user may switch processors between attempts.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::InterceptorConfig;
use crate::dom::{BillingForm, Template};
use crate::locator::FormContext;

/// A payment processor id as emitted by either template.
///
/// Native pages emit ids as numbers, webforms as strings. Equality is loose
/// across the two forms (`0 == "0"`) and strict between two strings, the
/// same way the host page's own scripts compare them. That makes it
/// deliberately non-transitive, so there is no `Eq`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessorId {
    Number(i64),
    Text(String),
}

impl ProcessorId {
    /// Option value `0` in the processor radio group.
    pub const PAY_LATER: ProcessorId = ProcessorId::Number(0);

    pub fn is_pay_later(&self) -> bool {
        *self == Self::PAY_LATER
    }

    fn as_number(&self) -> Option<i64> {
        match self {
            ProcessorId::Number(n) => Some(*n),
            ProcessorId::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl PartialEq for ProcessorId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ProcessorId::Text(a), ProcessorId::Text(b)) => a == b,
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<&str> for ProcessorId {
    fn from(value: &str) -> Self {
        ProcessorId::Text(value.to_string())
    }
}

impl From<i64> for ProcessorId {
    fn from(value: i64) -> Self {
        ProcessorId::Number(value)
    }
}

/// What the processor-choice control currently says.
#[derive(Clone, Debug, PartialEq)]
pub enum Chosen {
    /// The form offers no choice: the tokenizing processor is the only one.
    Fixed,
    /// A choice control exists but nothing is selected.
    Nothing,
    Selected(ProcessorId),
}

/// Snapshot of the user's processor choice for one submit attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorSelection {
    pub chosen: Chosen,
    pub target: Option<ProcessorId>,
}

impl ProcessorSelection {
    /// Read the choice control matching the template.
    pub fn read<F: BillingForm>(
        form: &F,
        template: Template,
        config: &InterceptorConfig,
    ) -> Self {
        let target = form
            .field_value(&config.processor_id_field)
            .map(ProcessorId::Text);

        let radio = match template {
            Template::Alternate => &config.alternate_processor_radio,
            Template::Native => &config.native_processor_radio,
        };
        let has_radio = form.has_radio_group(radio)
            || (template == Template::Native && form.has_section(&config.processor_section_class));

        let chosen = if has_radio {
            form.checked_radio(radio)
                .map_or(Chosen::Nothing, |v| Chosen::Selected(ProcessorId::Text(v)))
        } else if template == Template::Native {
            match form.field_value(&config.processor_select_field) {
                Some(v) if !v.is_empty() => Chosen::Selected(ProcessorId::Text(v)),
                Some(_) => Chosen::Nothing,
                None => Chosen::Fixed,
            }
        } else {
            Chosen::Fixed
        };

        Self { chosen, target }
    }
}

/// Why a submit event is left to the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassReason {
    NoCardField,
    NoPublishableKey,
    PaymentBlockHidden,
    PayLater,
    OtherProcessor,
    NotSelected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Intercept,
    PassThrough(PassReason),
}

/// Classify the current submit attempt.
pub fn classify<F: BillingForm>(
    ctx: &FormContext<F>,
    config: &InterceptorConfig,
) -> Classification {
    let verdict = classify_inner(ctx, config);
    match verdict {
        Classification::Intercept => debug!("Stripe is the selected payment processor"),
        Classification::PassThrough(reason) => debug!("not a Stripe submission: {reason:?}"),
    }
    verdict
}

fn classify_inner<F: BillingForm>(
    ctx: &FormContext<F>,
    config: &InterceptorConfig,
) -> Classification {
    use Classification::*;

    let form = &ctx.form;
    if !form.has_field(&config.card_number_field) {
        return PassThrough(PassReason::NoCardField);
    }
    if form
        .field_value(&config.pub_key_field)
        .map_or(true, |key| key.trim().is_empty())
    {
        return PassThrough(PassReason::NoPublishableKey);
    }
    if ctx.is_alternate_template() && form.is_hidden(&config.payment_block_field) {
        return PassThrough(PassReason::PaymentBlockHidden);
    }

    let selection = ProcessorSelection::read(form, ctx.template, config);
    match selection.chosen {
        Chosen::Fixed => Intercept,
        Chosen::Nothing => PassThrough(PassReason::NotSelected),
        Chosen::Selected(id) if id.is_pay_later() => PassThrough(PassReason::PayLater),
        Chosen::Selected(id) => match selection.target {
            Some(target) if target == id => Intercept,
            _ => PassThrough(PassReason::OtherProcessor),
        },
    }
}
