//! stripe_billing_intercept/src/locator.rs
//!
//! Form Locator: finds the billing form and its primary submit control.
//!
//! A `FormContext` is built fresh on every (re)bind and owns all per-form
//! mutable state; nothing survives a rebind.

use log::debug;

use crate::config::InterceptorConfig;
use crate::dom::{BillingForm, BillingPage, Template};
use crate::error::InterceptError;
use crate::guard::SubmissionState;
use crate::sanitizer;

/// The resolved billing form for one binding.
#[derive(Debug)]
pub struct FormContext<F> {
    pub form: F,
    pub submit_selector: String,
    pub template: Template,
    pub state: SubmissionState,
    /// Submit label captured by `ui::lock`, restored by `ui::unlock`.
    pub(crate) saved_label: Option<String>,
    /// Inline `onclick` stashed at bind time; put back before any resubmit.
    pub(crate) inline_onclick: Option<String>,
}

impl<F: BillingForm> FormContext<F> {
    pub fn is_alternate_template(&self) -> bool {
        self.template == Template::Alternate
    }

    /// Give the submit control its inline `onclick` back before the form
    /// leaves the page through any path.
    pub fn restore_inline_onclick(&self) {
        if let Some(onclick) = &self.inline_onclick {
            self.form.restore_inline_onclick(&self.submit_selector, onclick);
        }
    }
}

/// Resolve the billing form: the form holding the publishable-key marker,
/// falling back to the alternate template's form class.
pub fn locate<P: BillingPage>(
    page: &P,
    config: &InterceptorConfig,
) -> Result<FormContext<P::Form>, InterceptError> {
    let template = if page.has_class(&config.alternate_form_class) {
        Template::Alternate
    } else {
        Template::Native
    };

    let form = page
        .form_containing(&config.pub_key_field)
        .or_else(|| match template {
            Template::Alternate => page.form_with_class(&config.alternate_form_class),
            Template::Native => None,
        })
        .ok_or_else(|| {
            debug!("no billing form");
            InterceptError::FormNotFound
        })?;

    let submit_selector = match template {
        Template::Native => config.native_submit_selector.clone(),
        Template::Alternate => config.alternate_submit_selector.clone(),
    };
    if !form.has_control(&submit_selector) {
        debug!("billing form has no `{submit_selector}`");
        return Err(InterceptError::SubmitControlNotFound);
    }

    Ok(FormContext {
        form,
        submit_selector,
        template,
        state: SubmissionState::default(),
        saved_label: None,
        inline_onclick: None,
    })
}

/// One-time DOM preparation after `locate`, before handlers are attached.
pub fn prepare<F: BillingForm>(ctx: &mut FormContext<F>, config: &InterceptorConfig) {
    ctx.inline_onclick = ctx.form.take_inline_onclick(&ctx.submit_selector);

    match ctx.template {
        Template::Alternate => {
            // Back/next routing on webforms reads the clicked button from `op`.
            ctx.form.ensure_hidden_input("action", "op");
            ctx.form.hide("#billingcheckbox");
            ctx.form.hide("label[for=\"billingcheckbox\"]");
        }
        Template::Native => {
            // The card-number field carries the token, so it must start empty.
            sanitizer::clear(&ctx.form, config);
        }
    }
}
