//! stripe_billing_intercept/src/dom.rs
//!
//! The read/write boundary between the interception logic and the host page.
//!
//! Logic modules only ever talk to a `BillingPage`/`BillingForm`; the browser
//! implementation lives in `web.rs` and an in-memory one backs the unit tests.
//! Fields are addressed by element id, radio groups by `name`, and controls by
//! CSS selector scoped to the form.

use crate::error::InterceptError;

/// The two hosting templates a billing form may be rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    /// Contribution/event pages rendered by CiviCRM itself.
    Native,
    /// Drupal webform wrapping the CiviCRM billing block.
    Alternate,
}

/// Document-level lookups used by the Form Locator.
pub trait BillingPage {
    type Form: BillingForm;

    /// The `<form>` that contains the element with id `field_id`.
    fn form_containing(&self, field_id: &str) -> Option<Self::Form>;

    /// The first `<form>` carrying `class`.
    fn form_with_class(&self, class: &str) -> Option<Self::Form>;

    /// Whether any element on the page carries `class`.
    fn has_class(&self, class: &str) -> bool;
}

/// A located billing form.
pub trait BillingForm {
    /// Value of the field with id `id`, `None` if the field is absent.
    fn field_value(&self, id: &str) -> Option<String>;

    fn set_field_value(&self, id: &str, value: &str);

    fn has_field(&self, id: &str) -> bool {
        self.field_value(id).is_some()
    }

    /// Whether any radio input named `name` exists in the form.
    fn has_radio_group(&self, name: &str) -> bool;

    /// Value of the checked radio named `name`.
    fn checked_radio(&self, name: &str) -> Option<String>;

    /// Whether an element carrying `class` exists inside the form.
    fn has_section(&self, class: &str) -> bool;

    /// Whether the element with id `id` is present but not displayed.
    fn is_hidden(&self, id: &str) -> bool;

    /// The host's own client-side validation predicate.
    fn is_valid(&self) -> bool;

    fn has_control(&self, selector: &str) -> bool;

    fn control_label(&self, selector: &str) -> Option<String>;

    fn set_control_label(&self, selector: &str, label: &str);

    fn control_disabled(&self, selector: &str) -> bool;

    fn set_control_disabled(&self, selector: &str, disabled: bool);

    /// Remove and return the inline `onclick` attribute of a control.
    fn take_inline_onclick(&self, selector: &str) -> Option<String>;

    fn restore_inline_onclick(&self, selector: &str, onclick: &str);

    /// Remove every banner carrying `class`; returns how many were removed.
    fn remove_banners(&self, class: &str) -> usize;

    /// Prepend an error banner to the form and scroll it into view.
    fn show_banner(&self, class: &str, message: &str);

    /// Blocking user notice (duplicate submission).
    fn warn_user(&self, message: &str);

    /// Make sure a hidden input exists, creating it when missing.
    fn ensure_hidden_input(&self, id: &str, name: &str);

    /// Hide every element matching `selector` inside the form.
    fn hide(&self, selector: &str);

    /// Submit without dispatching a `submit` event, so no handler of ours
    /// runs again.
    fn submit_programmatically(&self) -> Result<(), InterceptError>;
}
