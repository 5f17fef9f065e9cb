//! In-memory `BillingPage`/`BillingForm` for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::InterceptorConfig;
use crate::dom::{BillingForm, BillingPage};
use crate::error::InterceptError;

pub const RAW_PAN: &str = "4242424242424242";
pub const RAW_CVV: &str = "123";
pub const STRIPE_PROCESSOR: &str = "3";

#[derive(Clone, Debug, Default)]
pub struct FakeControl {
    pub label: String,
    pub disabled: bool,
    pub onclick: Option<String>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub fields: HashMap<String, String>,
    pub radios: HashMap<String, Vec<(String, bool)>>,
    pub sections: HashSet<String>,
    pub hidden: HashSet<String>,
    pub invalid: bool,
    pub controls: HashMap<String, FakeControl>,
    pub banners: Vec<(String, String)>,
    pub warnings: Vec<String>,
    pub hidden_selectors: Vec<String>,
    pub submissions: usize,
}

/// Cloning shares the underlying state, so a test keeps a handle on what
/// the controller mutates.
#[derive(Clone, Debug, Default)]
pub struct FakeForm(pub Rc<RefCell<FakeState>>);

impl FakeForm {
    fn filled(submit_selector: &str) -> Self {
        let cfg = InterceptorConfig::default();
        let form = FakeForm::default();
        {
            let mut s = form.0.borrow_mut();
            for (id, value) in [
                (cfg.pub_key_field.as_str(), "pk_test_abc"),
                (cfg.processor_id_field.as_str(), STRIPE_PROCESSOR),
                (cfg.card_number_field.as_str(), RAW_PAN),
                (cfg.cvv_field.as_str(), RAW_CVV),
                (cfg.exp_month_field.as_str(), "12"),
                (cfg.exp_year_field.as_str(), "2030"),
                (cfg.first_name_field.as_str(), "Ada"),
                (cfg.last_name_field.as_str(), "Lovelace"),
                (cfg.postal_code_field.as_str(), "90210"),
            ] {
                s.fields.insert(id.to_string(), value.to_string());
            }
            s.controls.insert(
                submit_selector.to_string(),
                FakeControl {
                    label: "Confirm Contribution".into(),
                    disabled: false,
                    onclick: Some("return trackSubmit();".into()),
                },
            );
        }
        form
    }

    pub fn native() -> Self {
        Self::filled(&InterceptorConfig::default().native_submit_selector)
    }

    pub fn alternate() -> Self {
        Self::filled(&InterceptorConfig::default().alternate_submit_selector)
    }

    pub fn with_field(self, id: &str, value: &str) -> Self {
        self.0.borrow_mut().fields.insert(id.into(), value.into());
        self
    }

    pub fn without_field(self, id: &str) -> Self {
        self.0.borrow_mut().fields.remove(id);
        self
    }

    pub fn with_radio(self, name: &str, options: &[(&str, bool)]) -> Self {
        self.0.borrow_mut().radios.insert(
            name.into(),
            options.iter().map(|(v, c)| (v.to_string(), *c)).collect(),
        );
        self
    }

    pub fn with_section(self, class: &str) -> Self {
        self.0.borrow_mut().sections.insert(class.into());
        self
    }

    pub fn with_hidden(self, id: &str) -> Self {
        self.0.borrow_mut().hidden.insert(id.into());
        self
    }

    pub fn invalid(self) -> Self {
        self.0.borrow_mut().invalid = true;
        self
    }

    pub fn set_invalid(&self, invalid: bool) {
        self.0.borrow_mut().invalid = invalid;
    }

    pub fn select_radio(&self, name: &str, value: &str) {
        if let Some(options) = self.0.borrow_mut().radios.get_mut(name) {
            for (v, checked) in options.iter_mut() {
                *checked = v == value;
            }
        }
    }

    pub fn field(&self, id: &str) -> Option<String> {
        self.0.borrow().fields.get(id).cloned()
    }

    pub fn control(&self, selector: &str) -> FakeControl {
        self.0.borrow().controls.get(selector).cloned().unwrap_or_default()
    }

    pub fn banners(&self) -> Vec<String> {
        self.0.borrow().banners.iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.0.borrow().warnings.clone()
    }

    pub fn submissions(&self) -> usize {
        self.0.borrow().submissions
    }

    /// Every value currently held by any field.
    pub fn all_values(&self) -> Vec<String> {
        self.0.borrow().fields.values().cloned().collect()
    }
}

impl BillingForm for FakeForm {
    fn field_value(&self, id: &str) -> Option<String> {
        self.field(id)
    }

    fn set_field_value(&self, id: &str, value: &str) {
        if let Some(v) = self.0.borrow_mut().fields.get_mut(id) {
            *v = value.to_string();
        }
    }

    fn has_radio_group(&self, name: &str) -> bool {
        self.0.borrow().radios.contains_key(name)
    }

    fn checked_radio(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .radios
            .get(name)
            .and_then(|opts| opts.iter().find(|(_, c)| *c).map(|(v, _)| v.clone()))
    }

    fn has_section(&self, class: &str) -> bool {
        self.0.borrow().sections.contains(class)
    }

    fn is_hidden(&self, id: &str) -> bool {
        self.0.borrow().hidden.contains(id)
    }

    fn is_valid(&self) -> bool {
        !self.0.borrow().invalid
    }

    fn has_control(&self, selector: &str) -> bool {
        self.0.borrow().controls.contains_key(selector)
    }

    fn control_label(&self, selector: &str) -> Option<String> {
        self.0.borrow().controls.get(selector).map(|c| c.label.clone())
    }

    fn set_control_label(&self, selector: &str, label: &str) {
        if let Some(c) = self.0.borrow_mut().controls.get_mut(selector) {
            c.label = label.to_string();
        }
    }

    fn control_disabled(&self, selector: &str) -> bool {
        self.0.borrow().controls.get(selector).is_some_and(|c| c.disabled)
    }

    fn set_control_disabled(&self, selector: &str, disabled: bool) {
        if let Some(c) = self.0.borrow_mut().controls.get_mut(selector) {
            c.disabled = disabled;
        }
    }

    fn take_inline_onclick(&self, selector: &str) -> Option<String> {
        self.0
            .borrow_mut()
            .controls
            .get_mut(selector)
            .and_then(|c| c.onclick.take())
    }

    fn restore_inline_onclick(&self, selector: &str, onclick: &str) {
        if let Some(c) = self.0.borrow_mut().controls.get_mut(selector) {
            c.onclick = Some(onclick.to_string());
        }
    }

    fn remove_banners(&self, class: &str) -> usize {
        let mut s = self.0.borrow_mut();
        let before = s.banners.len();
        s.banners.retain(|(c, _)| c != class);
        before - s.banners.len()
    }

    fn show_banner(&self, class: &str, message: &str) {
        self.0
            .borrow_mut()
            .banners
            .insert(0, (class.to_string(), message.to_string()));
    }

    fn warn_user(&self, message: &str) {
        self.0.borrow_mut().warnings.push(message.to_string());
    }

    fn ensure_hidden_input(&self, id: &str, _name: &str) {
        self.0
            .borrow_mut()
            .fields
            .entry(id.to_string())
            .or_default();
    }

    fn hide(&self, selector: &str) {
        self.0.borrow_mut().hidden_selectors.push(selector.to_string());
    }

    fn submit_programmatically(&self) -> Result<(), InterceptError> {
        self.0.borrow_mut().submissions += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePage {
    /// Form found through the publishable-key marker.
    pub marker_form: Option<FakeForm>,
    /// Form found through the alternate template class.
    pub class_form: Option<FakeForm>,
    pub classes: HashSet<String>,
}

impl FakePage {
    pub fn native(form: FakeForm) -> Self {
        Self {
            marker_form: Some(form),
            ..Default::default()
        }
    }

    pub fn alternate(form: FakeForm) -> Self {
        let class = InterceptorConfig::default().alternate_form_class;
        Self {
            marker_form: Some(form.clone()),
            class_form: Some(form),
            classes: HashSet::from([class]),
        }
    }
}

impl BillingPage for FakePage {
    type Form = FakeForm;

    fn form_containing(&self, field_id: &str) -> Option<FakeForm> {
        self.marker_form
            .as_ref()
            .filter(|f| f.has_field(field_id))
            .cloned()
    }

    fn form_with_class(&self, class: &str) -> Option<FakeForm> {
        self.class_form
            .as_ref()
            .filter(|_| self.classes.contains(class))
            .cloned()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}
