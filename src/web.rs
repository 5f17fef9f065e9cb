//! stripe_billing_intercept/src/web.rs
//!
//! web-sys implementation of the DOM boundary, plus the event listeners that
//! feed a `SubmitController`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, EventTarget, HtmlButtonElement, HtmlElement, HtmlFormElement,
    HtmlInputElement, HtmlSelectElement, KeyboardEvent, Node, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition, SubmitEvent,
};
use yew::AppHandle;

use crate::bindings::jquery;
use crate::client::{with_timeout, Tokenizer};
use crate::components::{ErrorBanner, ErrorBannerProps};
use crate::controller::{SubmitController, SubmitDecision};
use crate::dom::{BillingForm, BillingPage};
use crate::error::{js_to_dom_error, InterceptError};
use crate::guard::TriggerControl;

/// Quote a value for use inside a CSS attribute selector.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn elements(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        warn!("bad selector `{selector}`");
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn value_of(el: &Element) -> Option<String> {
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        Some(input.value())
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        Some(select.value())
    } else if let Some(button) = el.dyn_ref::<HtmlButtonElement>() {
        Some(button.value())
    } else {
        el.get_attribute("value")
    }
}

/// The host page's `document`.
#[derive(Clone, Debug, Default)]
pub struct WebPage;

impl BillingPage for WebPage {
    type Form = WebForm;

    fn form_containing(&self, field_id: &str) -> Option<WebForm> {
        gloo_utils::document()
            .get_element_by_id(field_id)?
            .closest("form")
            .ok()??
            .dyn_into::<HtmlFormElement>()
            .ok()
            .map(WebForm::new)
    }

    fn form_with_class(&self, class: &str) -> Option<WebForm> {
        gloo_utils::document()
            .query_selector(&format!("form.{class}"))
            .ok()??
            .dyn_into::<HtmlFormElement>()
            .ok()
            .map(WebForm::new)
    }

    fn has_class(&self, class: &str) -> bool {
        matches!(gloo_utils::document().query_selector(&format!(".{class}")), Ok(Some(_)))
    }
}

/// What the host's jQuery Validation plugin says about `form`, or `None`
/// when jQuery or the plugin is not on the page.
fn host_validation(form: &HtmlFormElement) -> Option<bool> {
    jquery(form).and_then(|q| q.valid()).ok()?.as_bool()
}

/// Error banner apps mounted into a form. Unmounted on drop.
#[derive(Default)]
struct MountedBanners(Vec<AppHandle<ErrorBanner>>);

impl MountedBanners {
    fn unmount_all(&mut self) {
        for app in self.0.drain(..) {
            app.destroy();
        }
    }
}

impl Drop for MountedBanners {
    fn drop(&mut self) {
        self.unmount_all();
    }
}

/// A billing `<form>` in the live DOM.
#[derive(Clone)]
pub struct WebForm {
    form: HtmlFormElement,
    banners: Rc<RefCell<MountedBanners>>,
}

impl fmt::Debug for WebForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebForm")
            .field("form", &self.form)
            .field("banners", &self.mounted_banners())
            .finish()
    }
}

impl WebForm {
    pub fn new(form: HtmlFormElement) -> Self {
        Self {
            form,
            banners: Rc::default(),
        }
    }

    pub fn element(&self) -> &HtmlFormElement {
        &self.form
    }

    /// Number of error banner apps currently mounted by this form.
    pub fn mounted_banners(&self) -> usize {
        self.banners.borrow().0.len()
    }

    /// Element with `id`, only if it lives inside this form.
    fn by_id(&self, id: &str) -> Option<Element> {
        gloo_utils::document()
            .get_element_by_id(id)
            .filter(|el| self.form.contains(Some::<&Node>(el)))
    }

    fn control(&self, selector: &str) -> Option<Element> {
        self.form.query_selector(selector).ok().flatten()
    }
}

impl BillingForm for WebForm {
    fn field_value(&self, id: &str) -> Option<String> {
        self.by_id(id).and_then(|el| value_of(&el))
    }

    fn set_field_value(&self, id: &str, value: &str) {
        let Some(el) = self.by_id(id) else { return };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else if let Err(e) = el.set_attribute("value", value) {
            warn!("{}", js_to_dom_error(e));
        }
    }

    fn has_radio_group(&self, name: &str) -> bool {
        !elements(&self.form, &format!("input[type=\"radio\"][name={}]", quoted(name))).is_empty()
    }

    fn checked_radio(&self, name: &str) -> Option<String> {
        let selector = format!("input[type=\"radio\"][name={}]:checked", quoted(name));
        self.control(&selector).and_then(|el| value_of(&el))
    }

    fn has_section(&self, class: &str) -> bool {
        self.control(&format!(".{class}")).is_some()
    }

    fn is_hidden(&self, id: &str) -> bool {
        gloo_utils::document()
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .is_some_and(|el| el.offset_parent().is_none())
    }

    fn is_valid(&self) -> bool {
        host_validation(&self.form).unwrap_or_else(|| self.form.check_validity())
    }

    fn has_control(&self, selector: &str) -> bool {
        self.control(selector).is_some()
    }

    fn control_label(&self, selector: &str) -> Option<String> {
        let el = self.control(selector)?;
        match el.dyn_ref::<HtmlInputElement>() {
            Some(input) => Some(input.value()),
            None => el.text_content(),
        }
    }

    fn set_control_label(&self, selector: &str, label: &str) {
        let Some(el) = self.control(selector) else { return };
        match el.dyn_ref::<HtmlInputElement>() {
            Some(input) => input.set_value(label),
            None => el.set_text_content(Some(label)),
        }
    }

    fn control_disabled(&self, selector: &str) -> bool {
        self.control(selector).is_some_and(|el| el.has_attribute("disabled"))
    }

    fn set_control_disabled(&self, selector: &str, disabled: bool) {
        let Some(el) = self.control(selector) else { return };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if let Some(button) = el.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if disabled {
            let _ = el.set_attribute("disabled", "disabled");
        } else {
            let _ = el.remove_attribute("disabled");
        }
    }

    fn take_inline_onclick(&self, selector: &str) -> Option<String> {
        let el = self.control(selector)?;
        let onclick = el.get_attribute("onclick")?;
        let _ = el.remove_attribute("onclick");
        Some(onclick)
    }

    fn restore_inline_onclick(&self, selector: &str, onclick: &str) {
        if let Some(el) = self.control(selector) {
            let _ = el.set_attribute("onclick", onclick);
        }
    }

    fn remove_banners(&self, class: &str) -> usize {
        self.banners.borrow_mut().unmount_all();
        let banners = elements(&self.form, &format!(".{class}"));
        for banner in &banners {
            banner.remove();
        }
        banners.len()
    }

    fn show_banner(&self, class: &str, message: &str) {
        let host = match gloo_utils::document().create_element("div") {
            Ok(host) => host,
            Err(e) => return warn!("{}", js_to_dom_error(e)),
        };
        host.set_class_name(class);
        if let Err(e) = self.form.prepend_with_node_1(&host) {
            return warn!("{}", js_to_dom_error(e));
        }

        let app = yew::Renderer::<ErrorBanner>::with_root_and_props(
            host.clone(),
            ErrorBannerProps {
                message: message.to_string(),
            },
        )
        .render();
        self.banners.borrow_mut().0.push(app);

        let opts = ScrollIntoViewOptions::new();
        opts.set_behavior(ScrollBehavior::Smooth);
        opts.set_block(ScrollLogicalPosition::Start);
        host.scroll_into_view_with_scroll_into_view_options(&opts);
    }

    fn warn_user(&self, message: &str) {
        if let Err(e) = gloo_utils::window().alert_with_message(message) {
            warn!("{}", js_to_dom_error(e));
        }
    }

    fn ensure_hidden_input(&self, id: &str, name: &str) {
        if self.by_id(id).is_some() {
            return;
        }
        let created = gloo_utils::document()
            .create_element("input")
            .and_then(|el| {
                el.set_attribute("type", "hidden")?;
                el.set_attribute("name", name)?;
                el.set_id(id);
                self.form.append_child(&el)
            });
        if let Err(e) = created {
            warn!("{}", js_to_dom_error(e));
        }
    }

    fn hide(&self, selector: &str) {
        for el in elements(&self.form, selector) {
            if let Some(el) = el.dyn_ref::<HtmlElement>() {
                let _ = el.style().set_property("display", "none");
            }
        }
    }

    fn submit_programmatically(&self) -> Result<(), InterceptError> {
        gloo_utils::window().set_onbeforeunload(None);
        self.form.submit().map_err(js_to_dom_error)
    }
}

/// Which control fired a `submit` event.
pub fn trigger_of(submitter: Option<&Element>) -> TriggerControl {
    let Some(el) = submitter else {
        return TriggerControl::Primary;
    };
    let classes = el.class_list();
    if el.has_attribute("formnovalidate") {
        TriggerControl::SkipValidation
    } else if classes.contains("cancel") {
        TriggerControl::Cancel
    } else if classes.contains("webform-previous") {
        TriggerControl::PreviousPage
    } else {
        TriggerControl::Primary
    }
}

/// An attached DOM listener, detached on drop.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn attach(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, InterceptError> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(js_to_dom_error)?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

pub type SharedController = Rc<RefCell<SubmitController<WebForm>>>;

/// Act on a classification made inside an event handler.
fn dispatch(
    controller: &SharedController,
    tokenizer: &Rc<dyn Tokenizer>,
    event: &Event,
    decision: SubmitDecision,
) {
    match decision {
        SubmitDecision::Native => {}
        SubmitDecision::Drop => event.prevent_default(),
        SubmitDecision::Tokenize { attempt, request } => {
            event.prevent_default();
            let call = tokenizer.request_token(request);
            let timeout = controller.borrow().config().tokenization_timeout_ms;
            let controller = controller.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = with_timeout(call, timeout).await;
                let outcome = controller.borrow_mut().complete(attempt, result);
                debug!("tokenization finished: {outcome:?}");
            });
        }
    }
}

/// Attach every handler the interception flow needs to `form`.
pub fn bind(
    controller: &SharedController,
    tokenizer: Rc<dyn Tokenizer>,
) -> Result<Vec<Listener>, InterceptError> {
    let (form, alternate, discount_field) = {
        let c = controller.borrow();
        (
            c.context().form.element().clone(),
            c.context().is_alternate_template(),
            c.config().discount_code_field.clone(),
        )
    };
    let mut listeners = Vec::new();

    {
        let controller = controller.clone();
        let tokenizer = tokenizer.clone();
        listeners.push(Listener::attach(&form, "submit", move |event: Event| {
            let submitter = event
                .dyn_ref::<SubmitEvent>()
                .and_then(SubmitEvent::submitter)
                .map(Element::from);
            if let Some(value) = submitter.as_ref().and_then(value_of) {
                controller.borrow().record_submit_value(&value);
            }
            let decision = controller
                .borrow_mut()
                .handle_submit(trigger_of(submitter.as_ref()));
            dispatch(&controller, &tokenizer, &event, decision);
        })?);
    }

    let skip_selector = "[type=\"submit\"][formnovalidate], [type=\"submit\"].cancel, \
                         [type=\"submit\"].webform-previous";
    for control in elements(&form, skip_selector) {
        let controller = controller.clone();
        listeners.push(Listener::attach(&control, "click", move |_| {
            controller.borrow_mut().note_non_payment_click();
        })?);
    }

    if let Some(discount) = WebForm::new(form.clone()).by_id(&discount_field) {
        let controller = controller.clone();
        listeners.push(Listener::attach(&discount, "keydown", move |event: Event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                controller.borrow_mut().note_discount_key(&key.key());
            }
        })?);
    }

    if alternate {
        // Enter anywhere in a webform goes through the payment submit path,
        // not through whichever submit control happens to come first.
        let controller = controller.clone();
        listeners.push(Listener::attach(&form, "keydown", move |event: Event| {
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else { return };
            let in_textarea = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .is_some_and(|el| el.tag_name().eq_ignore_ascii_case("textarea"));
            if key.key() != "Enter" || in_textarea {
                return;
            }
            event.prevent_default();
            let decision = controller.borrow_mut().handle_submit(TriggerControl::Primary);
            if decision == SubmitDecision::Native {
                if let Err(e) = controller.borrow().context().form.submit_programmatically() {
                    warn!("{e}");
                }
                return;
            }
            dispatch(&controller, &tokenizer, &event, decision);
        })?);
    }

    debug!("bound {} listeners", listeners.len());
    Ok(listeners)
}
