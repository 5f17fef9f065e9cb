//! stripe_billing_intercept/src/interceptor.rs
//!
//! The handle the host page holds: one per page, owning the current binding.
//!
//! # Usage
//! ```js
//! import init, { BillingInterceptor } from "./stripe_billing_intercept.js";
//!
//! await init();
//! const interceptor = BillingInterceptor.install({ debug: true });
//! jQuery(document).ajaxComplete((event, xhr, settings) => {
//!     interceptor.onAjaxComplete(settings.url);
//! });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::client::{StripeJsTokenizer, Tokenizer};
use crate::config::InterceptorConfig;
use crate::controller::SubmitController;
use crate::dom::BillingForm;
use crate::interop::ensure_stripe_js;
use crate::locator::{locate, prepare};
use crate::logger::setup_console_logger;
use crate::processor::{sync_publishable_key, CrmApiDirectory, ProcessorDirectory};
use crate::web::{bind, Listener, SharedController, WebForm, WebPage};

struct Binding {
    controller: SharedController,
    // Dropping these detaches every handler of this binding.
    _listeners: Vec<Listener>,
}

/// Everything one page's interceptor owns. Shared with the processor
/// lookup, which rebinds once the API has answered.
struct Installation {
    config: InterceptorConfig,
    tokenizer: Rc<dyn Tokenizer>,
    directory: Rc<dyn ProcessorDirectory>,
    binding: Option<Binding>,
}

impl Installation {
    fn rebind(&mut self) {
        if let Some(old) = self.binding.take() {
            old.controller.borrow_mut().abandon();
        }

        let mut ctx = match locate(&WebPage, &self.config) {
            Ok(ctx) => ctx,
            Err(e) => {
                debug!("{e}");
                return;
            }
        };

        if let Some(key) = ctx.form.field_value(&self.config.pub_key_field) {
            if !key.trim().is_empty() {
                if let Err(e) = ensure_stripe_js(&self.config.stripe_js_url, &key) {
                    warn!("{e}");
                }
            }
        }

        prepare(&mut ctx, &self.config);
        let controller = Rc::new(RefCell::new(SubmitController::new(ctx, self.config.clone())));
        match bind(&controller, self.tokenizer.clone()) {
            Ok(listeners) => {
                self.binding = Some(Binding {
                    controller,
                    _listeners: listeners,
                });
            }
            Err(e) => warn!("{e}"),
        }
    }

    fn bound_form(&self) -> Option<WebForm> {
        self.binding
            .as_ref()
            .map(|b| b.controller.borrow().context().form.clone())
    }
}

/// Submission interceptor for the page's billing form.
#[wasm_bindgen]
pub struct BillingInterceptor {
    inner: Rc<RefCell<Installation>>,
}

#[wasm_bindgen]
impl BillingInterceptor {
    /// Read `config`, load Stripe.js and bind to the billing form.
    ///
    /// A page without a billing form is fine: the handle stays unbound.
    /// Only a malformed `config` is reported to the caller.
    pub fn install(config: JsValue) -> Result<BillingInterceptor, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        let config = InterceptorConfig::from_js(config)?;
        setup_console_logger(config.log_level());

        let mut installation = Installation {
            config,
            tokenizer: Rc::new(StripeJsTokenizer),
            directory: Rc::new(CrmApiDirectory),
            binding: None,
        };
        installation.rebind();
        Ok(BillingInterceptor {
            inner: Rc::new(RefCell::new(installation)),
        })
    }

    /// Host hook for jQuery's `ajaxComplete`: rebind when the payment block
    /// has been swapped.
    ///
    /// When the back-office processor select now names another processor,
    /// its publishable key is looked up and the form is bound once more
    /// after the answer.
    #[wasm_bindgen(js_name = onAjaxComplete)]
    pub fn on_ajax_complete(&self, url: &str) {
        if !self.inner.borrow().config.is_reload_url(url) {
            return;
        }
        debug!("payment block reloaded by {url}");
        self.inner.borrow_mut().rebind();

        let (form, directory, config) = {
            let inner = self.inner.borrow();
            let Some(form) = inner.bound_form() else { return };
            (form, inner.directory.clone(), inner.config.clone())
        };
        let inner = self.inner.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match sync_publishable_key(&form, &*directory, &config).await {
                Ok(true) => inner.borrow_mut().rebind(),
                Ok(false) => {}
                Err(e) => warn!("{e}"),
            }
        });
    }

    /// Tear down the current binding and bind again from scratch.
    pub fn rebind(&self) {
        self.inner.borrow_mut().rebind();
    }

    #[wasm_bindgen(js_name = isBound)]
    pub fn is_bound(&self) -> bool {
        self.inner.borrow().binding.is_some()
    }

    #[wasm_bindgen(js_name = isSubmitted)]
    pub fn is_submitted(&self) -> bool {
        self.inner
            .borrow()
            .binding
            .as_ref()
            .is_some_and(|b| b.controller.borrow().context().state.submitted)
    }
}
