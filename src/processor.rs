//! stripe_billing_intercept/src/processor.rs
//!
//! Processor switch on back-office forms.
//!
//! Offline credit card pages offer the processor as a single select. When
//! the user picks another one, the host reloads the billing block and the
//! publishable-key marker has to follow: the key of the newly selected
//! processor when it is a Stripe processor, blank otherwise. The key is
//! looked up through the CiviCRM API in two steps, first the id of the
//! Stripe processor type and then the processor's key of that type.
//!
//! # Example Usage
//! ```rust,ignore
//! wasm_bindgen_futures::spawn_local(async move {
//!     if sync_publishable_key(&form, &CrmApiDirectory, &config).await? {
//!         interceptor.rebind();
//!     }
//! });
//! ```

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen_futures::JsFuture;
use web_sys::js_sys::Promise;

use crate::bindings::crm_api3;
use crate::config::InterceptorConfig;
use crate::dom::BillingForm;
use crate::error::{js_to_api_error, InterceptError};
use crate::selection::ProcessorId;

/// Where processor details come from.
pub trait ProcessorDirectory {
    /// Id of the Stripe payment processor type, `None` when not installed.
    fn stripe_type_id(&self) -> LocalBoxFuture<'static, Result<Option<ProcessorId>, InterceptError>>;

    /// Publishable key of processor `processor_id`, provided it is of type
    /// `type_id`.
    fn publishable_key(
        &self,
        processor_id: &str,
        type_id: &ProcessorId,
    ) -> LocalBoxFuture<'static, Result<Option<String>, InterceptError>>;
}

/// Params of a `getvalue` API action.
#[derive(Serialize, Debug)]
struct GetValue<'a> {
    sequential: u8,
    #[serde(rename = "return")]
    field: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_processor_type_id: Option<&'a ProcessorId>,
}

/// The API's reply. A missing record comes back as `error_message`
/// without `result`.
#[derive(Deserialize, Debug)]
struct Envelope<T> {
    result: Option<T>,
    error_message: Option<String>,
}

fn get_value<T: DeserializeOwned + 'static>(
    entity: &'static str,
    params: &GetValue<'_>,
) -> LocalBoxFuture<'static, Result<Option<T>, InterceptError>> {
    let call = to_value(params)
        .map_err(|e| InterceptError::Api(e.to_string()))
        .and_then(|params| crm_api3(entity, "getvalue", &params).map_err(js_to_api_error));

    async move {
        // `Promise.resolve` adopts the jQuery deferred.
        let reply = JsFuture::from(Promise::resolve(&call?))
            .await
            .map_err(js_to_api_error)?;
        let envelope: Envelope<T> =
            from_value(reply).map_err(|e| InterceptError::Api(e.to_string()))?;
        if let Some(message) = envelope.error_message {
            debug!("{entity}.getvalue: {message}");
        }
        Ok(envelope.result)
    }
    .boxed_local()
}

/// `CRM.api3` on the host page.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrmApiDirectory;

impl ProcessorDirectory for CrmApiDirectory {
    fn stripe_type_id(&self) -> LocalBoxFuture<'static, Result<Option<ProcessorId>, InterceptError>> {
        get_value(
            "PaymentProcessorType",
            &GetValue {
                sequential: 1,
                field: "id",
                name: Some("Stripe"),
                id: None,
                payment_processor_type_id: None,
            },
        )
    }

    fn publishable_key(
        &self,
        processor_id: &str,
        type_id: &ProcessorId,
    ) -> LocalBoxFuture<'static, Result<Option<String>, InterceptError>> {
        get_value(
            "PaymentProcessor",
            &GetValue {
                sequential: 1,
                field: "password",
                name: None,
                id: Some(processor_id),
                payment_processor_type_id: Some(type_id),
            },
        )
    }
}

/// The processor selected in `form`, if it differs from the one the
/// publishable key was rendered for.
pub fn switched_processor<F: BillingForm>(form: &F, config: &InterceptorConfig) -> Option<String> {
    let selected = form.field_value(&config.processor_select_field)?;
    if selected.trim().is_empty() {
        return None;
    }
    match form.field_value(&config.processor_id_field) {
        Some(current) if current == selected => None,
        _ => Some(selected),
    }
}

/// Publishable key of `processor_id`, `None` unless it is a Stripe processor
/// with a non-empty key.
pub async fn resolve_publishable_key(
    directory: &dyn ProcessorDirectory,
    processor_id: &str,
) -> Result<Option<String>, InterceptError> {
    let Some(type_id) = directory.stripe_type_id().await? else {
        debug!("no Stripe processor type installed");
        return Ok(None);
    };
    let key = directory.publishable_key(processor_id, &type_id).await?;
    Ok(key.filter(|key| !key.trim().is_empty()))
}

/// Bring the key marker in line with the processor selected in `form`.
///
/// Returns whether the markers changed, in which case the form has to be
/// bound again. A failed lookup leaves the form untouched.
pub async fn sync_publishable_key<F: BillingForm>(
    form: &F,
    directory: &dyn ProcessorDirectory,
    config: &InterceptorConfig,
) -> Result<bool, InterceptError> {
    let Some(processor_id) = switched_processor(form, config) else {
        return Ok(false);
    };
    debug!("payment processor changed to id {processor_id}");

    match resolve_publishable_key(directory, &processor_id).await? {
        Some(key) => {
            debug!("processor {processor_id} is a Stripe processor");
            form.set_field_value(&config.pub_key_field, &key);
            form.set_field_value(&config.processor_id_field, &processor_id);
        }
        None => {
            debug!("processor {processor_id} is not a Stripe processor, clearing the key");
            form.set_field_value(&config.pub_key_field, "");
        }
    }
    Ok(true)
}
