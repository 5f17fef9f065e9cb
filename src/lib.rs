mod bindings;
pub mod client;
pub mod components;
pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod guard;
mod interceptor;
pub mod interop;
pub mod locator;
mod logger;
pub mod processor;
pub mod sanitizer;
pub mod selection;
pub mod ui;
pub mod web;

#[cfg(test)]
mod testing;

pub use client::*;
pub use config::InterceptorConfig;
pub use controller::*;
pub use error::*;
pub use interceptor::BillingInterceptor;
