use yew::prelude::*;

/// Properties for [`ErrorBanner`].
#[derive(Properties, PartialEq)]
pub struct ErrorBannerProps {
    /// Provider message, shown verbatim
    pub message: String,
}

/// The tokenization error banner, styled with the host's message classes.
#[function_component(ErrorBanner)]
pub fn error_banner(props: &ErrorBannerProps) -> Html {
    html! {
        <div class="messages alert alert-block alert-danger error crm-error">
            <strong>{ "Payment Error Response:" }</strong>
            <ul class="error-list">
                <li>{ format!("Error: {}", props.message) }</li>
            </ul>
        </div>
    }
}
