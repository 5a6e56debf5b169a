//! Connection Status Indicator

use leptos::*;

use crate::state::global::GlobalState;

/// CSS classes of the indicator dot
pub fn status_class(connected: bool) -> &'static str {
    if connected {
        "status status-connected"
    } else {
        "status status-disconnected"
    }
}

/// Dot showing whether the live connection is up
#[component]
pub fn StatusIndicator() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <span class="status-wrapper">
            <span class=move || status_class(state.ws_connected.get()) />
            <span class="status-text">
                {move || if state.ws_connected.get() { "Online" } else { "Offline" }}
            </span>
        </span>
    }
}
