//! Navigation Component
//!
//! Header bar with brand and connection state.

use leptos::*;
use leptos_router::*;

use super::StatusIndicator;
use crate::state::global::GlobalState;

/// Navigation header component
#[component]
pub fn Nav() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <nav class="navbar">
            <div class="container navbar-inner">
                <A href="/" class="brand">
                    <img src="img/potato.svg" alt="" class="brand-logo" />
                    <span>"LabMet"</span>
                </A>

                <div class="navbar-status">
                    {move || {
                        state.broker.get().map(|broker| view! {
                            <span class="broker">{format!("Broker: {}", broker)}</span>
                        })
                    }}
                    <StatusIndicator />
                </div>
            </div>
        </nav>
    }
}
