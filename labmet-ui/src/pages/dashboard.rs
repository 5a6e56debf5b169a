//! Dashboard Page
//!
//! One card per reporting station, in order of first report.

use leptos::*;

use crate::api;
use crate::components::StationCard;
use crate::state::global::GlobalState;
use crate::state::station::MAX_STATIONS;

/// Dashboard page component
#[component]
pub fn Dashboard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    // Broker status on mount
    create_effect(move |_| {
        spawn_local(async move {
            match api::check_health().await {
                Ok(health) => state.broker.set(Some(health.mqtt)),
                Err(e) => {
                    web_sys::console::error_1(&format!("Health check failed: {}", e).into());
                }
            }
        });
    });

    let ids = create_memo(move |_| state.board.with(|b| b.ids()));

    view! {
        <div class="dashboard">
            <div class="page-header">
                <h1>"Stations"</h1>
                <small>
                    {move || format!("{} of {} stations", ids.with(Vec::len), MAX_STATIONS)}
                </small>
            </div>

            <Show
                when=move || !ids.with(Vec::is_empty)
                fallback=|| view! {
                    <div class="empty-state">
                        <p>"Waiting for the first station to report..."</p>
                    </div>
                }
            >
                <div class="station-grid">
                    <For
                        each=move || ids.get()
                        key=|id| *id
                        children=move |id| view! { <StationCard id=id /> }
                    />
                </div>
            </Show>
        </div>
    }
}
