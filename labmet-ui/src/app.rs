//! App Root Component
//!
//! Main application component with routing and global providers.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{Nav, StatusIndicator, Toast};
use crate::pages::Dashboard;
use crate::state::global::{provide_global_state, GlobalState};
use crate::state::websocket::{init_websocket, pinned_stations};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();

    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    init_websocket(state, &api::get_api_base(), &pinned_stations(&search));

    view! {
        <Router>
            <Nav />

            <main class="container">
                <Routes>
                    <Route path="/" view=Dashboard />
                    <Route path="/*any" view=NotFound />
                </Routes>
            </main>

            <Footer />
            <Toast />
        </Router>
    }
}

/// Footer component showing connection status
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <footer>
            <div class="container footer-inner">
                <StatusIndicator />
                <span class="last-sync">
                    {move || {
                        state.last_sync.get()
                            .and_then(chrono::DateTime::from_timestamp_millis)
                            .map(|dt| format!("Last update: {}", dt.format("%H:%M:%S")))
                            .unwrap_or_else(|| "No data yet".to_string())
                    }}
                </span>
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="empty-state">
            <h1>"Page Not Found"</h1>
            <A href="/">"Go to Dashboard"</A>
        </div>
    }
}
