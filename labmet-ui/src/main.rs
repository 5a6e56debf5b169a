//! LabMet Dashboard
//!
//! Live weather station cards built with Leptos (WASM). Station data
//! arrives over the server's WebSocket; no history is loaded over REST.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
