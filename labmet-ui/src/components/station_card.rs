//! Station Card Component
//!
//! Latest readings, productivity figures and chart of one station.

use leptos::*;

use super::StationChart;
use crate::state::global::GlobalState;
use crate::state::station::{format_station_id, ReadingView, StationView};

#[component]
pub fn StationCard(id: u32) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let station = create_memo(move |_| state.board.with(|b| b.get(id).cloned()));
    let chart = Signal::derive(move || {
        station.with(|s| s.as_ref().map(|s| s.chart.clone()).unwrap_or_default())
    });

    let figure = move |pick: fn(&StationView) -> String| {
        move || {
            station.with(|s| s.as_ref().map(pick).unwrap_or_else(|| "-".to_string()))
        }
    };

    view! {
        <div class="station-card animated fadeInUp">
            <div class="station-header">
                <h3>"My Station " {format_station_id(id)}</h3>
                <small>
                    "Last update: "
                    {move || station.with(|s| {
                        s.as_ref().map(|s| s.last_update.clone()).unwrap_or_else(|| "-".to_string())
                    })}
                </small>
            </div>

            <ul class="readings">
                {move || station.with(|s| {
                    s.as_ref()
                        .map(|s| s.readings.clone())
                        .unwrap_or_default()
                        .into_iter()
                        .map(|reading| view! { <ReadingRow reading=reading /> })
                        .collect_view()
                })}
            </ul>

            <StationChart series=chart />

            <div class="figures">
                <Figure label="Potential Productivity" value=figure(|s| s.potential.clone()) />
                <Figure label="Obtainable Productivity" value=figure(|s| s.obtainable.clone()) />
                <Figure label="Real Water Usage" value=figure(|s| s.etc.clone()) />
                <Figure label="Potential Water Usage" value=figure(|s| s.eto.clone()) />
            </div>

            {move || station.with(|s| {
                s.as_ref().and_then(|s| s.growth).map(|stage| view! {
                    <img
                        src="img/potato.svg"
                        alt="Crop growth"
                        class=format!("growth {} animated fadeInUp", stage.class())
                    />
                })
            })}
        </div>
    }
}

#[component]
fn ReadingRow(reading: ReadingView) -> impl IntoView {
    view! {
        <li>
            <span>{reading.sensor.label()}</span>
            <span>
                {reading.text}
                " "
                {reading.level.map(|level| view! {
                    <span class=format!("label {}", level.class())>{level.text()}</span>
                })}
            </span>
        </li>
    }
}

#[component]
fn Figure<F>(label: &'static str, value: F) -> impl IntoView
where
    F: Fn() -> String + 'static,
{
    view! {
        <div class="figure">
            <small>{label}</small>
            <strong>{value}</strong>
        </div>
    }
}
