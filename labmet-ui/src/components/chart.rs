//! Chart Component
//!
//! Potential and obtainable productivity of one station, drawn on a canvas
//! as filled areas.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::state::station::ChartSeries;

const OBTAINABLE_COLOR: &str = "#1ab394";
const OBTAINABLE_FILL: &str = "rgba(26, 179, 148, 0.5)";
const POTENTIAL_COLOR: &str = "#1C84C6";
const POTENTIAL_FILL: &str = "rgba(28, 132, 198, 0.3)";
const GRID_COLOR: &str = "#d5d5d5";
const TEXT_COLOR: &str = "#676a6c";
const Y_TICKS: usize = 4;

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 10.0;
const MARGIN_TOP: f64 = 10.0;
const MARGIN_BOTTOM: f64 = 25.0;

/// Maps series coordinates onto the plot area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plot {
    pub width: f64,
    pub height: f64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Plot {
    pub fn new(width: f64, height: f64, series: &ChartSeries) -> Self {
        let (x_min, x_max) = series
            .x_bounds()
            .map(|(a, b)| (a as f64, b as f64))
            .unwrap_or((0.0, 1.0));
        let y_max = series.y_max();

        Self {
            width,
            height,
            x_min,
            x_max: if x_max > x_min { x_max } else { x_min + 1.0 },
            y_max: if y_max > 0.0 { y_max } else { 1.0 },
        }
    }

    pub fn x(&self, x: f64) -> f64 {
        let span = self.width - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (x - self.x_min) / (self.x_max - self.x_min) * span
    }

    pub fn y(&self, y: f64) -> f64 {
        let span = self.height - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + (1.0 - y.clamp(0.0, self.y_max) / self.y_max) * span
    }

    pub fn baseline(&self) -> f64 {
        self.height - MARGIN_BOTTOM
    }

    /// Values of the horizontal grid lines, bottom to top
    pub fn y_ticks(&self) -> Vec<f64> {
        (0..=Y_TICKS)
            .map(|i| self.y_max * i as f64 / Y_TICKS as f64)
            .collect()
    }
}

/// Productivity chart of one station
#[component]
pub fn StationChart(#[prop(into)] series: Signal<ChartSeries>) -> impl IntoView {
    let canvas_ref = create_node_ref::<html::Canvas>();
    let resized = create_rw_signal(0u32);

    let handle = window_event_listener(ev::resize, move |_| {
        resized.update(|n| *n = n.wrapping_add(1));
    });
    on_cleanup(move || handle.remove());

    create_effect(move |_| {
        let _ = resized.get();
        let series = series.get();

        if let Some(canvas) = canvas_ref.get() {
            fit_to_parent(&canvas);
            draw_chart(&canvas, &series);
        }
    });

    view! {
        <div class="chart">
            <canvas node_ref=canvas_ref width="400" height="200" />
        </div>
    }
}

fn fit_to_parent(canvas: &HtmlCanvasElement) {
    if let Some(parent) = canvas.parent_element() {
        let width = parent.client_width();
        if width > 0 {
            canvas.set_width(width as u32);
        }
    }
}

/// Draw both series on the canvas
fn draw_chart(canvas: &HtmlCanvasElement, series: &ChartSeries) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let plot = Plot::new(width, height, series);

    ctx.clear_rect(0.0, 0.0, width, height);

    ctx.set_stroke_style(&GRID_COLOR.into());
    ctx.set_line_width(1.0);
    ctx.set_fill_style(&TEXT_COLOR.into());
    ctx.set_font("11px sans-serif");
    for value in plot.y_ticks() {
        let y = plot.y(value);
        ctx.begin_path();
        ctx.move_to(MARGIN_LEFT, y);
        ctx.line_to(width - MARGIN_RIGHT, y);
        ctx.stroke();
        let _ = ctx.fill_text(&format!("{:.0}", value), 4.0, y + 4.0);
    }

    if series.is_empty() {
        let _ = ctx.fill_text("Waiting for data", width / 2.0 - 45.0, height / 2.0);
        return;
    }

    draw_area(&ctx, &plot, series.potential.iter(), POTENTIAL_COLOR, POTENTIAL_FILL);
    draw_area(&ctx, &plot, series.obtainable.iter(), OBTAINABLE_COLOR, OBTAINABLE_FILL);

    if let Some((first, last)) = series.x_bounds() {
        ctx.set_fill_style(&TEXT_COLOR.into());
        let _ = ctx.fill_text(&first.to_string(), plot.x(first as f64) - 3.0, height - 8.0);
        let _ = ctx.fill_text(&last.to_string(), plot.x(last as f64) - 10.0, height - 8.0);
    }
}

fn draw_area<'a>(
    ctx: &CanvasRenderingContext2d,
    plot: &Plot,
    points: impl Iterator<Item = &'a (u64, f64)> + Clone,
    stroke: &str,
    fill: &str,
) {
    let mut first_x = None;
    let mut last_x = 0.0;

    ctx.begin_path();
    for &(x, y) in points.clone() {
        let px = plot.x(x as f64);
        let py = plot.y(y);
        if first_x.is_none() {
            ctx.move_to(px, plot.baseline());
            first_x = Some(px);
        }
        ctx.line_to(px, py);
        last_x = px;
    }

    let Some(first_x) = first_x else { return };
    ctx.line_to(last_x, plot.baseline());
    ctx.line_to(first_x, plot.baseline());
    ctx.close_path();
    ctx.set_fill_style(&fill.into());
    ctx.fill();

    ctx.begin_path();
    for (i, &(x, y)) in points.enumerate() {
        let (px, py) = (plot.x(x as f64), plot.y(y));
        if i == 0 {
            ctx.move_to(px, py);
        } else {
            ctx.line_to(px, py);
        }
    }
    ctx.set_stroke_style(&stroke.into());
    ctx.set_line_width(2.0);
    ctx.stroke();
}
