//! UI Components
//!
//! Reusable Leptos components for the dashboard.

pub mod chart;
pub mod nav;
pub mod station_card;
pub mod status;
pub mod toast;

pub use chart::StationChart;
pub use nav::Nav;
pub use station_card::StationCard;
pub use status::StatusIndicator;
pub use toast::Toast;
