//! API Routes
//!
//! Route handlers organized by functionality.

pub mod cultures;
pub mod health;
pub mod ingest;
pub mod model;
pub mod stations;
pub mod water_balance;
