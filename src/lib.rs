//! cancha — recurring-reservation engine for a sports-facility booking
//! platform.
//!
//! A *fixed reservation* is a weekly recurring booking template (weekday +
//! time range + court + renter). The engine validates new templates against
//! a rolling future horizon of existing bookings, materializes concrete
//! dated reservation instances from them, and keeps those instances in sync
//! with the template's lifecycle (create, update, activate/deactivate,
//! remove).

pub mod config;
pub mod engine;
pub mod model;
pub mod observability;

pub use config::Config;
pub use engine::{Engine, EngineError};
