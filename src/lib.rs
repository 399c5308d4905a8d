//! Lodge reservation service.
//!
//! A single bookable unit, booked by the night within a rolling one-month horizon.

pub mod app;
pub mod modules;
pub mod utils;

pub use app::App;
pub use modules::*;
