//! Background Tasks Module
//!
//! Contains background tasks that run periodically while a bot is alive.
//!
//! # Tasks
//! - Callback sweep: drops buffered callback results nobody awaited

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_interval};
