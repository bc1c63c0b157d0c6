//! Shift marketplace connecting municipal healthcare departments with healthcare workers.
//!
//! Departments post shifts, workers advertise availability and apply, and the match scorer
//! ranks available workers for each shift before notifications are queued.

pub mod config;
pub mod error;
pub mod identity;
pub mod telemetry;
pub mod workflows;
