//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sweep: Removes expired recipes and idle rate-limit records

mod cleanup;

pub use cleanup::spawn_sweep_task;
