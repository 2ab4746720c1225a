//! runstat — terminal dashboard for running-event statistics
//!
//! The core is an in-memory pivoting engine: flat per-event-per-date
//! observation rows are normalized, optionally bucketed into coarser time
//! periods, projected into per-measure lookup tables, and evaluated cell by
//! cell into an event × period matrix of derived metrics.

pub mod cli;
pub mod services;
pub mod tui;
pub mod types;
