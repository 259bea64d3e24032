//! Provider health tracking.
//!
//! - **Window** (`window.rs`) - Ring buffer of recent executions per provider
//! - **Tracker** (`tracker.rs`) - Status classification and auto-enable/auto-disable
//!
//! # Status transitions
//!
//! ```text
//! unknown --success--> healthy --failure--> degraded --3 in a row--> down
//!    ^                    ^                                           |
//!    |                    +------------------success------------------+
//! (registration)
//! ```

mod tracker;
mod window;

pub use tracker::{HealthPolicy, HealthTracker, DEFAULT_AUTO_DISABLE_THRESHOLD};
pub use window::{LATENCY_WINDOW, UPTIME_WINDOW};

pub(crate) use window::HealthState;
