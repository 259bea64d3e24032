//! Execution engine.
//!
//! - **Config** (`config.rs`) - `OrchestratorConfig` and its validation
//! - **Executor** (`executor.rs`) - One provider's retry sequence under a timeout
//! - **Orchestrator** (`orchestrator.rs`) - Runs, bookkeeping and the public API

mod config;
mod executor;
mod orchestrator;

pub use config::OrchestratorConfig;
pub use orchestrator::Orchestrator;
