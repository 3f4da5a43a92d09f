//! Core of planrun: plan data model, execution engine, configuration and errors.
//!
//! Tool adapters, renderers and the outer retry strategy live in
//! `planrun-plugins`; the `planrun` binary lives in `planrun-cli`.

pub mod config;
pub mod error;
pub mod executor;

pub use error::{CliError, DispatchError, ExecutorError};
pub use executor::{ExecutionEngine, ExecutionOpts, ExecutionResponse, Plan, Task};
