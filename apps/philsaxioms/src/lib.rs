//! # PhilsAxioms
//!
//! Server and CLI around `philsaxioms-core`.
//!
//! - `store`: the YAML-backed dataset store, its cache and file watcher
//! - `api`: the axum HTTP API
//! - `cli`: the clap command line
//! - `config`: layered configuration (defaults, TOML, environment, flags)

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use store::{DataChange, Dataset, DatasetStore, EngineCache};
