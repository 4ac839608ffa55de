pub mod adapters;
pub mod api;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::HttpFetcher;
pub use config::{LookupConfig, LookupSettings};
pub use crate::core::lookup::LookupEngine;
pub use domain::model::{LookupResponse, ParseStrategy, PhoneNumber, ProbeResult, SourceProbe};
pub use utils::error::{LookupError, Result};
