pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::storage::LocalStorage;
pub use config::toml_config::FareConfig;
pub use core::{etl::EtlEngine, pipeline::FarePipeline};
pub use utils::error::{EtlError, Result};
