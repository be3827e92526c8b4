pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub mod cli;
