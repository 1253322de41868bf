pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod remote;

pub use config::Config;
pub use error::{CliError, CliResult};
