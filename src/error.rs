use std::path::PathBuf;

use dutycal_core::DutyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Local state already exists at {}; refusing to overwrite it", path.display())]
    StateExists { path: PathBuf },

    #[error("No {setting} configured in the remote section")]
    RemoteNotConfigured { setting: &'static str },

    #[error("Remote transfer failed for {target}: {message}")]
    ExternalIo { target: String, message: String },

    #[error(transparent)]
    Duty(#[from] DutyError),
}

impl CliError {
    pub fn external(target: impl Into<String>, message: impl ToString) -> Self {
        Self::ExternalIo {
            target: target.into(),
            message: message.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
