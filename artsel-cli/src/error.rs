//! Binary-level errors

use std::path::PathBuf;

use artsel_lib::error::Error;
use artsel_lib::error::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("no cache directory on this platform; pass --log-file")]
    NoLogDir,

    #[error("could not create log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not install logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("could not set up the API client: {0}")]
    Source(#[from] FetchError),

    #[error(transparent)]
    Session(#[from] Error),

    #[error("{0}")]
    Usage(String),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}
