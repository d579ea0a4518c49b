use std::fmt;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::sync::SyncError;
use crate::telemetry::TelemetryError;

/// Top-level failure for binaries built on this crate.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Sync(SyncError),
    Output(String),
}

impl AppError {
    /// Process exit code for the CLI: 2 for setup problems, 1 for request failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Telemetry(_) => 2,
            AppError::Io(_) | AppError::Sync(_) | AppError::Output(_) => 1,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid configuration: {err}"),
            AppError::Telemetry(err) => write!(f, "could not start logging: {err}"),
            AppError::Io(err) => write!(f, "{err}"),
            // Backend `detail` text is already phrased for the user.
            AppError::Sync(err) => f.write_str(&err.user_message()),
            AppError::Output(err) => write!(f, "could not write output: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<TelemetryError> for AppError {
    fn from(err: TelemetryError) -> Self {
        AppError::Telemetry(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        AppError::Sync(err)
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Sync(SyncError::Api(err))
    }
}
