use std::{
    fmt::{self, Display},
    io,
    path::PathBuf,
    process::ExitCode,
};

use showroom_framework::RenderSurfaceError;
use winit::error::EventLoopError;

pub(crate) type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug)]
pub(crate) enum ApplicationError {
    ReadConfig {
        path: PathBuf,
        source: io::Error,
    },
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    EventLoop(EventLoopError),
    Graphics(RenderSurfaceError),
}

impl Display for ApplicationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationError::ReadConfig { path, source } => {
                write!(formatter, "failed to read {}: {source}", path.display())
            }
            ApplicationError::ParseConfig { path, source } => {
                write!(formatter, "invalid configuration in {}: {source}", path.display())
            }
            ApplicationError::EventLoop(error) => {
                write!(formatter, "window event loop failed: {error}")
            }
            ApplicationError::Graphics(error) => write!(formatter, "graphics setup failed: {error}"),
        }
    }
}

impl From<ApplicationError> for ExitCode {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::ReadConfig { .. } | ApplicationError::ParseConfig { .. } => {
                ExitCode::from(2)
            }
            ApplicationError::EventLoop(_) => ExitCode::from(3),
            ApplicationError::Graphics(_) => ExitCode::from(4),
        }
    }
}
