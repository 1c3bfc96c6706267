use shared::error::AppError;
use thiserror::Error;

/// Fatal errors while starting or running the server process
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("startup failed: {0}")]
    Startup(#[from] AppError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
