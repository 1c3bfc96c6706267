//! Core module: configuration, shared state, background tasks and the server
//!
//! - [`Config`]: environment-driven configuration
//! - [`ServerState`]: handles shared by handlers and workers
//! - [`BackgroundTasks`]: registry of spawned workers
//! - [`Server`]: startup sequence and HTTP serving

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};
