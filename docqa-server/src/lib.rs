//! `docqa-server` serves the docqa web UI and its JSON API: upload documents,
//! open chat sessions, and ask questions answered from the uploaded content.

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod telemetry;

pub use config::{Cli, LogFormat, ServerConfig};
pub use error::{ApiError, ConfigError};
pub use server::{AppState, app_router, run_server};
