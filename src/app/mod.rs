//! This module contains app and lifecycle related code. Like the config management, and the logging.

mod config;
mod logging;

pub use config::{AppConfig, CliArgs};
pub use logging::setup_logger;
