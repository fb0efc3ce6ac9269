//! Logging utilities.
//!
//! This module centralizes logger initialization. The crate itself only
//! talks to the `log` facade; `env_logger` is wired up here for binaries
//! and tests that want output.

mod init;

pub use init::{init_logging, LoggingConfig};
