//! # limiquantix Common
//!
//! Shared utilities for the limiquantix engine tooling.
//!
//! ## Logging
//!
//! ```rust,no_run
//! use limiquantix_common::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::Json).unwrap();
//! tracing::info!(vm_id = "vm-123", "VM created");
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat};
