//! High-level operations.
//!
//! This module contains the implementation of abiprobe commands.

pub mod configure;

pub use configure::{
    configure, configure_system, format_report, load_project_config, ConfigureOptions,
    ConfigureReport, RoleReport, StepResult,
};
