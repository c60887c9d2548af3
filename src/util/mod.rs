//! Utility types.
//!
//! This module provides configuration shared by the object model and the CLI.

pub mod config;

pub use config::{ObjectConfig, RenderConfig, DISPLAY_SEPARATOR, MEMBER_SEPARATOR};
