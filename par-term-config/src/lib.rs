//! Configuration for the par-term tmux control mode engine.
//!
//! This crate provides:
//!
//! - Shared local identity types (`PaneId`, `TabId`) used by the UI layer
//! - `TmuxConfig`, the YAML-backed tmux integration settings
//! - Default values and typed configuration errors

pub mod defaults;
pub mod error;
mod persistence;
mod tmux_config;
mod types;

pub use error::ConfigError;
pub use tmux_config::TmuxConfig;
pub use types::{PaneId, TabId};
