//! # Core Engine Module
//!
//! Configuration shared by every subsystem.
//!
//! ## Organization
//!
//! - **Config**: renderer, engine and application settings

pub mod config;

pub use config::{ApplicationConfig, Config, ConfigError, EngineConfig, RendererSettings, WindowConfig};
