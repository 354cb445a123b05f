pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{ConsoleNotifier, HttpAssignmentClient, LocalStorage};
pub use crate::app::pipelines::RosterPipeline;
pub use crate::config::{toml_config::TomlConfig, Settings};
pub use crate::core::engine::{RunSummary, SantaEngine};
pub use crate::core::session::Session;
pub use crate::utils::error::{Result, SantaError};
