//! Configuration loading and management.
//!
//! A config directory holds two files:
//! - `config.toml`: daemon settings
//! - `identity.toml`: the pub's private key

mod defaults;
mod identity;
mod types;
mod validation;

pub use identity::IdentityStorage;
pub use types::{CONFIG_FILE, Config, ConfigError, DATABASE_FILE, LogConfig};
pub use validation::{ValidationError, validate};
