//! Configuration loading, validation and env substitution.
//!
//! Config files: `updraft.toml`, `updraft.yaml`, `updraft.yml` or
//! `updraft.json`, searched in `./` then `~/.config/updraft/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{MetricsConfig, UpdraftConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate_config},
};
