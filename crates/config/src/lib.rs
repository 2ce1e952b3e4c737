//! Profile directories, config loading, env substitution and validation.
//!
//! Each profile lives in `<data_dir>/<profile>/` and holds one config file
//! (`config.toml`, `config.yaml`, `config.yml` or `config.json`) next to the
//! `db.sqlite` correlation database.
//!
//! `${ENV_VAR}` placeholders are expanded before parsing; unset ones are kept
//! verbatim and logged.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;

pub use {
    loader::{DEFAULT_PROFILE, Profile, apply_env_overrides, default_data_dir, load_config},
    schema::BridgeConfig,
};
