//! Configuration loading with env substitution.
//!
//! Config files: `ferry.toml`, `ferry.yaml`, `ferry.yml` or `ferry.json`,
//! searched in `./` then `~/.config/ferry/`.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_config},
    schema::{AttachmentsConfig, ChatConfig, FerryConfig},
};
