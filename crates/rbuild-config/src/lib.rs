//! Configuration sources for rbuild
//!
//! Three sources feed a run:
//! - action inputs, read from `INPUT_<NAME>` environment variables
//! - the CI environment (server URL, repository, commit SHA)
//! - an optional TOML settings file with tool-level policy
//!
//! All of them accept an injectable lookup so tests never touch the real
//! process environment.

pub mod errors;
pub mod inputs;
pub mod settings;

pub use errors::ConfigError;
pub use inputs::{input_env_name, ActionInputs, CiEnvironment};
pub use settings::{Profile, Settings};
