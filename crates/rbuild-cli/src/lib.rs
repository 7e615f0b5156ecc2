//! rbuild library - expose modules for testing
//!
//! The binary is a thin clap wrapper over [`commands`].

pub mod artifacts;
pub mod commands;
pub mod common;
pub mod errors;
pub mod invoker;
pub mod outputs;

pub use common::GlobalOpts;
pub use rbuild_logger as logger;
