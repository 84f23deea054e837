//! Command-line interface components
//!
//! This module contains CLI-specific code for the Cached Fetch application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{CacheAction, CacheArgs, CacheTarget, Cli, Commands, GetArgs, GlobalArgs};
pub use commands::{handle_cache, handle_get, handle_init_config, CommandContext};
