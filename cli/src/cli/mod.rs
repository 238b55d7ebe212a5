//! CLI module for secrets.

pub mod args;
pub mod commands;

pub use args::{
    AuthCommands, Cli, Commands, EnvCommands, GroupCommands, OrgCommands, SecretCommands,
};
