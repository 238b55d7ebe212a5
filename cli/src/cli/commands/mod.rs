//! Command implementations.

pub mod auth;
pub mod completions;
pub mod resources;

pub use auth::{handle_login, handle_logout, handle_status};
pub use completions::handle_completions;
pub use resources::{
    handle_env_create, handle_envs_list, handle_groups_list, handle_orgs_list,
    handle_secret_set, handle_secrets_list,
};
