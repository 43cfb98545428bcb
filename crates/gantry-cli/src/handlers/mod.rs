//! Command handlers - extracted from main.rs for testability

pub mod config;
pub mod init;
pub mod list;
pub mod pipeline;

pub use config::{execute_config, render_config};
pub use init::{default_config_yaml, execute_init, write_default_config};
pub use list::{execute_list, render_listing};
pub use pipeline::{execute_pipeline, run_target};
