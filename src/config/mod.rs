#[cfg(feature = "cli")]
pub mod args;
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{CliConfig, Command, SellArgs, ThemeAction};

pub const DEFAULT_STATE_DIR: &str = "./.campus-market";
pub const MAX_TIMEOUT_SECONDS: u64 = 300;
