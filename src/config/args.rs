use crate::adapters::gemini::{
    DEFAULT_ENDPOINT, DEFAULT_INSTRUCTION, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::config::{DEFAULT_STATE_DIR, MAX_TIMEOUT_SECONDS};
use crate::core::acquisition::DEFAULT_MAX_UPLOAD_BYTES;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "campus-market")]
#[command(about = "Campus electronics marketplace with AI-assisted listings")]
pub struct CliConfig {
    #[arg(long, help = "Load settings from a TOML file instead of flags")]
    pub config: Option<String>,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    #[arg(long, default_value = DEFAULT_STATE_DIR)]
    pub state_dir: String,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, Subcommand)]
pub enum Command {
    /// Show or toggle the display theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Search listings by title or category
    Search {
        #[arg(default_value = "")]
        query: String,
    },
    /// Create a listing from a photo, with AI-suggested details
    Sell(SellArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Subcommand)]
pub enum ThemeAction {
    Show,
    Toggle,
}

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct SellArgs {
    #[arg(long, help = "Photo of the item")]
    pub image: Option<String>,

    #[arg(long, help = "Try the camera first, falling back to --image")]
    pub camera: bool,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "Good")]
    pub condition: String,

    #[arg(long, help = "Override the suggested title")]
    pub title: Option<String>,

    #[arg(long, help = "Override the suggested price (INR)")]
    pub price: Option<String>,

    #[arg(long, help = "Override the suggested category")]
    pub category: Option<String>,

    #[arg(long, help = "Override the suggested description")]
    pub description: Option<String>,
}

impl ConfigProvider for CliConfig {
    fn ai_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    fn instruction(&self) -> &str {
        DEFAULT_INSTRUCTION
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    fn state_dir(&self) -> &str {
        &self.state_dir
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api_endpoint", &self.api_endpoint)?;
        validate_non_empty_string("model", &self.model)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, MAX_TIMEOUT_SECONDS)?;
        validate_positive_number("max_upload_bytes", self.max_upload_bytes, 1)?;
        validate_path("state_dir", &self.state_dir)?;
        Ok(())
    }
}
