pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalPreferenceStore, toml_config::TomlConfig};

pub use adapters::{camera::UnavailableCamera, gemini::GeminiAnalyzer};
pub use core::{
    acquisition::ImageAcquirer,
    camera::CameraSession,
    draft::{EnrichmentOutcome, ListingDraft, RequestToken},
    feed::ListingFeed,
    sell_flow::SellFlow,
    session::{Session, ThemeState},
};
pub use utils::error::{MarketError, Result};
