use campus_market::config::{Command, SellArgs, ThemeAction};
use campus_market::core::{ConfigProvider, Listing, Theme};
use campus_market::utils::error::{ErrorSeverity, MarketError};
use campus_market::utils::{logger, validation::Validate};
use campus_market::{
    CliConfig, EnrichmentOutcome, GeminiAnalyzer, ImageAcquirer, ListingDraft, ListingFeed,
    LocalPreferenceStore, SellFlow, Session, ThemeState, TomlConfig, UnavailableCamera,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting campus-market CLI");
    if cli.verbose {
        tracing::debug!("CLI command: {:?}", cli.command);
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, settings.as_ref()).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn load_settings(cli: &CliConfig) -> campus_market::Result<Box<dyn ConfigProvider>> {
    let settings: Box<dyn ConfigProvider> = match &cli.config {
        Some(path) => {
            tracing::info!("📄 Loading configuration from {}", path);
            let config = TomlConfig::from_file(path)?.with_fallback_api_key(cli.api_key());
            config.validate()?;
            Box::new(config)
        }
        None => {
            cli.validate()?;
            Box::new(cli.clone())
        }
    };
    Ok(settings)
}

async fn run(cli: &CliConfig, settings: &dyn ConfigProvider) -> campus_market::Result<()> {
    // 主題要在任何輸出之前讀回並套用
    let store = LocalPreferenceStore::new(settings.state_dir().to_string());
    let mut theme = ThemeState::load(store).await;
    let mut palette = Palette::for_theme(theme.current());

    let mut feed = ListingFeed::with_sample_listings()?;

    match &cli.command {
        Command::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => {
                println!("{}", palette.heading(&format!("Theme: {}", theme.current())));
            }
            ThemeAction::Toggle => {
                let current = theme.toggle().await?;
                palette = Palette::for_theme(current);
                println!("{}", palette.heading(&format!("Theme switched to {}", current)));
            }
        },
        Command::Search { query } => print_feed(&feed, query, &palette),
        Command::Sell(args) => {
            sell(args, settings, &mut feed).await?;
            print_feed(&feed, "", &palette);
        }
    }

    Ok(())
}

async fn sell(
    args: &SellArgs,
    settings: &dyn ConfigProvider,
    feed: &mut ListingFeed,
) -> campus_market::Result<()> {
    let mut session = Session::new();
    session.login(&args.email, &args.name);

    let analyzer = Arc::new(GeminiAnalyzer::from_config(settings)?);
    let acquirer = ImageAcquirer::new(settings.max_upload_bytes());
    let mut flow = SellFlow::new(analyzer);
    flow.draft_mut().condition = args.condition.parse()?;

    let mut captured = false;
    if args.camera {
        match flow.open_camera(&UnavailableCamera).await {
            Ok(()) => {
                flow.capture_photo()?;
                captured = true;
            }
            Err(e) if e.is_recoverable() => {
                eprintln!("⚠️  {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
            }
            Err(e) => return Err(e),
        }
    }

    if !captured {
        let path = args
            .image
            .as_deref()
            .ok_or_else(|| MarketError::MissingConfigError {
                field: "--image".to_string(),
            })?;
        flow.attach_file(&acquirer, path).await?;
    }

    println!("🤖 Analyzing photo...");
    match flow.settle().await {
        Some(EnrichmentOutcome::Failed(reason)) => {
            tracing::warn!("AI suggestions unavailable: {}", reason);
            eprintln!("⚠️  AI analysis failed; using the details you provided");
        }
        Some(_) => println!("✨ AI suggestions applied"),
        None => {}
    }

    let draft = flow.draft_mut();
    if let Some(title) = &args.title {
        draft.title = title.clone();
    }
    if let Some(price) = &args.price {
        draft.price = price.clone();
    }
    if let Some(category) = &args.category {
        draft.category = category.clone();
    }
    if let Some(description) = &args.description {
        draft.description = description.clone();
    }
    print_draft(flow.draft());

    let id = flow.publish(feed, &session)?;
    println!("✅ Listed as {}", id);
    Ok(())
}

fn print_draft(draft: &ListingDraft) {
    println!("  Title:       {}", draft.title);
    println!("  Category:    {}", draft.category);
    println!("  Price:       ₹{}", draft.price);
    println!("  Condition:   {}", draft.condition);
    println!("  Description: {}", draft.description);
}

fn print_feed(feed: &ListingFeed, query: &str, palette: &Palette) {
    let results: Vec<&Listing> = feed.filter(query).collect();
    let heading = if query.is_empty() {
        format!("{} listings", results.len())
    } else {
        format!("{} listings matching '{}'", results.len(), query)
    };
    println!("{}", palette.heading(&heading));

    for listing in results {
        println!(
            "  {} {}  ₹{:.0}  [{} · {}]  by {}",
            palette.bullet(),
            listing.title,
            listing.price,
            listing.category,
            listing.condition,
            listing.seller_name
        );
    }
}

/// 終端機的配色
struct Palette {
    accent: &'static str,
}

impl Palette {
    const RESET: &'static str = "\x1b[0m";

    fn for_theme(theme: Theme) -> Self {
        let accent = match theme {
            Theme::Light => "\x1b[1;34m",
            Theme::Dark => "\x1b[1;96m",
        };
        Self { accent }
    }

    fn heading(&self, text: &str) -> String {
        format!("{}{}{}", self.accent, text, Self::RESET)
    }

    fn bullet(&self) -> String {
        format!("{}•{}", self.accent, Self::RESET)
    }
}
