use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod credential;
mod input;
mod orchestrator;
mod repl;

use atelier_core::config::Config;
use atelier_core::media::MediaStore;
use atelier_core::output::OutputFormat;
use atelier_core::session::create_session_dir;
use atelier_core::{AspectRatio, Snapshot, SnapshotChanges, StatusPublisher};
use genai_rs::{ApiKeyStore, GenAiClient};

use commands::generate::{handle_image, handle_video};
use commands::studio::handle_studio;
use commands::tiers::handle_tiers;
use credential::{CredentialGate, TerminalCredentialFlow};
use input::LineInput;
use orchestrator::Orchestrator;

#[derive(Parser)]
#[command(
    name = "atelier",
    version,
    about = "Image and video generation studio with branching undo/redo"
)]
struct Cli {
    #[arg(long, global = true, value_name = "json|jsonl|text")]
    format: Option<String>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[arg(long, global = true, default_value = "120")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive editing session with history
    Studio,
    /// Generate or edit a single image
    Image(ImageArgs),
    /// Generate a single video
    Video(VideoArgs),
    /// Show the quality tier tables
    Tiers,
}

#[derive(Args)]
struct RequestArgs {
    #[arg(short, long)]
    prompt: String,

    #[arg(long, value_name = "1:1|16:9|9:16|3:4|4:3")]
    aspect_ratio: Option<String>,

    #[arg(long)]
    quality: Option<String>,

    #[arg(long, value_name = "PATH")]
    reference: Option<PathBuf>,
}

#[derive(Args)]
struct ImageArgs {
    #[command(flatten)]
    request: RequestArgs,

    /// Edit the reference image instead of generating from scratch
    #[arg(long)]
    edit: bool,
}

#[derive(Args)]
struct VideoArgs {
    #[command(flatten)]
    request: RequestArgs,
}

struct AppContext {
    config: Config,
    key_store: ApiKeyStore,
    input: Arc<LineInput>,
    timeout_secs: u64,
}

impl AppContext {
    /// Seed snapshot for a new session.
    fn seed(&self) -> Result<Snapshot> {
        let mut changes = SnapshotChanges::new();
        if let Some(ratio) = self.config.defaults.aspect_ratio.as_deref() {
            let ratio: AspectRatio = ratio.parse().context("defaults.aspect_ratio")?;
            changes = changes.aspect_ratio(ratio);
        }
        Ok(Snapshot::default().merged(&changes))
    }

    fn service(&self) -> Result<GenAiClient> {
        let provider = genai_rs::ProviderConfig::default()
            .with_base_url(self.config.base_url())
            .with_api_key_env(self.config.api_key_env())
            .with_key_store(self.key_store.clone());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(GenAiClient::new(provider)?.with_client(http))
    }

    fn orchestrator(&self, status: StatusPublisher) -> Result<Orchestrator> {
        let session = create_session_dir()?;
        let media_dir = self
            .config
            .defaults
            .output_dir
            .clone()
            .unwrap_or_else(|| session.media_dir());
        tracing::debug!(session = %session.id, media_dir = %media_dir.display(), "session ready");

        let flow = TerminalCredentialFlow::new(
            self.key_store.clone(),
            self.config.api_key_env(),
            self.input.clone(),
        );
        Ok(Orchestrator::new(
            Arc::new(self.service()?),
            CredentialGate::new(Arc::new(flow)),
            MediaStore::new(media_dir, self.config.product_prefix()),
            self.config.models.clone(),
        )
        .with_poll_interval(self.config.poll_interval())
        .with_status(status))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let format = resolve_format(cli.format.as_deref())?;
    let config = Config::load_with_profile(cli.profile.as_deref())?;
    let ctx = AppContext {
        config,
        key_store: ApiKeyStore::new(),
        input: LineInput::stdin(),
        timeout_secs: cli.timeout_secs,
    };

    match cli.command {
        Commands::Studio => handle_studio(&ctx, format).await,
        Commands::Image(args) => handle_image(&ctx, args, format).await,
        Commands::Video(args) => handle_video(&ctx, args, format).await,
        Commands::Tiers => handle_tiers(&ctx, format),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ATELIER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_format(flag: Option<&str>) -> Result<OutputFormat> {
    if let Some(fmt) = flag {
        return fmt.parse();
    }
    if env::var("ATELIER_AGENT").ok().as_deref() == Some("1") {
        return Ok(OutputFormat::Json);
    }
    Ok(OutputFormat::Text)
}
