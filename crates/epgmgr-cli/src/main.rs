//! epgmgr - XMLTV electronic program guide editor.

/// Application configuration (TOML).
mod config;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use epgmgr_core::{EpgError, EpgStore, ProgrammeUpdate, StaleProgrammeSweeper};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path, resolve_guide_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Override the guide file from config.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Write a default config file if none exists.
    Init,
    /// Manage channels.
    Channel(ChannelCommand),
    /// Manage programmes.
    Programme(ProgrammeCommand),
    /// Remove programmes older than the retention window.
    Sweep(SweepArgs),
    /// Print the guide as XMLTV.
    Show,
}

/// Arguments for the `channel` subcommand.
#[derive(clap::Args)]
struct ChannelCommand {
    /// Channel subcommand to run.
    #[command(subcommand)]
    command: ChannelSubcommands,
}

/// Available channel subcommands.
#[derive(Subcommand)]
enum ChannelSubcommands {
    /// Add a channel.
    Add(ChannelAddArgs),
    /// Remove a channel and all of its programmes.
    Remove(ChannelRemoveArgs),
    /// Update a channel. Omitting --icon removes the icon.
    Update(ChannelUpdateArgs),
}

/// Arguments for the `channel add` subcommand.
#[derive(clap::Args)]
struct ChannelAddArgs {
    /// Unique channel ID (e.g. "1.news").
    #[arg(long, required = true)]
    id: String,
    /// Display name.
    #[arg(long, required = true)]
    name: String,
    /// Icon URL.
    #[arg(long)]
    icon: Option<String>,
}

/// Arguments for the `channel remove` subcommand.
#[derive(clap::Args)]
struct ChannelRemoveArgs {
    /// Channel ID.
    #[arg(long, required = true)]
    id: String,
}

/// Arguments for the `channel update` subcommand.
#[derive(clap::Args)]
struct ChannelUpdateArgs {
    /// Channel ID.
    #[arg(long, required = true)]
    id: String,
    /// New display name.
    #[arg(long)]
    name: Option<String>,
    /// New icon URL.
    #[arg(long)]
    icon: Option<String>,
}

/// Arguments for the `programme` subcommand.
#[derive(clap::Args)]
struct ProgrammeCommand {
    /// Programme subcommand to run.
    #[command(subcommand)]
    command: ProgrammeSubcommands,
}

/// Available programme subcommands.
#[derive(Subcommand)]
enum ProgrammeSubcommands {
    /// Add a programme.
    Add(ProgrammeAddArgs),
    /// Remove a programme.
    Remove(ProgrammeRemoveArgs),
    /// Update a programme. Omitting --category resets the category.
    Update(ProgrammeUpdateArgs),
}

/// Arguments for the `programme add` subcommand.
#[derive(clap::Args)]
struct ProgrammeAddArgs {
    /// Channel ID.
    #[arg(long, required = true)]
    channel: String,
    /// Start time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    start: String,
    /// Stop time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    stop: String,
    /// Title.
    #[arg(long, required = true)]
    title: String,
    /// Description.
    #[arg(long)]
    desc: Option<String>,
    /// Category (default from config).
    #[arg(long)]
    category: Option<String>,
}

/// Arguments for the `programme remove` subcommand.
#[derive(clap::Args)]
struct ProgrammeRemoveArgs {
    /// Channel ID.
    #[arg(long, required = true)]
    channel: String,
    /// Start time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    start: String,
    /// Stop time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    stop: String,
}

/// Arguments for the `programme update` subcommand.
#[derive(clap::Args)]
struct ProgrammeUpdateArgs {
    /// Channel ID.
    #[arg(long, required = true)]
    channel: String,
    /// Current start time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    start: String,
    /// Current stop time ("YYYY-MM-DD.HH:MM.+00").
    #[arg(long, required = true)]
    stop: String,
    /// New start time.
    #[arg(long)]
    new_start: Option<String>,
    /// New stop time.
    #[arg(long)]
    new_stop: Option<String>,
    /// New title.
    #[arg(long)]
    title: Option<String>,
    /// New description.
    #[arg(long)]
    desc: Option<String>,
    /// New category.
    #[arg(long)]
    category: Option<String>,
}

/// Arguments for the `sweep` subcommand.
#[derive(clap::Args)]
struct SweepArgs {
    /// Retention window in days (default from config).
    #[arg(long)]
    days: Option<u32>,
}

/// Resolved config and guide file for one invocation.
struct GuideContext {
    config_path: PathBuf,
    config: AppConfig,
    guide_path: PathBuf,
}

impl GuideContext {
    /// Resolves config and the guide path from CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config path cannot be resolved or the config
    /// fails to load.
    fn resolve(dir: Option<&PathBuf>, file: Option<PathBuf>) -> Result<Self> {
        let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
        let config = AppConfig::load(&config_path).context("failed to load config")?;
        let guide_path = resolve_guide_path(file, &config_path, &config.guide.path);
        Ok(Self {
            config_path,
            config,
            guide_path,
        })
    }

    /// Loads the guide, or an empty one if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the guide file exists but cannot be loaded.
    fn load_store(&self) -> Result<EpgStore> {
        let options = self.config.store_options();
        if !self.guide_path.exists() {
            tracing::debug!(path = %self.guide_path.display(), "guide not found, starting empty");
            return Ok(EpgStore::with_options(options));
        }
        EpgStore::load_from_file(&self.guide_path, options)
    }

    /// Loads the guide, applies `op`, and writes the guide back.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, the operation, or saving fails.
    fn edit<F>(&self, action: &str, op: F) -> Result<()>
    where
        F: FnOnce(&mut EpgStore) -> std::result::Result<(), EpgError>,
    {
        let mut store = self.load_store()?;
        op(&mut store).with_context(|| format!("failed to {action}"))?;
        self.save_store(&store)
    }

    /// Writes the guide, creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or the write fails.
    fn save_store(&self, store: &EpgStore) -> Result<()> {
        if let Some(parent) = self.guide_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        store.save_to_file(&self.guide_path)
    }
}

/// Runs the `init` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be written.
#[instrument(skip_all)]
fn run_init(guide: &GuideContext) -> Result<()> {
    if guide.config_path.exists() {
        tracing::info!("Config already exists: {}", guide.config_path.display());
        return Ok(());
    }
    AppConfig::default()
        .save(&guide.config_path)
        .context("failed to write default config")?;
    tracing::info!("Wrote default config: {}", guide.config_path.display());
    Ok(())
}

/// Runs the `channel` subcommands.
///
/// # Errors
///
/// Returns an error if the guide cannot be loaded or saved, or the store
/// rejects the change.
#[instrument(skip_all)]
fn run_channel(command: &ChannelSubcommands, guide: &GuideContext) -> Result<()> {
    match command {
        ChannelSubcommands::Add(args) => {
            guide.edit("add channel", |store| {
                store.add_channel(&args.id, &args.name, args.icon.as_deref())
            })?;
            tracing::info!("Added channel {}", args.id);
        }
        ChannelSubcommands::Remove(args) => {
            guide.edit("remove channel", |store| store.remove_channel(&args.id))?;
            tracing::info!("Removed channel {}", args.id);
        }
        ChannelSubcommands::Update(args) => {
            guide.edit("update channel", |store| {
                store.update_channel(&args.id, args.name.as_deref(), args.icon.as_deref())
            })?;
            tracing::info!("Updated channel {}", args.id);
        }
    }
    Ok(())
}

/// Runs the `programme` subcommands.
///
/// # Errors
///
/// Returns an error if the guide cannot be loaded or saved, or the store
/// rejects the change.
#[instrument(skip_all)]
fn run_programme(command: &ProgrammeSubcommands, guide: &GuideContext) -> Result<()> {
    match command {
        ProgrammeSubcommands::Add(args) => {
            guide.edit("add programme", |store| {
                store.add_programme(
                    &args.channel,
                    &args.start,
                    &args.stop,
                    &args.title,
                    args.desc.as_deref(),
                    args.category.as_deref(),
                )
            })?;
            tracing::info!("Added programme {} on {}", args.title, args.channel);
        }
        ProgrammeSubcommands::Remove(args) => {
            guide.edit("remove programme", |store| {
                store.remove_programme(&args.channel, &args.start, &args.stop)
            })?;
            tracing::info!("Removed programme on {} at {}", args.channel, args.start);
        }
        ProgrammeSubcommands::Update(args) => {
            let update = ProgrammeUpdate {
                new_start: args.new_start.as_deref(),
                new_stop: args.new_stop.as_deref(),
                title: args.title.as_deref(),
                desc: args.desc.as_deref(),
                category: args.category.as_deref(),
            };
            guide.edit("update programme", |store| {
                store.update_programme(&args.channel, &args.start, &args.stop, &update)
            })?;
            tracing::info!("Updated programme on {} at {}", args.channel, args.start);
        }
    }
    Ok(())
}

/// Runs the `sweep` subcommand.
///
/// # Errors
///
/// Returns an error if the guide cannot be loaded or saved.
#[instrument(skip_all)]
fn run_sweep(args: &SweepArgs, guide: &GuideContext) -> Result<()> {
    let days = args.days.unwrap_or(guide.config.sweeper.retention_days);
    let mut store = guide.load_store()?;

    let removed = StaleProgrammeSweeper::new(days).sweep(&mut store);
    guide.save_store(&store)?;

    tracing::info!(
        "Removed {} stale programmes ({} remaining)",
        removed,
        store.programmes().len()
    );
    Ok(())
}

/// Runs the `show` subcommand.
///
/// # Errors
///
/// Returns an error if the guide cannot be loaded or written to stdout.
#[instrument(skip_all)]
fn run_show(guide: &GuideContext) -> Result<()> {
    let store = guide.load_store()?;
    let text = store.to_text()?;
    std::io::stdout()
        .lock()
        .write_all(text.as_bytes())
        .context("failed to write guide to stdout")
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let guide = GuideContext::resolve(cli.dir.as_ref(), cli.file)?;
    match cli.command {
        Commands::Init => run_init(&guide),
        Commands::Channel(cmd) => run_channel(&cmd.command, &guide),
        Commands::Programme(cmd) => run_programme(&cmd.command, &guide),
        Commands::Sweep(args) => run_sweep(&args, &guide),
        Commands::Show => run_show(&guide),
    }
}
