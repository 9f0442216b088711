// src/main.rs
//! Clipboard history tracker
//!
//! Polls the clipboard in the background, prints accepted entries, and
//! takes console commands on stdin until `quit` or Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use clipwatch::config::TrackerConfig;
use clipwatch::console::{Console, ViewFocus};
use clipwatch::core::clipboard::SystemClipboard;
use clipwatch::core::history::HistoryStore;
use clipwatch::core::launcher::{LaunchCoordinator, SystemLauncher};
use clipwatch::core::poller::ClipboardPoller;
use clipwatch::core::status::{Shutdown, StatusBoard};
use clipwatch::listeners::{EventLogger, FileEventLogger, LaunchOnFlagged, LogFormat};

/// Command line interface for the clipboard tracker
#[derive(Debug, Parser)]
#[command(
    name = "clipwatch",
    about = "Clipboard history tracker with flagged-item alerts",
    long_about = "Keeps a rolling history of copied text, flags entries containing configured substrings and launches a companion app when one shows up."
)]
struct Args {
    /// TOML config file (defaults to $CLIPWATCH_CONFIG or the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Substring that flags an entry; repeat for several (replaces configured patterns)
    #[arg(short, long = "pattern")]
    patterns: Vec<String>,

    /// Shortcut or program to open on flagged entries
    #[arg(long)]
    target: Option<PathBuf>,

    /// Display name of the launched app
    #[arg(long)]
    app_name: Option<String>,

    /// Maximum entries kept in the general history
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    history_limit: Option<u64>,

    /// Delay between clipboard reads
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: Option<u64>,

    /// Length of the post-launch countdown
    #[arg(long)]
    countdown_secs: Option<u32>,

    /// Do not launch automatically when a flagged entry appears
    #[arg(long)]
    no_auto_launch: bool,

    /// Output format for recorded entries
    #[arg(long, default_value = "human", value_enum)]
    format: OutputFormat,

    /// Append recorded entries to this file as JSON lines
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Directory for `save` exports (defaults to the working directory)
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable lines
    Human,
    /// One JSON object per line
    Json,
}

impl From<OutputFormat> for LogFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => LogFormat::Human,
            OutputFormat::Json => LogFormat::Json,
        }
    }
}

impl Args {
    /// Apply command line overrides on top of the file configuration
    fn apply(&self, config: &mut TrackerConfig) {
        if !self.patterns.is_empty() {
            config.patterns = self.patterns.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(name) = &self.app_name {
            config.app_name = name.clone();
        }
        if let Some(limit) = self.history_limit {
            config.history_limit = usize::try_from(limit).unwrap_or(usize::MAX);
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(secs) = self.countdown_secs {
            config.countdown_secs = secs;
        }
        if self.no_auto_launch {
            config.auto_launch = false;
        }
    }
}

/// The main application state
struct WatcherApp {
    poller: ClipboardPoller,
    console: Console,
    shutdown: Shutdown,
    start_time: Instant,
}

impl WatcherApp {
    fn new(args: Args) -> Result<Self> {
        let start_time = Instant::now();

        Self::setup_logging(&args)?;

        info!("🚀 Starting clipwatch v{}", env!("CARGO_PKG_VERSION"));

        let mut config = TrackerConfig::load(args.config.as_deref())?;
        args.apply(&mut config);
        config.validate()?;
        info!(
            patterns = ?config.patterns,
            path = %config.target.display(),
            history_limit = config.history_limit,
            poll_interval_ms = config.poll_interval_ms,
            countdown_secs = config.countdown_secs,
            auto_launch = config.auto_launch,
            "loaded configuration"
        );
        if !config.target.exists() {
            warn!(path = %config.target.display(), "launch target does not exist yet");
        }

        let shutdown = Shutdown::new();
        let status = StatusBoard::new();
        let store = HistoryStore::with_config(config.history_config());
        let coordinator = Arc::new(LaunchCoordinator::new(
            config.launch_config(),
            Arc::new(SystemLauncher),
            Arc::new(status.clone()),
            shutdown.clone(),
        ));
        let view = ViewFocus::new();

        let mut poller = ClipboardPoller::new(
            Box::new(SystemClipboard::new()),
            store.clone(),
            Arc::new(status.clone()),
            shutdown.clone(),
            config.poller_config(),
        );
        poller.add_listener(EventLogger::new(args.format.into()));
        poller.add_listener(view.clone());
        if config.auto_launch {
            poller.add_listener(LaunchOnFlagged::new(Arc::clone(&coordinator)));
            info!("⭐ auto-launch enabled for flagged entries");
        }
        if let Some(path) = &args.output_file {
            poller.add_listener(FileEventLogger::new(path)?);
            info!("📁 File output enabled: {}", path.display());
        }

        let export_dir = match args.export_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to resolve working directory")?,
        };

        let console = Console::new(
            store,
            coordinator,
            status,
            Box::new(SystemClipboard::new()),
            view,
            export_dir,
            config.auto_launch,
        );

        Ok(Self {
            poller,
            console,
            shutdown,
            start_time,
        })
    }

    async fn run(mut self) -> Result<()> {
        self.poller
            .start()
            .context("Failed to start clipboard monitoring")?;

        println!("Type 'help' for commands. Press Ctrl+C or type 'quit' to stop.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line.context("Failed to read console input")? {
                        Some(line) => {
                            let reply = self.console.handle_line(&line);
                            if !reply.text.is_empty() {
                                println!("{}", reply.text);
                            }
                            if reply.quit {
                                break;
                            }
                        }
                        // stdin closed: keep watching until Ctrl+C
                        None => {
                            tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
                            break;
                        }
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl+C")?;
                    break;
                }
            }
        }

        self.stop();
        Ok(())
    }

    /// Graceful shutdown
    fn stop(&mut self) {
        info!("🛑 Initiating graceful shutdown...");
        self.shutdown.trigger();
        self.poller.stop();

        let elapsed = self.start_time.elapsed();
        info!("📊 Session completed. Runtime: {:.2}s", elapsed.as_secs_f64());
    }

    /// Set up logging based on verbosity level; logs go to stderr so the
    /// console output on stdout stays readable.
    fn setup_logging(config: &Args) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let level = match config.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(config.verbose > 1)
            .with_thread_ids(config.verbose > 2)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let app = WatcherApp::new(args).context("Failed to initialize clipwatch")?;

    app.run().await.context("Application runtime error")?;

    Ok(())
}
