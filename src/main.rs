// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use gesture_booth::config::BoothConfig;
use gesture_booth::constants::app_info;
use gesture_booth::engine::{BoothEngine, Collaborators};
use gesture_booth::storage;
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "gesture-booth")]
#[command(about = "Photo booth that fires on a held peace sign and a smile")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/gesture-booth/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep a PNG of every capture (default: ~/Pictures/gesture-booth)
    #[arg(long, global = true)]
    archive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk in the terminal (default)
    Terminal,

    /// Run without a UI, printing the session log
    Headless {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },

    /// Upload an image to the share host and print its links
    Upload {
        /// Image file to upload
        file: PathBuf,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to disk
        #[arg(short, long)]
        write: bool,

        /// Destination for --write (default: the config location)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Terminal));

    // The terminal UI owns stdout, so its logs go to a file
    // Set RUST_LOG to control the level, e.g. RUST_LOG=gesture_booth=debug
    init_logging(terminal_mode)?;

    let mut config = BoothConfig::load_or_default(cli.config.as_deref())?;
    if cli.archive && config.archive_dir.is_none() {
        config.archive_dir = Some(storage::default_archive_directory());
    }

    match cli.command {
        None | Some(Commands::Terminal) => run_terminal(config),
        Some(Commands::Headless { duration }) => {
            build_runtime()?.block_on(cli::run_headless(config, duration))
        }
        Some(Commands::Upload { file }) => {
            build_runtime()?.block_on(cli::upload_file(&config, &file))
        }
        Some(Commands::Config { write, output }) => cli::show_config(&config, write, output),
    }
}

/// The engine is a single task; everything it spawns shares one thread
fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn init_logging(to_file: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    let log_dir = dirs::cache_dir().map(|dir| dir.join(app_info::APP_DIR));
    match log_dir {
        Some(dir) if to_file => {
            std::fs::create_dir_all(&dir)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("booth.log"))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        _ if to_file => {
            // No cache directory: drop logs rather than corrupt the screen
            builder.with_writer(std::io::sink).init();
        }
        _ => builder.init(),
    }
    Ok(())
}

fn run_terminal(config: BoothConfig) -> Result<(), Box<dyn std::error::Error>> {
    let collaborators = Collaborators::from_config(&config)?;
    let runtime = build_runtime()?;

    let (engine, handle) = {
        let _guard = runtime.enter();
        BoothEngine::new(config, collaborators)
    };

    // The terminal loop blocks on input, so the engine gets its own thread
    let engine_thread = std::thread::Builder::new()
        .name("booth-engine".into())
        .spawn(move || runtime.block_on(engine.run()))?;

    let result = gesture_booth::terminal::run(handle.clone());
    handle.shutdown();
    if engine_thread.join().is_err() {
        return Err("booth engine thread panicked".into());
    }
    result
}
