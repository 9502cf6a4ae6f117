//! CLI entry point for rust-cube
//!
//! ```bash
//! rust-cube list
//! rust-cube check heart
//! rust-cube run heart --interval-ms 250 --timeout-secs 60
//! rust-cube --mock run heart
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cube_core::DeviceLink;
use cube_driver_mock::MockCube;
use cube_driver_yeelight::YeelightCube;
use cube_playback::Player;
use rust_cube::{logging, runner, CubeConfig, ScriptLibrary};

#[derive(Parser)]
#[command(name = "rust-cube")]
#[command(about = "Play animation scripts on a Yeelight Cube", long_about = None)]
struct Cli {
    /// Configuration file (default: config/cube.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Drive an in-memory lamp instead of the real device
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available scripts
    List,

    /// Compile a script and print its frames
    Check {
        /// Script name (file stem)
        name: String,
    },

    /// Play a script until Ctrl+C or the timeout
    Run {
        /// Script name (file stem)
        name: String,

        /// Milliseconds between frames; 0 shows the first frame only
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many seconds; 0 plays until Ctrl+C
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CubeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init_from_config(&config)?;

    let require_device = matches!(cli.command, Commands::Run { .. }) && !cli.mock;
    config.validate(require_device)?;

    let library = ScriptLibrary::from_config(&config);

    match cli.command {
        Commands::List => list_scripts(&library),
        Commands::Check { name } => check_script(&library, &name),
        Commands::Run {
            name,
            interval_ms,
            timeout_secs,
        } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.playback.interval());
            let timeout = timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.playback.timeout());
            run_script(&config, &library, &name, interval, timeout, cli.mock).await
        }
    }
}

fn list_scripts(library: &ScriptLibrary) -> Result<()> {
    let names = library
        .list()
        .with_context(|| format!("Failed to read {}", library.dir().display()))?;
    if names.is_empty() {
        println!("No scripts in {}", library.dir().display());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn check_script(library: &ScriptLibrary, name: &str) -> Result<()> {
    let script = library.load(name)?;
    println!("✅ {}: {} frame(s)", script.name(), script.len());
    for (index, frame) in script.frames().iter().enumerate() {
        println!();
        println!("frame {}", index);
        println!("{}", frame);
    }
    Ok(())
}

async fn run_script(
    config: &CubeConfig,
    library: &ScriptLibrary,
    name: &str,
    interval: Duration,
    timeout: Duration,
    mock: bool,
) -> Result<()> {
    let script = Arc::new(library.load(name)?);

    let link: Arc<dyn DeviceLink> = if mock {
        tracing::info!("Using the mock lamp");
        Arc::new(MockCube::new())
    } else {
        Arc::new(YeelightCube::from_config(&config.device)?)
    };
    let player = Player::new(link);

    println!(
        "▶️  Playing '{}' ({} frames, every {:?}) - press Ctrl+C to stop",
        script.name(),
        script.len(),
        interval
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };
    let report = runner::play(&player, script, interval, timeout, shutdown).await?;

    println!(
        "⏹  {} ({}): {} frame(s) rendered, {} failed",
        report.script, report.reason, report.frames_rendered, report.render_failures
    );
    if let Some(error) = report.power_off_error {
        eprintln!("❌ The lamp may still be on: {}", error);
    }
    Ok(())
}
