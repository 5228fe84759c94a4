//! Mobile E2E command line
//!
//! Checks the local toolchain and runs one-off commands against the
//! configured device. The Cucumber scenarios themselves run through
//! `cargo test -p mobile-e2e-suite`.

mod doctor;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mobile_e2e_core::hooks::app_id;
use mobile_e2e_core::reporting::write_run_metadata;
use mobile_e2e_core::{
    AdbShell, AppiumConnector, BasePage, CapabilitySet, DeviceControl, DriverManager, ForceStop, Platform,
    SuiteConfig,
};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "mobile-e2e")]
#[command(about = "Appium mobile end-to-end suite tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Target platform, overrides `platformName` and the config file
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Suite configuration file (default: mobile-e2e.toml)
    #[arg(short, long, global = true, env = "E2E_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Appium endpoint, overrides `appium.server_url`
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check Xcode, Android SDK, Appium and the server endpoint
    Doctor,
    /// Print the capability payload for the resolved platform
    Capabilities,
    /// Open a session, read the window size, save a screenshot and quit
    Smoke {
        /// Where to write the screenshot
        #[arg(short, long, default_value = "smoke.png")]
        output: PathBuf,
    },
    /// Force-terminate the app under test
    ForceStop,
    /// Write Allure environment, categories and executor files
    AllureEnv {
        /// Results directory (default: reporting.allure_results_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Shut down simulators and emulators
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Doctor => {
            let config = load_config(&cli)?;
            doctor::run(&config).await?;
        }
        Commands::Capabilities => {
            let config = load_config(&cli)?;
            let platform = config.platform()?;
            let payload = CapabilitySet::build(platform, &config)?.session_payload()?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Smoke { output } => {
            let config = load_config(&cli)?;
            smoke(config, output).await?;
        }
        Commands::ForceStop => {
            let config = load_config(&cli)?;
            force_stop(&config).await?;
        }
        Commands::AllureEnv { dir } => {
            let config = load_config(&cli)?;
            let platform = config.platform()?;
            let dir = dir.clone().unwrap_or_else(|| config.reporting.allure_results_dir.clone());
            for path in write_run_metadata(&dir, &config, platform)? {
                println!("{}", path.display());
            }
        }
        Commands::Cleanup => cleanup_environment().await,
    }

    Ok(())
}

/// Setup logging; `RUST_LOG` wins over `--verbose`
fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<SuiteConfig> {
    if let Some(path) = &cli.config {
        info!("Loading configuration from: {}", path.display());
    }
    SuiteConfig::load_with_overrides(cli.config.as_deref(), cli.platform, cli.server_url.clone())
        .context("Failed to load suite configuration")
}

async fn smoke(config: SuiteConfig, output: &Path) -> anyhow::Result<()> {
    let timing = config.timing.clone();
    let mut manager = DriverManager::new(Arc::new(config), Arc::new(AppiumConnector::new()));
    let session = manager.acquire().await?;
    info!("Session {} opened on {}", session.id(), session.platform());

    let result = async {
        let size = session.remote().window_size().await?;
        println!("Window size: {}x{}", size.width, size.height);
        let png = BasePage::new(Arc::clone(&session), &timing).screenshot().await?;
        tokio::fs::write(output, &png)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("Screenshot saved to {} ({} bytes)", output.display(), png.len());
        anyhow::Ok(())
    }
    .await;

    manager.release().await;
    result
}

async fn force_stop(config: &SuiteConfig) -> anyhow::Result<()> {
    let platform = config.platform()?;
    let app = app_id(config, platform);
    let shell = AdbShell::discover(config.android.udid.clone(), config.android.adb_exec_timeout());
    match shell.force_stop(platform, app).await? {
        ForceStop::Stopped => println!("{app} stopped"),
        ForceStop::Skipped => println!("Force-stop of {app} is not available on {platform}"),
    }
    Ok(())
}

/// Best-effort shutdown of every simulator and emulator on this host
async fn cleanup_environment() {
    println!("Shutting down iOS simulators...");
    match Command::new("xcrun").args(["simctl", "shutdown", "all"]).output().await {
        Ok(output) if output.status.success() => println!("iOS simulators shut down"),
        Ok(output) => warn!("simctl shutdown failed: {}", String::from_utf8_lossy(&output.stderr).trim()),
        Err(e) => warn!("xcrun not available: {}", e),
    }

    println!("Stopping Android emulators...");
    let adb = mobile_e2e_core::device::android_tool_path("adb");
    match Command::new(&adb).args(["emu", "kill"]).output().await {
        Ok(output) if output.status.success() => println!("Android emulators stopped"),
        Ok(output) => warn!("adb emu kill failed: {}", String::from_utf8_lossy(&output.stderr).trim()),
        Err(e) => warn!("{} not available: {}", adb.display(), e),
    }

    println!("Cleanup complete!");
}
