//! DualView entry point.
//!
//! ```text
//! dualview [--config PATH] keymap [--entry NAME]
//! dualview [--config PATH] sessions
//! dualview [--config PATH] telemetry [--entry NAME]
//! ```
//!
//! The display backend and the remote-framebuffer protocol are platform
//! collaborators. This binary wires the headless display and a connector
//! that refuses every attempt, which is enough to inspect key bindings and
//! saved entries and to run the telemetry services on their own.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dualview::application::event_loop::{EventLoop, LoopParts};
use dualview::infrastructure::display::headless::HeadlessDisplay;
use dualview::infrastructure::input_capture::NoInput;
use dualview::infrastructure::network::UdpTelemetryFactory;
use dualview::infrastructure::remote::UnavailableConnector;
use dualview::infrastructure::storage::config::{self, AppConfig};
use dualview::infrastructure::storage::keymap_file::{self, BindingSource};
use dualview_core::keymap::keysym;
use dualview_core::ResolvedCode;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Dual-session remote-display viewer.
#[derive(Debug, Parser)]
#[command(name = "dualview", version)]
struct Cli {
    /// Configuration file; defaults to the platform config directory.
    #[arg(long, global = true, env = "DUALVIEW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the resolved key binding table, writing the defaults if needed.
    Keymap {
        /// Saved entry whose binding file should take precedence.
        #[arg(long)]
        entry: Option<String>,
    },
    /// List saved session entries.
    Sessions,
    /// Run the telemetry services without display sessions.
    Telemetry {
        /// Saved entry whose host the push client targets.
        #[arg(long)]
        entry: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = load_config(cli.config.as_deref())?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();
    info!(config = %config_path.display(), "DualView starting");

    match cli.command {
        Command::Keymap { entry } => print_keymap(&config, &config_path, entry.as_deref()),
        Command::Sessions => {
            print_sessions(&config);
            Ok(())
        }
        Command::Telemetry { entry } => run_telemetry(&config, &config_path, entry.as_deref()),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<(AppConfig, PathBuf)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_file_path().context("cannot locate the configuration directory")?,
    };
    let config = config::load_config_from(&path)
        .with_context(|| format!("cannot load configuration from {}", path.display()))?;
    Ok((config, path))
}

fn keymap_dir(config: &AppConfig, config_path: &Path) -> PathBuf {
    config.general.keymap_dir.clone().unwrap_or_else(|| {
        config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    })
}

fn print_keymap(config: &AppConfig, config_path: &Path, entry: Option<&str>) -> anyhow::Result<()> {
    let dir = keymap_dir(config, config_path);
    let loaded = keymap_file::load_bindings(&dir, entry).context("cannot load key bindings")?;
    match &loaded.source {
        BindingSource::Entry(path) | BindingSource::Shared(path) => {
            println!("# bindings from {}", path.display());
        }
        BindingSource::Defaults { persisted: Some(path) } => {
            println!("# default bindings, written to {}", path.display());
        }
        BindingSource::Defaults { persisted: None } => println!("# default bindings"),
    }
    println!("{:<12} {:<24} {}", "INPUT", "BASE", "META");
    for row in loaded.table.entries() {
        println!(
            "{:<12} {:<24} {}",
            row.name(),
            describe(row.base),
            describe(row.meta)
        );
    }
    Ok(())
}

fn describe(code: ResolvedCode) -> String {
    match code {
        ResolvedCode::Unbound => "-".to_string(),
        ResolvedCode::Control(control) => format!("<{control:?}>"),
        ResolvedCode::PointerButton(n) => format!("<pointer {n}>"),
        ResolvedCode::KeySym(sym) => match keysym::describe(sym) {
            Some(name) => format!("{name} (0x{sym:04X})"),
            None => format!("0x{sym:04X}"),
        },
    }
}

fn print_sessions(config: &AppConfig) {
    if config.sessions.is_empty() {
        println!("no saved sessions");
        return;
    }
    for entry in &config.sessions {
        let bottom = if entry.enable_bottom {
            format!(" + bottom :{}", entry.bottom_port)
        } else {
            String::new()
        };
        println!("{:<16} {}:{}{}", entry.name, entry.host, entry.port, bottom);
    }
}

fn run_telemetry(config: &AppConfig, config_path: &Path, entry: Option<&str>) -> anyhow::Result<()> {
    let host = match entry {
        Some(name) => config
            .session(name)
            .map(|e| e.host.clone())
            .with_context(|| format!("no saved session named {name:?}"))?,
        None => "127.0.0.1".to_string(),
    };
    let bindings = keymap_file::load_bindings(&keymap_dir(config, config_path), entry)
        .context("cannot load key bindings")?
        .table;

    let parts = LoopParts {
        input: Box::new(NoInput),
        display: Box::new(HeadlessDisplay::new()),
        connector: Box::new(UnavailableConnector),
        telemetry: Box::new(UdpTelemetryFactory),
        sensor: None,
    };
    let mut event_loop = EventLoop::new(parts, config, bindings);
    event_loop.open_telemetry_only(&host);
    if event_loop.active_work() == 0 {
        anyhow::bail!("no telemetry service is enabled or none could be started");
    }

    let exit = event_loop.run();
    event_loop.close();
    info!(?exit, "DualView stopped");
    Ok(())
}
