use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crespo_parts::{
    config::{CONFIG_PATH, PREFS_PATH},
    fmt::{fmt_range, fmt_value},
    idle_stats::{read_idle_stats, reset_idle_stats},
    presets::find_preset,
    tuning_config::load_or_init,
    apply_and_commit, apply_preset, restore_all, Controller, JsonPrefs, SysfsStore, TunableError,
    Value,
};

#[derive(Parser, Debug)]
#[command(name = "crespo_parts", about = "Device tunables: boot restore and live control")]
struct Cli {
    /// Tuning table (created with built-in defaults when missing)
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Committed values
    #[arg(long, default_value = PREFS_PATH)]
    prefs: PathBuf,

    /// Prefix for every sysfs path (staging trees)
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Re-apply all committed values (run once after boot)
    Restore,
    /// Show every tunable with support state and current value
    List,
    /// Print the current value of one tunable
    Get { key: String },
    /// Write a value live; with --persist it is also committed
    Set {
        key: String,
        /// "50", "255 230 200" or on/off
        value: String,
        #[arg(long)]
        persist: bool,
    },
    /// List presets
    Presets,
    /// Apply a preset; with --persist every affected tunable is committed
    Preset {
        name: String,
        #[arg(long)]
        persist: bool,
    },
    /// Deep idle residency counters
    IdleStats {
        /// Zero the counters instead of printing them
        #[arg(long)]
        reset: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let cfg = load_or_init(&cli.config);
    let registry = match cfg.registry() {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("CFG: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let store = match &cli.root {
        Some(root) => SysfsStore::with_root(root),
        None => SysfsStore::new(),
    };
    let prefs = JsonPrefs::load(&cli.prefs);
    tracing::debug!(
        "crespo_parts: device {} | {} tunables | {} presets",
        cfg.device,
        registry.len(),
        cfg.presets.len()
    );
    let controller = Controller::new(registry, store, prefs);

    match run(&controller, &cfg.presets, cli.cmd) {
        Ok(code) => code,
        Err(e) if e.is_store_unavailable() => {
            tracing::warn!("STORE: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    controller: &Controller<SysfsStore, JsonPrefs>,
    presets: &[crespo_parts::Preset],
    cmd: Cmd,
) -> Result<ExitCode, TunableError> {
    match cmd {
        Cmd::Restore => {
            let report = restore_all(controller);
            // Individual failures are already logged; boot must go on.
            if !report.is_clean() {
                tracing::warn!("RESTORE: {} tunables not restored", report.failed.len());
            }
        }
        Cmd::List => {
            for desc in controller.registry().iter() {
                if controller.is_supported(&desc.key) {
                    let cur = controller.read_current(&desc.key)?;
                    println!(
                        "{:<30} {:<10} {}",
                        desc.key,
                        fmt_range(&desc.range),
                        fmt_value(desc, &cur)
                    );
                } else {
                    println!("{:<30} {:<10} (unsupported)", desc.key, fmt_range(&desc.range));
                }
            }
        }
        Cmd::Get { key } => {
            let desc = controller.descriptor(&key)?;
            if !controller.is_supported(&key) {
                return Err(TunableError::UnsupportedParameter(key));
            }
            println!("{}", fmt_value(desc, &controller.read_current(&key)?));
        }
        Cmd::Set { key, value, persist } => {
            let value: Value = value
                .parse()
                .map_err(|reason| TunableError::InvalidValue { key: key.clone(), reason })?;
            if persist {
                let session = controller.open(&key)?;
                session.set_live(value)?;
                let committed = session.commit()?;
                println!("{} = {} (saved)", key, committed);
            } else {
                let applied = controller.set_live(&key, value)?;
                println!("{} = {}", key, applied);
            }
        }
        Cmd::Presets => {
            for p in presets {
                println!("{:<22} {}", p.name, p.title);
            }
        }
        Cmd::Preset { name, persist } => {
            let Some(preset) = find_preset(presets, &name) else {
                tracing::error!("PRESET: no preset named `{}`", name);
                return Ok(ExitCode::FAILURE);
            };
            let report = if persist {
                apply_and_commit(controller, preset)?
            } else {
                apply_preset(controller, preset)?
            };
            for (key, v) in &report.applied {
                println!("{} = {}", key, v);
            }
            for key in &report.skipped {
                println!("{} (unsupported)", key);
            }
        }
        Cmd::IdleStats { reset } => {
            if reset {
                reset_idle_stats(controller.store())?;
                println!("idle stats reset");
            } else {
                print!("{}", read_idle_stats(controller.store())?);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
