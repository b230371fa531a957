//! Regstore CLI - inspect and move stored test dependencies

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use regstore::config::{self, ExternalConfig, RegstoreConfig};
use regstore::storage::FileStore;
use regstore::ui::{self, Icons};
use regstore::{resolver, DependencyStore, LoadOutcome, Mode, SaveOutcome, Storer, UnitKey};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "regstore")]
#[command(version)]
#[command(about = "Dependency persistence for selective test execution")]
#[command(long_about = r#"
Regstore keeps, for every test class or method, the resources it depended on
and their fingerprints, so a later run can skip tests whose dependencies did
not change.

Keys are `com.example.FooTest` or `com.example.FooTest#testBar`.

Example usage:
  regstore init
  regstore show --key "com.example.FooTest#testBar"
  regstore locate --key "com.example.FooTest#testBar"
  regstore push --key com.example.FooTest
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default regstore.toml and ignore the data directory in git
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Print the dependencies stored for a test unit
    Show {
        /// Test unit key (`Class` or `Class#method`)
        #[arg(short, long)]
        key: String,

        /// Storage directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Storage mode override (txt, prefix_txt, bin, time_txt)
        #[arg(short, long)]
        mode: Option<String>,

        /// Read from the configured external store instead of files
        #[arg(short, long)]
        external: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show which file name a test unit is stored under
    Locate {
        /// Test unit key (`Class` or `Class#method`)
        #[arg(short, long)]
        key: String,

        /// Storage directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Copy a test unit's file-store dependencies to the external store
    Push {
        /// Test unit key (`Class` or `Class#method`)
        #[arg(short, long)]
        key: String,

        /// Storage directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// List storage modes and their magic sequences
    Modes,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let settings = config::load_config(Some(config_path.as_path()))?.unwrap_or_default();

    match cli.command {
        Commands::Init { force } => {
            let fresh = RegstoreConfig {
                external: Some(ExternalConfig::default()),
                ..RegstoreConfig::default()
            };
            config::write_config(&config_path, &fresh, force)?;
            if let Some(external) = &fresh.external {
                config::ensure_parent_dir(&external.database)?;
            }
            config::ensure_gitignore(&std::env::current_dir()?)?;
            ui::success(&format!("Wrote {}", config_path.display()));
        }

        Commands::Show { key, dir, mode, external, json } => {
            let mut settings = settings;
            if let Some(mode) = mode {
                // Command-line modes parse strictly; only config falls back to txt.
                settings.mode = Some(mode.parse::<Mode>()?.as_str().to_string());
            }
            let storer = Storer::from_config(&settings);
            let dir = dir.unwrap_or_else(|| settings.directory.clone());
            let unit = UnitKey::parse(&key);

            let (outcome, saved_at) = if external {
                (storer.external_load_outcome(&unit), None)
            } else {
                let store = storer.file_store(&dir);
                (store.load(&unit), store.saved_at(&unit))
            };

            let (status, records) = match outcome {
                LoadOutcome::Loaded(records) => ("loaded", records),
                LoadOutcome::Absent => ("absent", Default::default()),
                LoadOutcome::Failed(e) => {
                    ui::warn(&format!("Stored data for {} is unreadable: {}", unit, e));
                    ("failed", Default::default())
                }
            };

            if json {
                let data = serde_json::json!({
                    "key": unit.full_name(),
                    "mode": storer.mode().as_str(),
                    "status": status,
                    "saved_at": saved_at,
                    "records": regstore::regdata::sorted(&records),
                });
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else if records.is_empty() {
                println!("{} No dependencies stored for {} ({})", Icons::EMPTY, unit, status);
            } else {
                ui::header(&format!("{} ({} dependencies)", unit, records.len()));
                if let Some(millis) = saved_at {
                    ui::info("Saved at (ms since epoch)", &millis.to_string());
                }
                println!("{}", ui::record_table(&records));
            }
        }

        Commands::Locate { key, dir } => {
            let dir = dir.unwrap_or_else(|| settings.directory.clone());
            let unit = UnitKey::parse(&key);
            let store = FileStore::new(&dir, Mode::from_config(settings.mode.as_deref()));

            ui::section("Candidate names");
            for (step, name) in resolver::fallback_names(&unit).iter().enumerate() {
                ui::summary_row(&format!("{}.", step + 1), name);
            }

            match store.locate(&unit) {
                Some(path) => ui::info("Stored at", &path.display().to_string()),
                None => println!("{} Nothing stored for {} in {}", Icons::EMPTY, unit, dir.display()),
            }
        }

        Commands::Push { key, dir } => {
            let storer = Storer::from_config(&settings);
            let Some(backend) = storer.external_backend() else {
                anyhow::bail!("no external store configured in {}", config_path.display());
            };
            let dir = dir.unwrap_or_else(|| settings.directory.clone());
            let unit = UnitKey::parse(&key);

            let records = match storer.load_outcome(&dir, &unit) {
                LoadOutcome::Loaded(records) => records,
                LoadOutcome::Absent => anyhow::bail!("nothing stored for {} in {}", unit, dir.display()),
                LoadOutcome::Failed(e) => return Err(e.into()),
            };

            match storer.external_save_outcome(&unit, &records) {
                SaveOutcome::Saved { records: stored } => {
                    ui::success(&format!(
                        "{} Pushed {} of {} dependencies of {} to the {} store",
                        Icons::DATABASE, stored, records.len(), unit, backend
                    ));
                }
                SaveOutcome::Disabled => ui::warn("Saves are disabled (dependencies_save = false)"),
                SaveOutcome::Skipped => ui::warn("External store unavailable, nothing pushed"),
                SaveOutcome::Failed(e) => return Err(e.into()),
            }
        }

        Commands::Modes => {
            let rows: Vec<(&str, &str)> = Mode::all()
                .iter()
                .map(|mode| (mode.as_str(), mode.magic()))
                .collect();
            println!("{}", ui::stats_table(&rows));

            let file = FileStore::new(&settings.directory, Mode::from_config(settings.mode.as_deref()));
            ui::info("Active mode", file.mode().as_str());
            ui::info(&format!("{} Directory", Icons::FILE), &file.dir().display().to_string());
            if let Some(external) = &settings.external {
                ui::info(&format!("{} External", Icons::LINK), &format!("{:?}", external.backend));
            }
        }
    }

    Ok(())
}
