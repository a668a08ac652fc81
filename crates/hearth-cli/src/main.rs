mod logging;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hearth_home::{
    installed_versions, load_config, read_stamp, AppHome, CleanupOutcome, DirAssets, HomeConfig,
    HomeLayout, PrepareReport,
};
use hearth_version::{compare, generate_date_commit_version, DateEncoding, Version};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

const DEFAULT_APP_NAME: &str = "hearth";

#[derive(Parser)]
#[command(name = "hearth", version, about = "Provision versioned application assets into a home directory")]
struct Cli {
    /// Log level (`info`, `debug`, ...) or a full filter directive string
    #[arg(long, global = true, default_value = logging::DEFAULT_LEVEL)]
    log_level: String,
    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract assets for a version into the home and prune old versions
    Init(InitArgs),
    /// Show the provisioned version and installed asset versions
    Status(StatusArgs),
    /// Version utilities
    Version(VersionArgs),
}

#[derive(Args)]
struct HomeArgs {
    /// Home directory (defaults to `$HEARTH_HOME`, then `~/.config/<name>`)
    #[arg(long)]
    home: Option<PathBuf>,
    /// Application name used for the default home directory
    #[arg(long, default_value = DEFAULT_APP_NAME)]
    name: String,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

impl HomeArgs {
    fn resolve_home(&self) -> PathBuf {
        match &self.home {
            Some(home) => home.clone(),
            None => HomeConfig::from_env().resolve(&self.name),
        }
    }
}

#[derive(Args)]
struct InitArgs {
    /// Directory holding the asset tree to provision
    #[arg(long)]
    assets: PathBuf,
    /// Version the assets belong to
    #[arg(long)]
    version: String,
    #[command(flatten)]
    home: HomeArgs,
}

#[derive(Args)]
struct StatusArgs {
    #[command(flatten)]
    home: HomeArgs,
}

#[derive(Args)]
struct VersionArgs {
    #[command(subcommand)]
    command: VersionCommand,
}

#[derive(Subcommand)]
enum VersionCommand {
    /// Print a `MAJOR.YYMMDD.HMM-H<commit>` version for the repository head
    Generate {
        #[arg(long)]
        major: u64,
        /// Repository path (defaults to current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Print -1, 0 or 1 as A sorts before, equal to, or after B
    Compare { a: String, b: String },
    /// Print the calendar date encoded in a version's minor component
    Date {
        version: String,
        /// Decode a six digit `YYMMDD` minor (synthetic versions)
        #[arg(long)]
        short: bool,
    },
}

/// `<home>/config.yaml` as understood by the CLI.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliSettings {
    /// Prefer JSON output even without `--json`.
    json: bool,
}

#[derive(Serialize)]
struct InitOutput<'a> {
    home: PathBuf,
    version: &'a Version,
    #[serde(flatten)]
    report: &'a PrepareReport,
}

#[derive(Serialize)]
struct StatusOutput {
    home: PathBuf,
    provisioned_version: Option<String>,
    installed: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init(args) => {
            let version = Version::parse(&args.version)?;
            let home = args.home.resolve_home();
            let app = AppHome::new(
                args.home.name.clone(),
                &home,
                version,
                DirAssets::new(&args.assets),
            );
            let (report, settings) = app
                .prepare_with_config::<CliSettings>()
                .with_context(|| format!("failed to prepare {}", home.display()))?;
            let json = args.home.json || settings.unwrap_or_default().json;
            print_init(
                &InitOutput {
                    home,
                    version: app.version(),
                    report: &report,
                },
                json,
            )?;
            Ok(0)
        }
        Command::Status(args) => {
            let home = args.home.resolve_home();
            let layout = HomeLayout::new(&home);
            let settings: CliSettings = load_config(&layout.config_path())?.unwrap_or_default();
            let status = StatusOutput {
                provisioned_version: read_stamp(&layout),
                installed: installed_versions(&layout)?
                    .into_iter()
                    .map(|installed| installed.name)
                    .collect(),
                home,
            };
            print_status(&status, args.home.json || settings.json)?;
            Ok(0)
        }
        Command::Version(args) => {
            match args.command {
                VersionCommand::Generate { major, repo } => {
                    let version =
                        generate_date_commit_version(&repo, major, time::OffsetDateTime::now_utc())?;
                    println!("{version}");
                }
                VersionCommand::Compare { a, b } => {
                    let a = Version::parse(&a)?;
                    let b = Version::parse(&b)?;
                    let order = match compare(&a, &b) {
                        Ordering::Less => -1,
                        Ordering::Equal => 0,
                        Ordering::Greater => 1,
                    };
                    println!("{order}");
                }
                VersionCommand::Date { version, short } => {
                    let encoding = if short {
                        DateEncoding::Short
                    } else {
                        DateEncoding::Long
                    };
                    println!("{}", Version::parse(&version)?.calendar_date(encoding)?);
                }
            }
            Ok(0)
        }
    }
}

fn print_init(output: &InitOutput<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    let report = output.report;
    println!("home: {}", output.home.display());
    println!("assets: {}", report.assets_dir.display());
    println!(
        "previous version: {}",
        report.previous_version.as_deref().unwrap_or("(none)")
    );
    match &report.extracted {
        Some(extracted) => println!(
            "extracted: {} files, {} directories ({} bytes)",
            extracted.files, extracted.directories, extracted.bytes
        ),
        None => println!("extracted: up to date ({})", output.version),
    }
    match &report.cleanup {
        Some(CleanupOutcome::WithinLimit { installed }) => {
            println!("cleanup: {installed} installed, nothing to remove")
        }
        Some(CleanupOutcome::CurrentIsOldest { version }) => {
            println!("cleanup: kept {version} (current version is the oldest)")
        }
        Some(CleanupOutcome::Removed { name, .. }) => println!("cleanup: removed {name}"),
        None => println!("cleanup: failed (see logs)"),
    }
    Ok(())
}

fn print_status(status: &StatusOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("home: {}", status.home.display());
    println!(
        "version: {}",
        status.provisioned_version.as_deref().unwrap_or("(none)")
    );
    println!("installed:");
    if status.installed.is_empty() {
        println!("  (none)");
    }
    for name in &status.installed {
        let marker = if status.provisioned_version.as_deref() == Some(name.as_str()) {
            " (provisioned)"
        } else {
            ""
        };
        println!("  {name}{marker}");
    }
    Ok(())
}
