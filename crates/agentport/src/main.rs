use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use agentport::batch::{BatchDriver, BatchSettings, ConversionReport, Mode};
use agentport::config::{self, ConvertCfg, UserConfig};
use agentport::convert::ConvertOptions;
use agentport::inference::{self, InferenceTables};
use agentport::logging::init_tracing;
use agentport::powers::{PowersReport, PowersSettings, convert_skills};
use agentport::validate::{ValidationReport, validate_dir};

/// Claude Code agents and skills → Kiro agents and powers.
#[derive(Parser)]
#[command(name = "agentport", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert agent Markdown definitions into agent JSON files.
    Agents {
        /// Source root (`[plugins/]<group>/agents/<name>.md`).
        #[arg(long, short)]
        source: PathBuf,
        /// Output directory for `<name>.json`.
        #[arg(long, short)]
        output: PathBuf,
        /// Report what would be written without touching the output directory.
        #[arg(long)]
        dry_run: bool,
        /// Also write the Markdown agents index.
        #[arg(long)]
        index: bool,
        /// Use the first short body paragraph when a description is missing.
        #[arg(long)]
        describe_from_body: bool,
        /// TOML file overlaying the built-in inference tables.
        #[arg(long)]
        tables: Option<PathBuf>,
    },

    /// Convert skill directories (`SKILL.md`) into power directories.
    Skills {
        #[arg(long, short)]
        source: PathBuf,
        #[arg(long, short, default_value = "./powers")]
        output: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },

    /// Statically validate agent JSON files in a directory.
    Validate {
        #[arg(long, short, default_value = ".kiro/agents")]
        dir: PathBuf,
    },
}

fn mode(dry_run: bool) -> Mode {
    if dry_run { Mode::Preview } else { Mode::Commit }
}

fn load_tables(flag: Option<PathBuf>, cfg: &ConvertCfg) -> anyhow::Result<InferenceTables> {
    let path = flag.or_else(|| cfg.tables_file.as_deref().map(config::expand_home));
    match path {
        Some(p) => inference::load_from_file(&p)
            .with_context(|| format!("load inference tables {}", p.display())),
        None => Ok(inference::load_default()),
    }
}

async fn run(command: Commands, user_cfg: Option<UserConfig>) -> anyhow::Result<ExitCode> {
    let convert_cfg = user_cfg.and_then(|c| c.convert).unwrap_or_default();
    match command {
        Commands::Agents {
            source,
            output,
            dry_run,
            index,
            describe_from_body,
            tables,
        } => {
            let tables = load_tables(tables, &convert_cfg)?;
            let mut settings = BatchSettings::new(source, output);
            settings.mode = mode(dry_run);
            settings.write_index = index;
            if let Some(v) = convert_cfg.index_name {
                settings.index_name = v;
            }
            if let Some(v) = convert_cfg.groups_dir {
                settings.groups_dir = v;
            }
            if let Some(v) = convert_cfg.definitions_dir {
                settings.definitions_dir = v;
            }
            if let Some(v) = convert_cfg.concurrency {
                settings.concurrency = v;
            }
            let options = ConvertOptions {
                describe_from_body: describe_from_body
                    || convert_cfg.describe_from_body.unwrap_or(false),
                ..ConvertOptions::default()
            };
            let report = BatchDriver::new(settings, tables, options)
                .run()
                .await
                .context("agent conversion aborted")?;
            print_conversion(&report);
            Ok(exit_for(report.has_failures()))
        }
        Commands::Skills {
            source,
            output,
            dry_run,
        } => {
            let settings = PowersSettings {
                source_root: source,
                output_root: output,
                mode: mode(dry_run),
            };
            let report = tokio::task::spawn_blocking(move || convert_skills(&settings))
                .await
                .context("skills task failed")?
                .context("skills conversion aborted")?;
            print_powers(&report);
            Ok(exit_for(!report.failures.is_empty()))
        }
        Commands::Validate { dir } => {
            let target = dir.clone();
            let report = tokio::task::spawn_blocking(move || validate_dir(&target))
                .await
                .context("validation task failed")?
                .with_context(|| format!("validate {}", dir.display()))?;
            print_validation(&report);
            Ok(exit_for(!report.is_ok()))
        }
    }
}

fn exit_for(failed: bool) -> ExitCode {
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn print_conversion(report: &ConversionReport) {
    for e in &report.records {
        let verb = match report.mode {
            Mode::Preview => "would write",
            Mode::Commit => "wrote",
        };
        println!("✓ {} [{}] {} {}", e.record.name, e.category, verb, e.target.display());
    }
    for f in &report.failures {
        println!("✗ {}: {}", f.identifier, f.reason);
    }
    for c in &report.conflicts {
        println!("! exists: {}", c.display());
    }
    if let Some(p) = &report.index_path {
        println!("index: {}", p.display());
    }
    println!("{}", report.summary());
}

fn print_powers(report: &PowersReport) {
    for p in &report.powers {
        println!(
            "✓ {} → {} (keywords: {})",
            p.source_dir.display(),
            p.power_dir.display(),
            p.keywords.join(", ")
        );
        if !p.steering.is_empty() {
            println!("  {} files to steering/", p.steering.len());
        }
    }
    for f in &report.failures {
        println!("✗ {}: {}", f.identifier, f.reason);
    }
    println!("{}", report.summary());
}

fn print_validation(report: &ValidationReport) {
    for f in &report.invalid {
        println!("✗ {}", f.path.display());
        for err in &f.errors {
            println!("    - {err}");
        }
    }
    println!(
        "scanned {}, valid {}, invalid {}",
        report.scanned(),
        report.valid,
        report.invalid.len()
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let home = config::agentport_home();
    let (user_cfg, cfg_err) = match config::load_user_config(&home) {
        Ok(c) => (c, None),
        Err(e) => (None, Some(e)),
    };
    init_tracing(&home, user_cfg.as_ref().and_then(|c| c.logging.as_ref()));
    if let Some(e) = cfg_err {
        tracing::warn!("ignoring user config in {}: {}", home.display(), e);
    }
    tracing::debug!("agentport_home={}", home.display());

    tokio::select! {
        res = run(cli.command, user_cfg) => match res {
            Ok(code) => code,
            Err(e) => {
                tracing::error!("{:#}", e);
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; files already written are kept");
            ExitCode::from(130)
        }
    }
}
