//! hashgrade CLI
//!
//! Thin wrapper over `hashgrade-core`: resolves configuration, loads the hash
//! function, runs the evaluation and hands the result to the reporters.
//!
//! Exit codes: `0` scored, `1` the hash function failed the idempotence
//! check, `2` anything else (usage, config, loading, I/O).

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use hashgrade_core::capability::{HashFunction, ReferenceHash};
use hashgrade_core::config::{Config, LogFormat};
use hashgrade_core::dataset::GlobSource;
use hashgrade_core::error::format_error_with_remediation;
use hashgrade_core::evaluation::Evaluator;
use hashgrade_core::logging::{LogConfig, init_logging};
use hashgrade_core::report::{ConsoleReporter, GradescopeReporter, OutputFormat, ScoreReporter};
use hashgrade_native::NativeHash;

const EXIT_NOT_IDEMPOTENT: u8 = 1;
const EXIT_FATAL: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "hashgrade", version, about = "Grade a string hash function for determinism and uniformity")]
struct Cli {
    /// Config file (defaults to ./hashgrade.toml when present)
    #[arg(long, short = 'c', global = true, env = "HASHGRADE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HASHGRADE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty or json)
    #[arg(long, global = true, env = "HASHGRADE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a hash function and report the score
    Run(RunArgs),
    /// Print the effective configuration as TOML
    Config,
    /// Print the histogram bin boundaries
    Bins {
        /// Output format (plain or json)
        #[arg(long, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Shared object exporting `unsigned short hash(const char *)`
    #[arg(long, env = "HASHGRADE_LIBRARY")]
    library: Option<PathBuf>,

    /// Exported symbol name
    #[arg(long, env = "HASHGRADE_SYMBOL")]
    symbol: Option<String>,

    /// Grade a built-in reference hash instead (siphash, length, constant)
    #[arg(long)]
    reference: Option<ReferenceHash>,

    /// Glob pattern selecting the dataset files
    #[arg(long, env = "HASHGRADE_DATA")]
    data: Option<String>,

    /// Fixed seed for the idempotence shuffles
    #[arg(long, env = "HASHGRADE_SEED")]
    seed: Option<u64>,

    /// Write an autograder results.json here
    #[arg(long, env = "HASHGRADE_RESULTS")]
    results: Option<PathBuf>,

    /// Hash lines without their trailing newline
    #[arg(long)]
    strip_line_endings: bool,

    /// Console output format (plain or json)
    #[arg(long, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<hashgrade_core::Error>() {
                Some(core) => eprintln!("{}", format_error_with_remediation(core)),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.general.log_format = format;
    }

    match cli.command {
        Command::Run(args) => {
            apply_run_overrides(&mut config, &args);
            config.validate()?;
            init_logging(&LogConfig::from(&config.general)).context("failed to initialize logging")?;
            run(&config, &args)
        }
        Command::Config => {
            config.validate()?;
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Bins { format } => {
            print_bins(&config, format)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_run_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(library) = &args.library {
        config.capability.library = Some(library.clone());
    }
    if let Some(symbol) = &args.symbol {
        config.capability.symbol.clone_from(symbol);
    }
    if let Some(pattern) = &args.data {
        config.datasets.pattern.clone_from(pattern);
    }
    if args.seed.is_some() {
        config.evaluation.seed = args.seed;
    }
    if let Some(results) = &args.results {
        config.report.results_path = Some(results.clone());
    }
    if args.strip_line_endings {
        config.datasets.strip_line_endings = true;
    }
}

fn load_capability(config: &Config, reference: Option<ReferenceHash>) -> anyhow::Result<Box<dyn HashFunction>> {
    if let Some(reference) = reference {
        tracing::info!(reference = %reference, "grading reference hash");
        return Ok(Box::new(reference));
    }
    let Some(library) = &config.capability.library else {
        bail!("no hash function configured: pass --library <path> or --reference <name>");
    };
    let native = NativeHash::load(library, &config.capability.symbol)
        .map_err(hashgrade_core::Error::from)?;
    Ok(Box::new(native))
}

fn run(config: &Config, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let hash = load_capability(config, args.reference)?;
    let source = GlobSource::new(config.datasets.pattern.clone())
        .strip_line_endings(config.datasets.strip_line_endings);
    let evaluator = Evaluator::new(config.evaluation.clone());

    let mut reporters: Vec<Box<dyn ScoreReporter>> =
        vec![Box::new(ConsoleReporter::new(io::stdout(), args.format))];
    if let Some(path) = &config.report.results_path {
        reporters.push(Box::new(
            GradescopeReporter::new(path)
                .test_name(config.report.test_name.clone())
                .leaderboard_name(config.report.leaderboard_name.clone())
                .max_score(config.report.max_score),
        ));
    }

    match evaluator.run_source(hash.as_ref(), &source) {
        Ok(result) => {
            for reporter in &mut reporters {
                reporter.report_success(&result)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.is_hard_failure() => {
            for reporter in &mut reporters {
                reporter.report_failure(&err)?;
            }
            eprintln!("{}", format_error_with_remediation(&err));
            Ok(ExitCode::from(EXIT_NOT_IDEMPOTENT))
        }
        Err(err) => Err(err.into()),
    }
}

fn print_bins(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let spec = Evaluator::new(config.evaluation.clone()).bin_spec();
    match format {
        OutputFormat::Plain => {
            println!(
                "{} bins over [0, {}], width {} (last bin width {})",
                spec.n_bins(),
                spec.upper_bound(),
                spec.bin_width(),
                spec.last_bin_width()
            );
            for (i, edges) in spec.boundaries().windows(2).enumerate() {
                println!("{i}\t{}\t{}", edges[0], edges[1]);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&spec)?);
        }
    }
    Ok(())
}
