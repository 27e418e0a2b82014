// LogWarden - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration loading and validation
// 3. Logging initialisation (debug mode support)
// 4. Subcommand dispatch and exit-code mapping

use clap::{Parser, Subcommand};
use logwarden::app::analyze::{self, AnalyzeOptions};
use logwarden::app::report;
use logwarden::core::detect::DetectionParams;
use logwarden::enrich::cache::FileCache;
use logwarden::platform::config::{self, AppConfig, PlatformPaths};
use logwarden::util::{constants, logging};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// LogWarden - Security log analyser.
///
/// Point LogWarden at a log file to parse it, run threat detections over
/// the parsed records, and optionally enrich findings with geolocation
/// context.
#[derive(Parser, Debug)]
#[command(name = "logwarden", version, about)]
struct Cli {
    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a log file for threats.
    Analyze {
        /// Path to the log file to analyse.
        #[arg(short, long)]
        input: PathBuf,

        /// Path to save the JSON report (optional).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enrich findings with geolocation data.
        #[arg(long)]
        enrich: bool,

        /// Show extra progress output.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show a quick summary of a log file.
    Summary {
        /// Path to the log file.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Clear the local enrichment cache.
    CacheClear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Config must load before logging so the [logging] level can apply;
    // warnings collected during the load are emitted once tracing is up.
    let paths = PlatformPaths::resolve();
    let (app_config, config_warnings) = config::load_config(&paths.config_dir);

    logging::init(cli.debug, app_config.log_level.as_deref());
    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "LogWarden starting"
    );

    let exit_code = match cli.command {
        Command::Analyze {
            input,
            output,
            enrich,
            verbose,
        } => cmd_analyze(&app_config, input, output, enrich, verbose),
        Command::Summary { input } => cmd_summary(input),
        Command::CacheClear { yes } => cmd_cache_clear(&paths, yes),
    };
    std::process::exit(exit_code);
}

fn cmd_analyze(
    app_config: &AppConfig,
    input: PathBuf,
    output: Option<PathBuf>,
    enrich: bool,
    verbose: bool,
) -> i32 {
    let options = AnalyzeOptions {
        enrich,
        detection: DetectionParams {
            brute_force_threshold: app_config.brute_force_threshold,
            admin_probe_threshold: app_config.admin_probe_threshold,
        },
        cache_dir: None,
        cache_ttl: Duration::from_secs(app_config.cache_ttl_secs),
    };

    if verbose {
        println!("Analyzing: {}", input.display());
    }

    let analysis = match analyze::analyze(&input, &options) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    if verbose {
        println!("Parsed {} log entries", analysis.total_records);
        println!("Found {} security findings", analysis.findings.len());
    }

    report::print_findings(&analysis.findings);

    if let Some(output) = output {
        if let Err(e) = report::save_json(&analysis, &output) {
            eprintln!("Error: {e}");
            return 1;
        }
        println!("\nReport saved to: {}", output.display());
    }
    0
}

fn cmd_summary(input: PathBuf) -> i32 {
    match analyze::summarize(&input) {
        Ok(summary) => {
            report::print_summary(&summary);
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_cache_clear(paths: &PlatformPaths, yes: bool) -> i32 {
    if !yes {
        print!("This will delete all cached enrichment data. Continue? (y/N): ");
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            eprintln!("Error: could not read confirmation");
            return 1;
        }
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return 0;
        }
    }

    let removed = FileCache::at(paths.cache_dir.clone()).clear();
    println!("Cache cleared. Removed {removed} file(s).");
    0
}
