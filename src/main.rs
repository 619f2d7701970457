//! CLI entry point for the wire-bond pull test uploader.
//!
//! Provides subcommands for inspecting a pull-tester CSV export and for
//! uploading it, with its summary statistics and verdict, to the test database.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wire_pull_upload::{
    config::{AccessCodes, DatabaseConfig, SiteConfig},
    infra::itkdb::ItkDbClient,
    output::{print_pretty, summary},
    pipeline::{Analysis, analyze_file, submit},
    record::{UserInputs, build_record},
};

#[derive(Parser)]
#[command(name = "wire_pull_upload")]
#[command(about = "Summarise wire-bond pull tests and upload them to the test database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Problems {
    Yes,
    No,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the statistics and verdict for a pull test export
    Inspect {
        /// Pull tester CSV export
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Site configuration JSON (institution, machines, thresholds)
        #[arg(short, long)]
        config: Option<String>,

        /// Also print the record draft as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build the test record and upload it with the original file attached
    Upload {
        /// Pull tester CSV export
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Component serial number
        #[arg(long = "component", visible_alias = "sn")]
        component: Option<String>,

        /// Run number
        #[arg(short, long)]
        run_number: Option<String>,

        /// Whether problems occurred during testing
        #[arg(short, long, value_enum)]
        problems: Option<Problems>,

        /// First database access code (defaults to ITKDB_ACCESS_CODE1)
        #[arg(long)]
        access_code1: Option<String>,

        /// Second database access code (defaults to ITKDB_ACCESS_CODE2)
        #[arg(long)]
        access_code2: Option<String>,

        /// Site configuration JSON (institution, machines, thresholds)
        #[arg(short, long)]
        config: Option<String>,

        /// Print the record instead of uploading it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/wire_pull_upload.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("wire_pull_upload.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, config, json } => {
            let site = SiteConfig::load_or_default(config.as_deref())?;
            let analysis = analyze_file(&file, &site)?;

            show(&analysis, &site);
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.draft.results)?);
            }
        }
        Commands::Upload {
            file,
            component,
            run_number,
            problems,
            access_code1,
            access_code2,
            config,
            dry_run,
        } => {
            let site = SiteConfig::load_or_default(config.as_deref())?;

            let analysis = match &file {
                Some(path) => {
                    let analysis = analyze_file(path, &site)?;
                    show(&analysis, &site);
                    Some(analysis)
                }
                None => None,
            };

            let inputs = UserInputs {
                component,
                run_number,
                problems: problems.map(|p| matches!(p, Problems::Yes)),
            };
            let record = build_record(analysis.as_ref().map(|a| &a.draft), &inputs)?;
            print_pretty(&record);

            if dry_run {
                println!("{}", serde_json::to_string_pretty(&record)?);
                info!("Dry run, nothing uploaded");
                return Ok(());
            }

            let codes = AccessCodes::resolve(access_code1, access_code2)?;
            let db_config = DatabaseConfig::from_env()?;
            let client = ItkDbClient::connect(&db_config, &codes).await?;

            let report = submit(record, &client).await?;
            println!(
                "Upload of test run {} and attachment completed.",
                report.test_run_id
            );
        }
    }

    Ok(())
}

fn show(analysis: &Analysis, site: &SiteConfig) {
    println!(
        "{}",
        summary(analysis, &site.wire_bond_machine, &site.pull_test_machine)
    );
}
