//! CLI entry point for the grade aggregator.
//!
//! Provides subcommands for aggregating every campus and term in a batch,
//! aggregating a single term directory, and checking the honorary science
//! credit classification of a course.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grade_aggregator::aggregation::AggregationContext;
use grade_aggregator::aggregation::runner::{RunOptions, UnitOutcome, process_term, run};
use grade_aggregator::classify::CreditRules;
use grade_aggregator::config::RunConfig;
use grade_aggregator::grades::LetterGradeMap;
use grade_aggregator::subjects::SubjectDirectory;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_aggregator")]
#[command(about = "Aggregates per-section grade exports into course and instructor summaries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate every configured campus and term
    Run {
        /// Directory containing <CAMPUS>/<TERM>/ export directories
        #[arg(short, long, default_value = "course-data/pre-processed")]
        input: PathBuf,

        /// Directory containing the campus subject lists
        #[arg(short, long, default_value = "course-data/subjects")]
        subjects: PathBuf,

        /// Directory to write courses/ and instructors/ views into
        #[arg(short, long, default_value = "course-data/post-processed")]
        output: PathBuf,

        /// Optional JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only process these terms (repeatable)
        #[arg(short, long = "term")]
        terms: Vec<String>,

        /// Gzip compress the JSON views
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Aggregate a single term directory
    Term {
        /// Campus name used in output paths
        #[arg(long)]
        campus: String,

        /// Term directory holding both grade exports
        #[arg(short, long)]
        dir: PathBuf,

        /// Subject list JSON file for the campus
        #[arg(short, long)]
        subjects: PathBuf,

        /// Directory to write courses/ and instructors/ views into
        #[arg(short, long, default_value = "course-data/post-processed")]
        output: PathBuf,

        /// Optional JSON run configuration (file names, delimiter, join policy)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Annotate honorary science credit courses
        #[arg(long, default_value_t = false)]
        honorary_credit: bool,

        /// Gzip compress the JSON views
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Check whether a course earns honorary science credit
    Classify {
        /// Subject code, e.g. PSYC
        subject: String,

        /// Course number, e.g. 460
        course_number: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_aggregator.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_aggregator.log"));

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
        Commands::Run {
            input,
            subjects,
            output,
            config,
            terms,
            gzip,
        } => {
            let config = load_config(config.as_deref())?;
            let options = RunOptions {
                input_root: input,
                subjects_dir: subjects,
                output_root: output,
                terms,
                gzip,
            };

            let summary = run(&config, &options)?;
            for unit in &summary.units {
                match &unit.outcome {
                    UnitOutcome::Processed {
                        courses,
                        instructors,
                        unmatched_sections,
                    } => info!(
                        campus = %unit.campus,
                        term = %unit.term,
                        courses,
                        instructors,
                        unmatched_sections,
                        "Processed"
                    ),
                    UnitOutcome::Skipped { reason } => warn!(
                        campus = %unit.campus,
                        term = %unit.term,
                        reason = %reason,
                        "Skipped"
                    ),
                }
            }
        }
        Commands::Term {
            campus,
            dir,
            subjects,
            output,
            config,
            honorary_credit,
            gzip,
        } => {
            let config = load_config(config.as_deref())?;
            let loader = config.loader_options()?;
            let subjects = SubjectDirectory::load(&subjects)?;
            let letters = LetterGradeMap::default();
            let rules = CreditRules::default();
            let ctx = AggregationContext {
                subjects: &subjects,
                letters: &letters,
                credit_rules: honorary_credit.then_some(&rules),
                duplicate_policy: config.duplicate_join,
            };

            let term = dir
                .file_name()
                .and_then(OsStr::to_str)
                .with_context(|| format!("cannot name term from {}", dir.display()))?
                .to_string();

            match process_term(&ctx, &campus, &term, &dir, &loader, &output, gzip)? {
                UnitOutcome::Processed { .. } => {}
                UnitOutcome::Skipped { reason } => {
                    anyhow::bail!("{campus} {term} produced no output: {reason}")
                }
            }
        }
        Commands::Classify {
            subject,
            course_number,
        } => {
            let eligible =
                CreditRules::default().is_honorary_science_credit(&subject, &course_number);
            info!(subject = %subject, course_number = %course_number, eligible, "Honorary science credit");
            println!("{eligible}");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path),
        None => Ok(RunConfig::default()),
    }
}
