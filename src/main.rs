//! Podium: speech transcript scoring CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use podium::analyzer::RubricEngine;
use podium::config::{self, RubricConfig, RUBRIC_FILENAME};
use podium::nlp::{self, LanguageServices};
use podium::reporter::{ConsoleReporter, JsonReporter, ScoredTranscript};
use podium::{logging, server, Criterion, ScoreReport, ScoreRequest, ScoringError};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use walkdir::WalkDir;

/// Source name used for transcripts read from stdin
const STDIN_SOURCE: &str = "<stdin>";

/// Podium: rubric-driven speech transcript scorer
#[derive(Parser, Debug)]
#[command(name = "podium")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Transcript files or directories of *.txt files; `-` reads stdin
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Speech duration in seconds (enables the speech-rate criterion)
    #[arg(long, short, value_name = "SECS")]
    duration: Option<f64>,

    /// Path to rubric file (default: search .podiumrc.json in current dir and parents)
    #[arg(long, short)]
    rubric: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Quiet mode (minimal output)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (raw metrics and debug logging)
    #[arg(long, short)]
    verbose: bool,

    /// Minimum score threshold (exit 1 if below)
    #[arg(long, short)]
    threshold: Option<u8>,

    /// Time limit for each grammar or sentiment call
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Score transcripts in parallel (default for more than 10 inputs)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Log filter, e.g. `debug` or `podium=trace`
    #[arg(long, value_name = "LVL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,

    /// LanguageTool server for grammar checking (needs the `languagetool` feature)
    #[arg(long, value_name = "URL")]
    languagetool_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create .podiumrc.json with the built-in rubric
    Init {
        /// Minimum score threshold (e.g. 70)
        #[arg(long)]
        threshold: Option<u8>,

        /// Directory in which to create the rubric (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Validate a rubric file and print its weight table
    CheckRubric {
        /// Rubric file to check
        file: PathBuf,
    },

    /// Score line-delimited JSON requests from stdin
    Serve {
        /// Path to rubric file
        #[arg(long, short)]
        rubric: Option<PathBuf>,

        /// Time limit for each grammar or sentiment call
        #[arg(long, value_name = "MS", default_value_t = 5000)]
        timeout_ms: u64,

        /// LanguageTool server for grammar checking
        #[arg(long, value_name = "URL")]
        languagetool_url: Option<String>,

        /// Log filter, e.g. `debug` or `podium=trace`
        #[arg(long, value_name = "LVL")]
        log_level: Option<String>,

        /// Emit logs as JSON lines on stderr
        #[arg(long)]
        log_json: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::Init { threshold, dir } => run_init(threshold, dir.as_deref()),
            Commands::CheckRubric { file } => run_check_rubric(&file),
            Commands::Serve {
                rubric,
                timeout_ms,
                languagetool_url,
                log_level,
                log_json,
            } => {
                init_logging(false, log_level.as_deref(), log_json)?;
                run_serve(rubric.as_deref(), timeout_ms, languagetool_url.as_deref())
            }
        };
    }

    init_logging(args.verbose, args.log_level.as_deref(), args.log_json)?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let work_dir = match args.paths.first() {
        Some(p) if p.is_dir() => p.clone(),
        Some(p) if p.is_file() => p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone()),
        _ => cwd.clone(),
    };

    let rubric = config::load_rubric(&work_dir, args.rubric.as_deref())
        .context("Failed to load rubric")?;
    let threshold = args.threshold.or(rubric.threshold);
    let engine = build_engine(rubric, args.timeout_ms, args.languagetool_url.as_deref())?;

    let files = collect_transcripts(&args.paths)?;
    if files.is_empty() {
        eprintln!("{}: No transcripts found", "Warning".yellow());
        return Ok(ExitCode::from(2));
    }

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let (inputs, mut had_errors) = read_inputs(&files, args.duration, args.quiet);
    let use_parallel = args.parallel || inputs.len() > 10;
    let (results, scoring_errors) = score_inputs(&engine, inputs, use_parallel, args.quiet);
    had_errors |= scoring_errors;

    if results.is_empty() {
        eprintln!("{}: No transcript could be scored", "Error".red());
        return Ok(ExitCode::from(2));
    }

    let reports: Vec<ScoreReport> = results.iter().map(|r| r.report.clone()).collect();
    let stats = RubricEngine::aggregate_stats(&reports);

    if args.json {
        let reporter = JsonReporter::new().pretty();
        if results.len() == 1 {
            println!("{}", reporter.report(&results[0]));
        } else {
            println!("{}", reporter.report_with_summary(&results, &stats));
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        for result in &results {
            reporter.report_quiet(result);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }
        if results.len() == 1 {
            reporter.report(&results[0]);
        } else {
            reporter.report_many(&results, &stats);
        }
    }

    if let Some(threshold) = threshold {
        let score = if results.len() == 1 {
            results[0].report.final_score
        } else {
            stats.average_score
        };

        if score < f64::from(threshold) {
            if !args.quiet && !args.json {
                eprintln!(
                    "\n{}: Score {:.1} is below threshold {}",
                    "Failed".red().bold(),
                    score,
                    threshold
                );
            }
            return Ok(ExitCode::from(1));
        }
    }

    if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_logging(verbose: bool, log_level: Option<&str>, log_json: bool) -> Result<()> {
    logging::init_tracing(verbose, log_level, log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn build_engine(
    rubric: RubricConfig,
    timeout_ms: u64,
    languagetool_url: Option<&str>,
) -> Result<RubricEngine> {
    let mut services = LanguageServices::builtin();
    if let Some(url) = languagetool_url {
        let checker = nlp::languagetool_checker(url)
            .with_context(|| format!("Cannot use LanguageTool at {}", url))?;
        services = services.with_grammar(checker);
    }
    let engine = RubricEngine::new(rubric)
        .context("Invalid rubric")?
        .with_services(services.with_timeout(Duration::from_millis(timeout_ms)));
    tracing::debug!(
        grammar = engine.services().grammar_name(),
        sentiment = engine.services().sentiment_name(),
        timeout_ms,
        "language services ready"
    );
    Ok(engine)
}

struct Input {
    source: String,
    request: ScoreRequest,
}

/// Read every transcript up front. Unreadable or non-text inputs are reported and skipped.
fn read_inputs(files: &[PathBuf], duration: Option<f64>, quiet: bool) -> (Vec<Input>, bool) {
    let mut inputs = Vec::with_capacity(files.len());
    let mut had_errors = false;

    for file in files {
        let (source, bytes) = if file.as_os_str() == "-" {
            let mut buf = Vec::new();
            let read = std::io::stdin().read_to_end(&mut buf).map(|_| buf);
            (STDIN_SOURCE.to_string(), read)
        } else {
            (file.display().to_string(), std::fs::read(file))
        };

        let request = bytes
            .map_err(anyhow::Error::from)
            .and_then(|b| ScoreRequest::from_bytes(&b, duration).map_err(anyhow::Error::from));
        match request {
            Ok(request) => inputs.push(Input { source, request }),
            Err(e) => {
                had_errors = true;
                if !quiet {
                    eprintln!("{}: Failed to read {}: {}", "Error".red(), source, e);
                }
            }
        }
    }

    (inputs, had_errors)
}

fn score_inputs(
    engine: &RubricEngine,
    inputs: Vec<Input>,
    parallel: bool,
    quiet: bool,
) -> (Vec<ScoredTranscript>, bool) {
    let requests: Vec<ScoreRequest> = inputs.iter().map(|i| i.request.clone()).collect();
    let outcomes: Vec<Result<ScoreReport, ScoringError>> = if parallel {
        engine.score_parallel(&requests)
    } else {
        engine.score_many(&requests)
    };

    let mut had_errors = false;
    let mut results = Vec::with_capacity(outcomes.len());
    for (input, outcome) in inputs.into_iter().zip(outcomes) {
        match outcome {
            Ok(report) => results.push(ScoredTranscript::new(input.source, report)),
            Err(e) => {
                had_errors = true;
                if !quiet {
                    eprintln!(
                        "{}: Failed to score {}: {}",
                        "Error".red(),
                        input.source,
                        e
                    );
                }
            }
        }
    }

    (results, had_errors)
}

/// Expand the CLI paths: files as given, `-` as stdin, directories walked for `*.txt`.
fn collect_transcripts(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.as_os_str() == "-" || path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_transcript_file(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        // Sort for consistent output
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn is_transcript_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

fn run_init(threshold: Option<u8>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let rubric_path = dir.join(RUBRIC_FILENAME);

    if rubric_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            rubric_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let json = config::default_rubric_json(threshold)?;
    std::fs::write(&rubric_path, format!("{}\n", json))
        .with_context(|| format!("Failed to write rubric to {}", rubric_path.display()))?;

    let threshold = threshold
        .map(|t| t.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        rubric_path.display(),
        threshold
    );
    Ok(ExitCode::SUCCESS)
}

fn run_check_rubric(file: &Path) -> Result<ExitCode> {
    let rubric = config::load_rubric_file(file)
        .with_context(|| format!("Rubric {} is invalid", file.display()))?;

    println!("{}: {}", "Valid rubric".green().bold(), file.display());
    println!();
    println!("   {:<22} {:>8} {:>10}", "Criterion", "Weight", "Max score");
    for criterion in Criterion::ALL {
        println!(
            "   {:<22} {:>8} {:>10}",
            criterion.to_string(),
            rubric.criteria.weight(criterion),
            rubric.criteria.max_weight(criterion)
        );
    }
    println!("   {:<22} {:>8}", "Total", rubric.total_weight);
    println!();
    println!("   Skip policy: {}", rubric.skip_policy);
    println!(
        "   Keyword categories: {}",
        rubric.keywords.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    println!("   Fillers: {}", rubric.fillers.len());
    if let Some(threshold) = rubric.threshold {
        println!("   Threshold: {}", threshold);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_serve(rubric: Option<&Path>, timeout_ms: u64, languagetool_url: Option<&str>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let rubric = config::load_rubric(&cwd, rubric).context("Failed to load rubric")?;
    let engine = build_engine(rubric, timeout_ms, languagetool_url)?;

    tracing::info!("serving line-delimited JSON on stdin");
    let stats = server::run_server(&engine).context("Server I/O failed")?;
    tracing::info!(requests = stats.requests, errors = stats.errors, "done");
    Ok(ExitCode::SUCCESS)
}
