//! slot-inspect CLI: inspect a test image against a reference model.

use clap::{Args, Parser, Subcommand};
use slot_inspect::core::Budget;
use slot_inspect::{io, Engine, EngineConfig, ModelConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "slot-inspect")]
#[command(about = "Register a test image onto a reference model and verify every slot")]
#[command(version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a test image. Exits with 0 when every slot passes, 1 otherwise.
    Run(RunArgs),

    /// Load a model file and validate its slots against the reference image.
    CheckModel {
        /// Path to the model JSON.
        #[arg(long)]
        model: PathBuf,
    },

    /// Print the default engine configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Path to the model JSON (reference image and slots).
    #[arg(long)]
    model: PathBuf,

    /// Path to the test image.
    #[arg(long)]
    image: PathBuf,

    /// Engine configuration JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to write the full inspection report (JSON).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Abort registration after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print every diagnostic line, not only the verdicts.
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let outcome = match cli.command {
        Commands::Run(args) => run_inspect(&args),
        Commands::CheckModel { model } => run_check_model(&model).map(|_| ExitCode::SUCCESS),
        Commands::DefaultConfig => run_default_config().map(|_| ExitCode::SUCCESS),
    };
    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: &str) {
    let level = slot_inspect::core::parse_level(level).unwrap_or(log::LevelFilter::Warn);
    let _ = slot_inspect::core::init_with_level(level);
}

#[cfg(feature = "tracing")]
fn init_logging(_level: &str) {
    slot_inspect::core::init_tracing(false);
    let _ = tracing_log::LogTracer::init();
}

// ── run ───────────────────────────────────────────────────────────────

fn run_inspect(args: &RunArgs) -> CliResult<ExitCode> {
    let config = match &args.config {
        Some(path) => EngineConfig::load_json(path)?,
        None => EngineConfig::default(),
    };
    let model = ModelConfig::load_json(&args.model)?.load_model()?;
    let test = io::load_color_image(&args.image)?;

    let budget = match args.timeout_ms {
        Some(ms) => Budget::with_timeout(Duration::from_millis(ms)),
        None => Budget::unlimited(),
    };
    let engine = Engine::new(config)?;
    let report = engine.inspect_model(&model, &test.view(), &budget)?;

    let reg = &report.registration;
    match &reg.failure {
        None => println!(
            "registration: {} inliers / {} matches",
            reg.inliers, reg.matches
        ),
        Some(e) => println!("registration failed: {e} (degraded mode)"),
    }
    for r in &report.results {
        println!(
            "  slot {:>3} {:<20} {} score {:.3}",
            r.slot_id,
            r.name.as_deref().unwrap_or("-"),
            if r.passed { "PASS" } else { "FAIL" },
            r.score
        );
    }
    if args.verbose {
        for line in &report.summary.log {
            println!("    {line}");
        }
    }
    println!("{}", report.summary);

    if let Some(path) = &args.output {
        report.write_json(path)?;
        log::info!("report written to {}", path.display());
    }

    Ok(if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// ── check-model ───────────────────────────────────────────────────────

fn run_check_model(path: &Path) -> CliResult<()> {
    let model = ModelConfig::load_json(path)?.load_model()?;
    let reference = model.reference();
    println!(
        "reference: {}x{} (fingerprint {:016x})",
        reference.width(),
        reference.height(),
        reference.fingerprint()
    );
    println!("slots: {}", model.slots().len());
    for slot in model.slots() {
        let r = slot.rect;
        println!(
            "  slot {:>3} {:<20} ({}, {}, {}x{}) {} ok >= {:.1}%",
            slot.id,
            slot.name.as_deref().unwrap_or("-"),
            r.x,
            r.y,
            r.w,
            r.h,
            slot.effective_method(),
            slot.ok_threshold
        );
    }
    Ok(())
}

// ── default-config ────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&EngineConfig::default())?);
    Ok(())
}
