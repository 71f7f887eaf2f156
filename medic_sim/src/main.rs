//! Medic Drill CLI
//!
//! Run scripted drills against the scenario catalog, play a scenario
//! interactively, or look up reference data.

use clap::Parser;
use medic_core::{
    CertificationLevel, ConfigError, DrillSession, Formulary, ReferenceError, Run, RunEvent, Scenario,
    ScenarioCatalog, ScenarioError, SessionOutcome, Trainer, TrainerConfig,
};
use medic_env::{StdinInput, TokioClock};
use medic_sim::scenarios::{builtin_catalog, ScenarioId};
use medic_sim::{DrillError, DrillReport, DrillRunner, TraineeKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Medic drill runner
#[derive(Parser, Debug)]
#[command(name = "medic-drill")]
#[command(about = "Run timed EMS decision drills", long_about = None)]
struct Args {
    /// Scenario to run (chest_pain, anaphylaxis, ..., all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Scripted trainee (perfect, sequential, erratic, idle)
    #[arg(short, long, default_value = "perfect")]
    trainee: String,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Certification level (basic, advanced, paramedic)
    #[arg(short, long)]
    level: Option<String>,

    /// List scenarios and exit
    #[arg(long)]
    list: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the drill frame by frame to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Trainer rules as JSON
    #[arg(long)]
    config: Option<String>,

    /// Scenario catalog as JSON, replacing the built-in one
    #[arg(long)]
    scenario_file: Option<String>,

    /// Play the scenario from the terminal
    #[arg(short, long)]
    interactive: bool,

    /// Drug to dose (requires --weight)
    #[arg(long, requires = "weight")]
    dose: Option<String>,

    /// Patient weight in kg
    #[arg(long)]
    weight: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Drill(#[from] DrillError),

    #[error("input failed at decision {index}: {reason}")]
    Input { index: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Dispatches on the mode flags. Returns false when a drill failed.
fn run(args: &Args) -> Result<bool, CliError> {
    let level = args
        .level
        .as_deref()
        .map(|l| l.parse::<CertificationLevel>())
        .transpose()
        .map_err(CliError::Usage)?;

    if let Some(drug) = &args.dose {
        let weight = args
            .weight
            .ok_or_else(|| CliError::Usage("--dose requires --weight".into()))?;
        print_dose(drug, weight, level, args.json)?;
        return Ok(true);
    }

    let catalog = match &args.scenario_file {
        Some(path) => ScenarioCatalog::from_path(path)?,
        None => builtin_catalog()?,
    };

    if args.list {
        print_list(&catalog, level, args.json)?;
        return Ok(true);
    }

    let config = match &args.config {
        Some(path) => TrainerConfig::from_path(path)?,
        None => TrainerConfig::default(),
    };

    let scenarios = select(&catalog, &args.scenario, level)?;

    if args.interactive {
        let [scenario] = scenarios.as_slice() else {
            return Err(CliError::Usage("--interactive needs a single --scenario".into()));
        };
        return play(Arc::clone(scenario), config, level.unwrap_or(CertificationLevel::Paramedic));
    }

    let trainee: TraineeKind = args.trainee.parse().map_err(CliError::Usage)?;
    drill(args, &scenarios, trainee, config)
}

/// Resolves `--scenario` against the catalog.
fn select(
    catalog: &ScenarioCatalog,
    name: &str,
    level: Option<CertificationLevel>,
) -> Result<Vec<Arc<Scenario>>, CliError> {
    if name == "all" {
        let scenarios = match level {
            Some(level) => catalog.for_level(level),
            None => catalog.iter().cloned().collect(),
        };
        if scenarios.is_empty() {
            return Err(CliError::Usage("no scenarios for that level".into()));
        }
        return Ok(scenarios);
    }

    // Built-in ids also accept their short aliases
    let id = name.parse::<ScenarioId>().map(|id| id.name()).unwrap_or(name);

    catalog
        .get(id)
        .or_else(|| catalog.get(name))
        .map(|s| vec![s])
        .ok_or_else(|| {
            let known: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
            CliError::Usage(format!("unknown scenario '{}'; available: {}, all", name, known.join(", ")))
        })
}

/// Runs scripted drills over every selected scenario and seed.
fn drill(
    args: &Args,
    scenarios: &[Arc<Scenario>],
    trainee: TraineeKind,
    config: TrainerConfig,
) -> Result<bool, CliError> {
    if !args.json {
        info!("Medic Drill v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        return Err(CliError::Usage("--export only supports a single scenario and seed".into()));
    }

    let mut all_results: Vec<DrillReport> = Vec::new();

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = DrillRunner::new(seed).with_config(config.clone());

        for scenario in scenarios {
            let result = match &args.export {
                Some(path) => {
                    let (result, export) = runner.run_recorded(scenario, trainee)?;
                    export.write_to_file(path)?;
                    info!("Exported {} frames to {}", export.frames.len(), path);
                    result
                }
                None => runner.run(scenario, trainee)?,
            };

            if !args.json {
                if result.passed {
                    let score = result.result.as_ref().map_or(0, |r| r.score);
                    info!("✓ {} (seed={}) PASSED score={}", result.scenario, seed, score);
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        result.scenario,
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            all_results.push(result);
        }
    }

    // Summary
    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} drills passed!", total);
        } else {
            error!("❌ {}/{} drills failed!", failed_count, total);
            for result in all_results.iter().filter(|r| !r.passed) {
                error!(
                    "  - {} seed={}: {}",
                    result.scenario,
                    result.seed,
                    result.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    Ok(failed_count == 0)
}

fn print_list(catalog: &ScenarioCatalog, level: Option<CertificationLevel>, json: bool) -> Result<(), CliError> {
    let scenarios = match level {
        Some(level) => catalog.for_level(level),
        None => catalog.iter().cloned().collect(),
    };

    if json {
        let rows: Vec<_> = scenarios
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "title": s.title,
                    "level": s.level,
                    "difficulty": s.difficulty,
                    "decision_points": s.len(),
                    "time_budget_secs": s.time_budget_secs,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for s in scenarios {
        println!(
            "{:<16} {:<10} {:<13} {:>2} points {:>4}s  {}",
            s.id,
            s.level,
            format!("{:?}", s.difficulty),
            s.len(),
            s.time_budget_secs,
            s.title
        );
    }
    Ok(())
}

fn print_dose(name: &str, weight: f64, level: Option<CertificationLevel>, json: bool) -> Result<(), CliError> {
    let formulary = Formulary::builtin();
    let drug = formulary.find(name)?;
    let dose = drug.dose_for_weight(weight)?;
    let permitted = level.map(|l| drug.permitted_for(l));

    if json {
        let out = serde_json::json!({
            "drug": drug.name,
            "route": drug.route,
            "weight_kg": weight,
            "dose": dose,
            "permitted": permitted,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} ({}) for {:.1} kg", drug.name, drug.route, weight);
    println!("  {:.2} mg = {:.2} mL{}", dose.mg, dose.ml, if dose.capped { " (max dose)" } else { "" });
    if !drug.notes.is_empty() {
        println!("  {}", drug.notes);
    }
    if let (Some(level), Some(false)) = (level, permitted) {
        println!("  not in {} scope of practice", level);
    }
    Ok(())
}

/// Plays one scenario from the terminal in real time.
fn play(scenario: Arc<Scenario>, config: TrainerConfig, level: CertificationLevel) -> Result<bool, CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    println!("{} [{}]", scenario.title, scenario.level);
    println!("{}", scenario.chief_complaint);
    println!("Enter a choice number, or q to quit.");

    let mut last: Option<RunEvent> = None;
    let session = DrillSession::new(
        TokioClock::shared(),
        Arc::new(StdinInput::new()),
        Trainer::new(config)?,
        scenario,
    )?
    .with_observer(move |run| render(run, level, &mut last));

    let outcome = runtime.block_on(session.run_to_end());

    match outcome {
        SessionOutcome::Completed(result) => {
            println!();
            println!("Score {} | errors {} | time {}s", result.score, result.errors, result.total_time_secs);
            println!("{}", if result.passed { "PASSED" } else { "NOT PASSED" });
            println!("{}", result.feedback);
            Ok(result.passed)
        }
        SessionOutcome::Abandoned { index, errors } => {
            println!("Abandoned at decision {} with {} errors", index + 1, errors);
            Ok(true)
        }
        SessionOutcome::InputClosed { index, .. } => {
            info!("input closed at decision {}", index + 1);
            Ok(true)
        }
        SessionOutcome::InputFailed { index, reason, .. } => Err(CliError::Input { index: index + 1, reason }),
    }
}

/// Prints the transition, then the prompt whenever the run is answerable again.
fn render(run: &Run, level: CertificationLevel, last: &mut Option<RunEvent>) {
    if last.as_ref() == Some(run.last_event()) {
        return;
    }
    *last = Some(run.last_event().clone());

    let feedback = run.last_feedback().unwrap_or_default();
    match run.last_event() {
        RunEvent::WrongChoice { .. } => {
            println!("  ✗ {}", feedback);
            println!("  Locked for {}s | {}", run.lockout_remaining_secs(), run.condition());
        }
        RunEvent::TimedOut { .. } => {
            println!("  Time expired.");
            println!("  Locked for {}s | {}", run.lockout_remaining_secs(), run.condition());
        }
        RunEvent::Advanced { .. } | RunEvent::Completed { .. } => println!("  ✓ {}", feedback),
        RunEvent::Started | RunEvent::LockoutEnded { .. } => {}
    }

    let Some(point) = run.current_point().filter(|_| run.is_in_progress()) else {
        return;
    };
    println!();
    println!(
        "Decision {}/{} ({}s) | {}",
        run.index() + 1,
        run.scenario().len(),
        run.decision_remaining_secs(),
        run.condition()
    );
    println!("{}", point.prompt);
    if !point.in_scope_for(level) {
        println!("  (outside {} scope of practice)", level);
    }
    for (i, choice) in point.choices.iter().enumerate() {
        println!("  {}. {}", i + 1, choice.label);
    }
}
