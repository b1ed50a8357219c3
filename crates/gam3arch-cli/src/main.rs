//! gam3arch - scenario experiments for the GAM3ARCH flow-state model
//!
//! Usage:
//!   gam3arch run --preset realistic --out-dir results
//!   gam3arch run --config cfg.json --scenarios scenarios/bridge_study.json --metrics
//!   gam3arch extract telemetry.csv --t0 60 --out B_matrix.json

mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gam3arch_core::{
    extract_bridges, scenarios_from_json, standard_scenarios, Preset, ScenarioSet,
    SimulationConfig, DEFAULT_T0_MINUTES,
};
use gam3arch_metrics::{reject_if_burnout_increases, ExperimentMetrics};
use gam3arch_sim::{ExperimentReport, ExperimentRunner, RunOptions};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "gam3arch")]
#[command(about = "Agent-based flow-state experiments and telemetry bridge extraction")]
#[command(version)]
struct Cli {
    /// Log at debug level (per-repetition detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every scenario and write summary and per-run tables
    Run(RunArgs),

    /// Build a bridge matrix from a player_id,timestamp,zone CSV
    Extract(ExtractArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Parameter preset
    #[arg(long, default_value = "paper")]
    preset: Preset,

    /// JSON configuration file (overrides the preset)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON scenario file (default: the four standard scenarios)
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Override the number of repetitions
    #[arg(long)]
    runs: Option<usize>,

    /// Override the experiment seed
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for summary.csv, runs.csv and history files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Record per-step history and write history_<scenario>.json
    #[arg(long)]
    history: bool,

    /// Run repetitions on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Print the Prometheus text exposition after the run
    #[arg(long)]
    metrics: bool,
}

#[derive(Args)]
struct ExtractArgs {
    /// Telemetry CSV with player_id,timestamp,zone columns
    input: PathBuf,

    /// Healthy interval between zone changes, in minutes
    #[arg(long, default_value_t = DEFAULT_T0_MINUTES)]
    t0: f64,

    /// Where to write the bridge matrix
    #[arg(short, long, default_value = "B_matrix.json")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Extract(args) => extract_command(args),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(args: &RunArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimulationConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => args.preset.config(),
    };
    if let Some(runs) = args.runs {
        config.repetitions = runs;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn load_scenarios(path: Option<&Path>, steps: usize) -> Result<ScenarioSet> {
    let scenarios = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading scenarios {}", path.display()))?;
            scenarios_from_json(&text)
                .with_context(|| format!("parsing scenarios {}", path.display()))?
        }
        None => standard_scenarios(steps)?,
    };
    if scenarios.is_empty() {
        bail!("no scenarios to run");
    }
    Ok(scenarios)
}

fn run_command(args: RunArgs) -> Result<()> {
    let config = load_config(&args)?;
    let scenarios = load_scenarios(args.scenarios.as_deref(), config.steps)?;
    info!(
        population = config.population,
        steps = config.steps,
        repetitions = config.repetitions,
        seed = config.seed,
        scenarios = scenarios.len(),
        "starting experiment"
    );

    let mut runner = ExperimentRunner::new(config)?.with_options(RunOptions {
        record_history: args.history,
    });
    if args.sequential {
        runner = runner.sequential();
    }
    let report = runner.run(&scenarios)?;

    output::print_summary_table(&mut io::stdout().lock(), &report.summaries)?;
    write_results(&args.out_dir, &report, args.history)?;

    let registry = prometheus::Registry::new();
    let metrics = ExperimentMetrics::new(&registry)?;
    metrics.observe(&report);
    check_interventions(&metrics, &scenarios, &report);
    if args.metrics {
        output::write_exposition(&mut io::stdout().lock(), &registry)?;
    }
    Ok(())
}

fn write_results(out_dir: &Path, report: &ExperimentReport, history: bool) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let summary_path = out_dir.join("summary.csv");
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    output::write_summary_csv(file, &report.summaries)?;

    let runs_path = out_dir.join("runs.csv");
    let file =
        File::create(&runs_path).with_context(|| format!("creating {}", runs_path.display()))?;
    output::write_runs_csv(file, &report.runs)?;

    if history {
        for summary in &report.summaries {
            let path = out_dir.join(history_file_name(&summary.scenario));
            let file =
                File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            output::write_history_json(file, report.runs_for(&summary.scenario))?;
        }
    }
    info!(out_dir = %out_dir.display(), "results written");
    Ok(())
}

/// `history_<scenario>.json`, with every character outside `[A-Za-z0-9_-]`
/// replaced so a scenario name can never leave the output directory.
fn history_file_name(scenario: &str) -> String {
    let safe: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("history_{safe}.json")
}

/// Warns when a scenario with an intervention ends up burning out more
/// agents than the baseline.
fn check_interventions(metrics: &ExperimentMetrics, scenarios: &ScenarioSet, report: &ExperimentReport) {
    let Some(baseline) = report.summary("Baseline") else {
        return;
    };
    for (name, spec) in scenarios {
        if spec.intervention_step.is_none() {
            continue;
        }
        if let Some(treated) = report.summary(name) {
            if reject_if_burnout_increases(metrics, baseline, treated) {
                warn!(
                    scenario = name.as_str(),
                    burnout = treated.burnout_mean,
                    baseline = baseline.burnout_mean,
                    "intervention scenario burns out more agents than the baseline"
                );
            }
        }
    }
}

fn extract_command(args: ExtractArgs) -> Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("opening telemetry {}", args.input.display()))?;
    let visits = output::read_visits(BufReader::new(file))
        .with_context(|| format!("reading telemetry {}", args.input.display()))?;
    info!(rows = visits.len(), t0 = args.t0, "extracting bridges");

    let bridge = extract_bridges(&visits, args.t0)?;
    output::print_bridge(&mut io::stdout().lock(), &bridge)?;
    fs::write(&args.out, bridge.to_json_pretty()?)
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!(out = %args.out.display(), "bridge matrix written");
    Ok(())
}
