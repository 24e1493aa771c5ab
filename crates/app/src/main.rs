//! arm-sim command line
//!
//! # Commands
//!
//! - `arm-sim run` - Drive the arm with a torque oracle and print the trajectory
//! - `arm-sim record` - Record a PD-controlled run as a dataset file
//! - `arm-sim probe` - Check that the completion service answers in the expected format

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn, LevelFilter};

use arm_sim_app::output::{write_dataset, write_json, TsvEcho};
use arm_sim_app::probe::{self, DEFAULT_EXPECTED};
use arm_sim_app::{
    init_logging, AppConfig, ChatCompletionsTransport, Simulation, SimulationOutcome,
    TransportConfig,
};
use control::{Dataset, LocalOracle, PdOracle, RemoteOracle, StreamEvent, ZeroOracle};
use mechanics::TwoLinkArm;
use simcore::TorqueOracle;

/// Two-link arm simulator
#[derive(Parser)]
#[command(name = "arm-sim")]
#[command(about = "Two-link arm driven by pluggable torque oracles", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation and print each transition
    Run {
        /// Where torques come from
        #[arg(long, value_enum, default_value_t = OracleKind::Remote)]
        oracle: OracleKind,

        /// Completion service preset, overriding the configured one
        #[arg(long, value_enum)]
        provider: Option<Provider>,

        #[command(flatten)]
        start: StartArgs,

        /// Print the whole run as JSON at the end instead of TSV rows
        #[arg(long)]
        json: bool,

        /// Dataset file for the local and remote oracles
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Record a PD-controlled run as a dataset file
    Record {
        #[arg(long, default_value = "robot-control.txt")]
        output: PathBuf,

        /// Seed for the torque noise
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        start: StartArgs,
    },

    /// Ask the completion service for a known answer
    Probe {
        #[arg(long, default_value = "robot-test.txt")]
        question_file: PathBuf,

        #[arg(long, default_value = DEFAULT_EXPECTED)]
        expected: String,

        #[arg(long, value_enum, default_value_t = Provider::Openrouter)]
        provider: Provider,
    },
}

#[derive(clap::Args)]
struct StartArgs {
    /// Initial shoulder angle (rad)
    #[arg(long, allow_negative_numbers = true)]
    theta1: Option<f64>,

    /// Initial elbow angle (rad)
    #[arg(long, allow_negative_numbers = true)]
    theta2: Option<f64>,

    #[arg(long)]
    max_steps: Option<usize>,
}

impl StartArgs {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        let (theta1, theta2) = config.initial_angles;
        config = config.with_initial_angles(
            self.theta1.unwrap_or(theta1),
            self.theta2.unwrap_or(theta2),
        );
        if let Some(max_steps) = self.max_steps {
            config.driver = config.driver.with_max_steps(max_steps);
        }
        config
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OracleKind {
    Remote,
    Local,
    Pd,
    Zero,
}

#[derive(Clone, Copy, ValueEnum)]
enum Provider {
    Cerebras,
    Openrouter,
}

impl Provider {
    fn preset(self) -> TransportConfig {
        match self {
            Provider::Cerebras => TransportConfig::cerebras(),
            Provider::Openrouter => TransportConfig::openrouter(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Run {
            oracle,
            provider,
            start,
            json,
            dataset,
        } => {
            let mut config = start.apply(config);
            if let Some(path) = dataset {
                config = config.with_dataset_path(path);
            }
            run(config, oracle, provider, json)
        }
        Commands::Record { output, seed, start } => record(start.apply(config), &output, seed),
        Commands::Probe {
            question_file,
            expected,
            provider,
        } => run_probe(&question_file, &expected, provider),
    }
}

fn run(config: AppConfig, kind: OracleKind, provider: Option<Provider>, json: bool) -> Result<()> {
    let arm = TwoLinkArm::new(config.arm);
    let sim = Simulation::new(arm.clone(), config.driver);
    let initial = config.initial_angles;

    match kind {
        OracleKind::Remote => {
            let transport_config = provider.map_or_else(|| config.remote.clone(), Provider::preset);
            info!("querying {} ({})", transport_config.model, transport_config.endpoint);
            let transport = ChatCompletionsTransport::from_config(transport_config)
                .context("remote oracle is not available")?;
            let context = match fs::read_to_string(&config.dataset_path) {
                Ok(text) => text.trim().to_string(),
                Err(err) => {
                    warn!(
                        "cannot read {}: {err}; prompting without a dataset",
                        config.dataset_path.display()
                    );
                    String::new()
                }
            };
            let mut oracle =
                RemoteOracle::new(arm, transport, context).with_observer(echo_fragment);
            execute(&sim, initial, &mut oracle, json)?;
            let stats = oracle.stats();
            info!("{} answered, {} gravity fallbacks", stats.answered, stats.fallbacks);
        }
        OracleKind::Local => {
            let dataset = Dataset::load_file(&config.dataset_path).unwrap_or_else(|err| {
                warn!("{err}");
                Dataset::default()
            });
            info!("loaded {} transitions", dataset.len());
            let mut oracle = LocalOracle::new(arm, dataset);
            execute(&sim, initial, &mut oracle, json)?;
            let stats = oracle.stats();
            info!("{} answered, {} gravity fallbacks", stats.answered, stats.fallbacks);
        }
        OracleKind::Pd => {
            let mut oracle = PdOracle::new(arm, config.pd, config.seed);
            execute(&sim, initial, &mut oracle, json)?;
        }
        OracleKind::Zero => {
            execute(&sim, initial, &mut ZeroOracle, json)?;
        }
    }
    Ok(())
}

fn execute<O: TorqueOracle>(
    sim: &Simulation,
    initial: (f64, f64),
    oracle: &mut O,
    json: bool,
) -> Result<SimulationOutcome> {
    let stdout = io::stdout();
    let outcome = if json {
        let outcome = sim.run(initial, oracle);
        let mut out = stdout.lock();
        write_json(&mut out, &outcome).context("failed to encode trajectory")?;
        writeln!(out)?;
        outcome
    } else {
        let mut echo = TsvEcho::new(stdout.lock());
        let outcome = sim.run_with(initial, oracle, |transition| echo.row(transition));
        echo.finish().context("failed to write trajectory")?;
        outcome
    };
    report(sim, &outcome);
    Ok(outcome)
}

fn report(sim: &Simulation, outcome: &SimulationOutcome) {
    info!("{:?} after {} steps", outcome.termination, outcome.steps());
    let (_, tip) = sim.arm().joint_positions(&outcome.final_state);
    info!(
        "final angles ({:.6}, {:.6}), tip at ({:.3}, {:.3})",
        outcome.final_state.theta1, outcome.final_state.theta2, tip.x, tip.y
    );
}

/// Streams the model's answer to stderr as it arrives.
fn echo_fragment(event: StreamEvent<'_>) {
    let mut err = io::stderr();
    let _ = match event {
        StreamEvent::Fragment(text) => write!(err, "{text}"),
        StreamEvent::Finished => writeln!(err),
    };
}

fn record(config: AppConfig, output: &Path, seed: Option<u64>) -> Result<()> {
    let arm = TwoLinkArm::new(config.arm);
    let sim = Simulation::new(arm.clone(), config.driver);
    let mut oracle = PdOracle::new(arm, config.pd, seed.or(config.seed));

    let outcome = sim.run(config.initial_angles, &mut oracle);
    report(&sim, &outcome);

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    write_dataset(BufWriter::new(file), &outcome.transitions)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("wrote {} transitions to {}", outcome.steps(), output.display());
    Ok(())
}

fn run_probe(question_file: &Path, expected: &str, provider: Provider) -> Result<()> {
    let content = probe::read_or_create_question(question_file)?;
    let transport = ChatCompletionsTransport::from_config(provider.preset())?;
    let mut oracle = probe::probe_oracle(transport).with_observer(echo_fragment);

    let query = probe::build_probe_question("");
    info!("searching for torques matching: {}", query.lines().nth(1).unwrap_or_default());

    let report = probe::run_probe(&mut oracle, &content, expected).context("probe request failed")?;
    println!("{report}");
    match report.parsed {
        Some(tau) => info!("response parser extracts ({}, {})", tau.tau1, tau.tau2),
        None => info!("response parser finds no torque pair"),
    }
    Ok(())
}
