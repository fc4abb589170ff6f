//! `matchbot-cli` – Match Control Command Line Interface
//!
//! Runs the match routines and the driver button layout against the
//! simulated robot so they can be checked without hardware.
//!
//! 1. Loads `~/.matchbot/config.toml` (or `--config`), falling back to
//!    defaults, then applies `MATCHBOT_*` environment overrides.
//! 2. Pushes the drivetrain tuning to the chassis.
//! 3. Runs one subcommand: `list`, `show`, `run`, `press` or `init`.

mod config;
mod report;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, warn};

use matchbot_hal::SimClock;
use matchbot_hal::range::is_valid_reading;
use matchbot_hal::sim::{SimChassis, SimRangeSensor};
use matchbot_runtime::{
    Button, Dispatcher, OperatorControl, RangingCorrector, RoutineId, RoutineSelector, Sequencer,
    SimRobot,
};

#[derive(Parser, Debug)]
#[command(name = "matchbot", version, about = "Match routines and driver control on a simulated robot")]
struct Cli {
    /// Config file to use instead of ~/.matchbot/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selectable routines.
    List,
    /// Print the steps of a routine.
    Show {
        routine: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Run a routine against the simulated robot.
    Run {
        /// Routine slug, e.g. `skills-full`.  Defaults to the configured one.
        routine: Option<String>,
        /// Override the simulated distance sensor reading.
        #[arg(long)]
        range_mm: Option<i32>,
        /// Override the simulated settle time of each drive motion.
        #[arg(long)]
        motion_ms: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Feed controller samples through the driver layout.
    ///
    /// Each sample is a `+`-joined set of held buttons (`B+DOWN`), or `none`.
    Press {
        #[arg(required = true)]
        samples: Vec<String>,
    },
    /// Write the default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let _telemetry = matchbot_runtime::init_tracing("matchbot");
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = match config::load_from(&path) {
        Ok(Some(cfg)) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        Ok(None) => config::Config::default(),
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            config::Config::default()
        }
    };
    config::apply_env_overrides(&mut cfg);

    match cli.command {
        Command::List => {
            list(&cfg);
            ExitCode::SUCCESS
        }
        Command::Show { routine, json } => match resolve(routine.as_deref(), &cfg) {
            Ok(id) => {
                show(id, json);
                ExitCode::SUCCESS
            }
            Err(code) => code,
        },
        Command::Run {
            routine,
            range_mm,
            motion_ms,
            json,
        } => {
            let id = match resolve(routine.as_deref(), &cfg) {
                Ok(id) => id,
                Err(code) => return code,
            };
            if let Some(mm) = range_mm {
                cfg.sim.range_mm = mm;
            }
            if let Some(ms) = motion_ms {
                cfg.sim.motion_time_ms = ms;
            }
            run(id, &cfg, json)
        }
        Command::Press { samples } => press(&samples, &cfg),
        Command::Init { force } => init(&path, force),
    }
}

fn resolve(slug: Option<&str>, cfg: &config::Config) -> Result<RoutineId, ExitCode> {
    match slug {
        None => Ok(cfg.default_routine),
        Some(s) => s.parse::<RoutineId>().map_err(|e| {
            eprintln!("{}: {}", "Error".red(), e);
            eprintln!("  Run `{}` to see the routines.", "matchbot list".bold());
            ExitCode::FAILURE
        }),
    }
}

fn list(cfg: &config::Config) {
    let mut selector = RoutineSelector::new(RoutineId::ALL[0]);
    for _ in RoutineId::ALL {
        let id = selector.current();
        let marker = if id == cfg.default_routine { "*".green().bold() } else { " ".normal() };
        println!(
            "  {} {:<14} {:>3} steps  {}",
            marker,
            id.slug().bold(),
            id.routine().len(),
            selector.label()
        );
        selector.next();
    }
}

fn show(id: RoutineId, json: bool) {
    let routine = id.routine();
    if json {
        match serde_json::to_string_pretty(&routine) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("{}: {}", "Error".red(), e),
        }
        return;
    }
    println!("  {} – {}", id.slug().bold(), id.label());
    for (i, step) in routine.steps.iter().enumerate() {
        println!("  {:>3}  {:<14} {:?}", i, step.kind().bold(), step);
    }
}

fn sim_robot(cfg: &config::Config) -> SimRobot {
    if !is_valid_reading(cfg.sim.range_mm) {
        warn!(
            range_mm = cfg.sim.range_mm,
            "simulated range is outside the trusted window; corrections will report a sensor fault"
        );
    }
    let clock = SimClock::new();
    let chassis = SimChassis::new(clock.clone())
        .with_motion_time(Duration::from_millis(cfg.sim.motion_time_ms));
    let mut sim = SimRobot::build(chassis, SimRangeSensor::constant(cfg.sim.range_mm), clock);
    sim.robot.apply_tuning(&cfg.tuning);
    sim
}

fn dispatcher(cfg: &config::Config) -> Dispatcher {
    Dispatcher::new(Sequencer::new(RangingCorrector::new(
        cfg.correction.clone(),
    )))
}

fn run(id: RoutineId, cfg: &config::Config, json: bool) -> ExitCode {
    let mut sim = sim_robot(cfg);
    let report = dispatcher(cfg).run(&mut sim.robot, id);

    if json {
        return match serde_json::to_string_pretty(&report) {
            Ok(s) => {
                println!("{s}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                ExitCode::FAILURE
            }
        };
    }

    println!("\n  {} – {}\n", id.slug().bold().cyan(), id.label());
    report::print_report(&report);
    let state = sim.robot.mechanisms.state();
    let active: Vec<String> = state.active().iter().map(|m| m.to_string()).collect();
    println!(
        "  Mechanisms left on: {}\n",
        if active.is_empty() { "none".dimmed().to_string() } else { active.join(", ") }
    );
    ExitCode::SUCCESS
}

fn parse_sample(sample: &str) -> Result<BTreeSet<Button>, String> {
    if sample.trim().eq_ignore_ascii_case("none") {
        return Ok(BTreeSet::new());
    }
    sample
        .split('+')
        .map(|b| b.parse::<Button>().map_err(|e| e.to_string()))
        .collect()
}

fn press(samples: &[String], cfg: &config::Config) -> ExitCode {
    let mut held = Vec::with_capacity(samples.len());
    for sample in samples {
        match parse_sample(sample) {
            Ok(set) => held.push(set),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    let mut sim = sim_robot(cfg);
    let dispatcher = dispatcher(cfg);
    let mut control = OperatorControl::default();
    control.begin(&mut sim.robot);

    for (sample, set) in samples.iter().zip(&held) {
        let (state, run_autonomous) = control.step(&mut sim.robot, set);
        let active: Vec<String> = state.active().iter().map(|m| m.to_string()).collect();
        println!(
            "  {:<12} {}",
            sample.bold(),
            if active.is_empty() { "all off".dimmed().to_string() } else { active.join(", ") }
        );
        if run_autonomous {
            println!("  {} running {}", "▶".cyan().bold(), cfg.default_routine.slug().bold());
            let report = dispatcher.run(&mut sim.robot, cfg.default_routine);
            report::print_report(&report);
            control.begin(&mut sim.robot);
        }
    }
    ExitCode::SUCCESS
}

fn init(path: &std::path::Path, force: bool) -> ExitCode {
    if path.exists() && !force {
        println!(
            "  Config already exists at {} (use {} to overwrite).",
            path.display().to_string().bold(),
            "--force".bold()
        );
        return ExitCode::SUCCESS;
    }
    match config::save_to(&config::Config::default(), path) {
        Ok(()) => {
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_parse_to_button_sets() {
        let set = parse_sample("b+Down").expect("valid");
        assert_eq!(set, [Button::B, Button::Down].into_iter().collect());
        assert!(parse_sample("none").expect("valid").is_empty());
        assert!(parse_sample("B+Q").is_err());
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from(["matchbot", "run", "skills-park", "--range-mm", "102", "--json"])
            .expect("parse");
        match cli.command {
            Command::Run { routine, range_mm, json, .. } => {
                assert_eq!(routine.as_deref(), Some("skills-park"));
                assert_eq!(range_mm, Some(102));
                assert!(json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sim_robot_uses_configured_tuning() {
        let mut cfg = config::Config::default();
        cfg.sim.range_mm = 102;
        let mut sim = sim_robot(&cfg);
        assert_eq!(
            sim.chassis.commands(),
            vec![matchbot_hal::sim::ChassisCommand::ApplyTuning]
        );

        let report = dispatcher(&cfg).run(&mut sim.robot, RoutineId::SkillsPark);
        assert_eq!(report.faults(), 0);
        assert_eq!(report.elapsed_ms, 4000);
    }
}
