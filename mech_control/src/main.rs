//! # Mechanism Control
//!
//! Loads a system description, builds the mechanism tree on the configured
//! actuator drivers and runs the fixed-period control loop.
//!
//! ```bash
//! # Print the planned system feedforward and exit
//! mech_control --config config/example_robot.toml --plan
//!
//! # Run 500 cycles with debug logging
//! mech_control --config config/example_robot.toml --cycles 500 -v
//! ```

use clap::Parser;
use mech_common::config::{ConfigError, ConfigLoader};
use mech_common::consts::DEFAULT_CONFIG_PATH;
use mech_control::config::SystemConfig;
use mech_control::cycle::CycleRunner;
use mech_control::system::SystemFeedforward;
use mech_hal::ActuatorRegistry;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Mechanism Control: hierarchical feedforward control loop
#[derive(Parser, Debug)]
#[command(name = "mech_control")]
#[command(version)]
#[command(about = "Hierarchical feedforward control for multi-body mechanisms")]
struct Args {
    /// Path to the system description TOML.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Stop after this many cycles (default: run until Ctrl-C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Print the system feedforward for the configured set-points and exit.
    #[arg(long)]
    plan: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let loaded = SystemConfig::load(&args.config);

    let level = match (&loaded, args.verbose) {
        (_, true) => Level::DEBUG,
        (Ok(cfg), false) => cfg.shared.log_level.into(),
        (Err(_), false) => Level::INFO,
    };
    setup_tracing(level, args.json);

    info!("Mechanism Control v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, loaded) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Mechanism Control shutdown complete");
}

fn run(
    args: &Args,
    loaded: Result<SystemConfig, ConfigError>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = loaded?;
    info!(
        "Config OK: system={}, mechanisms={}, relations={}, cycle_time={}ms",
        config.system.name,
        config.mechanisms.len(),
        config.relations.len(),
        config.system.cycle_time_ms,
    );

    let registry = ActuatorRegistry::with_builtin();
    info!("Available drivers: {:?}", registry.list_drivers());
    let mut system = config.build(&registry)?;

    let reachable = system.reachable();
    for name in system.names() {
        if !reachable.contains(&name) {
            warn!(mechanism = name, root = ?system.root(), "Mechanism not reachable from root");
        }
    }

    if args.plan {
        let plan = system.calculate_system_feedforward(&config.setpoint_map());
        println!("{}", serde_json::to_string_pretty(&plan_to_json(&plan))?);
        return Ok(());
    }

    let mut runner = CycleRunner::new(system, config.cycle_time());

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let stats = runner.run(args.cycles)?;
    info!(
        "Ran {} cycles: avg={}us max={}us overruns={} faulted={}",
        stats.cycle_count,
        stats.avg_cycle().as_micros(),
        stats.max_cycle.as_micros(),
        stats.overruns,
        stats.faulted_cycles,
    );
    Ok(())
}

fn plan_to_json(plan: &SystemFeedforward) -> serde_json::Value {
    let entries = plan
        .feedforward
        .iter()
        .map(|(name, ff)| {
            let motion = plan
                .input_motion
                .get(name)
                .map(|m| [m.x, m.y, m.z])
                .unwrap_or_default();
            (
                name.clone(),
                serde_json::json!({
                    "feedforward": [ff.x, ff.y, ff.z],
                    "input_motion": motion,
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(entries)
}

/// Setup tracing subscriber.
fn setup_tracing(level: Level, json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
