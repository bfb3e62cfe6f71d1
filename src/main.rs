use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use junction_sim::simulation::{Junction, JunctionConfig, KpiWeights};

#[derive(Parser)]
#[command(name = "junction_sim")]
#[command(about = "Headless traffic junction simulation")]
struct Cli {
    /// Number of arms on the junction
    #[arg(long, default_value = "4")]
    arms: usize,

    /// Vehicles per hour between every pair of distinct arms
    #[arg(long, default_value = "300")]
    vph: f64,

    /// Explicit demand matrix in vehicles per hour, rows separated by ';'
    /// (e.g. "0,200,100;150,0,80;90,60,0"). Overrides --arms and --vph.
    #[arg(long)]
    demand: Option<String>,

    /// Lanes per arm, including bus and left-turn lanes
    #[arg(long, default_value = "2")]
    lanes: usize,

    /// Permitted relative directions per ordinary lane, lanes separated by ';'
    /// (e.g. "1,2;2,3")
    #[arg(long)]
    lane_directions: Option<String>,

    /// Reserve the first lane of every arm for buses
    #[arg(long)]
    bus_lane: bool,

    /// Fraction of arrivals that are buses
    #[arg(long, default_value = "0.0")]
    bus_ratio: f64,

    /// Add a dedicated left-turn lane to every arm
    #[arg(long)]
    left_turn_lane: bool,

    /// Pedestrian crossing duration in seconds; enables the crossing
    #[arg(long)]
    crossing_duration: Option<u64>,

    /// Pedestrian crossing requests per hour
    #[arg(long, default_value = "0.0")]
    crossing_frequency: f64,

    /// Simulated time in minutes
    #[arg(long, default_value = "60")]
    duration_mins: u64,

    /// Length of one simulation step in milliseconds
    #[arg(long, default_value = "100")]
    step_ms: u64,

    /// Seed for the random number generator
    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    info!(
        "Running {} minutes of simulated time in {}ms steps (seed {})",
        cli.duration_mins, cli.step_ms, cli.seed
    );

    let mut junction =
        Junction::with_seed(config, cli.seed).context("Failed to build the junction")?;
    let result = junction.run();

    log_summary(&junction);
    result.context("Simulation aborted before the configured duration")
}

fn build_config(cli: &Cli) -> Result<JunctionConfig> {
    let mut config = match &cli.demand {
        Some(matrix) => JunctionConfig::from_demand(
            parse_demand(matrix).context("Failed to parse --demand")?,
        ),
        None => JunctionConfig::uniform(cli.arms, cli.vph),
    };

    config = config
        .with_lanes(cli.lanes)
        .with_bus_ratio(cli.bus_ratio)
        .with_run(cli.duration_mins * 60 * 1000, cli.step_ms);
    if cli.bus_lane {
        config = config.with_bus_lane(cli.bus_ratio);
    }
    if cli.left_turn_lane {
        config = config.with_left_turn_lane();
    }
    if let Some(duration_s) = cli.crossing_duration {
        config = config.with_crossing(duration_s, cli.crossing_frequency);
    }
    if let Some(directions) = &cli.lane_directions {
        config = config.with_lane_directions(
            parse_lane_directions(directions).context("Failed to parse --lane-directions")?,
        );
    }
    Ok(config)
}

fn parse_demand(matrix: &str) -> Result<Vec<Vec<f64>>> {
    let rows = matrix
        .split(';')
        .map(|row| {
            row.split(',')
                .map(|value| {
                    value
                        .trim()
                        .parse::<f64>()
                        .with_context(|| format!("Invalid demand value '{}'", value.trim()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let size = rows.len();
    if let Some(row) = rows.iter().find(|row| row.len() != size) {
        bail!(
            "Demand matrix must be square: {} rows but a row has {} values",
            size,
            row.len()
        );
    }
    Ok(rows)
}

fn parse_lane_directions(lanes: &str) -> Result<Vec<Vec<usize>>> {
    lanes
        .split(';')
        .map(|lane| {
            lane.split(',')
                .map(|value| {
                    value
                        .trim()
                        .parse::<usize>()
                        .with_context(|| format!("Invalid direction '{}'", value.trim()))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn log_summary(junction: &Junction) {
    info!("=== SIMULATION COMPLETE ===");
    info!("Simulated time: {:.1}s", junction.elapsed_ms() as f64 / 1000.0);

    let throughputs = junction.arm_throughputs();
    for (arm, kpi) in junction.kpis().iter().enumerate() {
        info!(
            "Arm {}: average wait {:.2}s, max wait {:.2}s, max queue {}, throughput {}",
            arm,
            kpi.average_wait_s,
            kpi.max_wait_s,
            kpi.max_queue_length,
            throughputs.get(arm).copied().unwrap_or(0)
        );
    }
    for arm in junction.arms() {
        info!(
            "Arm {}: arrivals {} ({} buses)",
            arm.index(),
            arm.arrival_count(),
            arm.bus_arrival_count()
        );
    }
    info!(
        "Efficiency score: {:.1}",
        junction.efficiency(KpiWeights::default())
    );
}
