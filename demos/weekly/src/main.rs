//! weekly — optimize the Oslo ambulance allocation for one week of calls.
//!
//! Replays a synthetic incident week (or a CSV given as the first argument)
//! against a population-proportionate baseline, then searches for better
//! allocations with the single- and multi-objective genetic algorithms and
//! stochastic local search.
//! Travel times come from a constant-speed straight-line oracle.
//!
//! Log level is read from `RUST_LOG` (default `info`).

mod synthetic;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

use ems_core::{Allocation, SearchRng, StationTable};
use ems_incident::{DemandTable, UrgencyLevel, load_incidents_csv};
use ems_optim::{
    FitnessConfig, GaConfig, GeneticAlgorithm, InitializerKind, MultiObjectiveGeneticAlgorithm, Optimizer, Problem,
    SlsConfig, StochasticLocalSearch,
};
use ems_sim::{SimConfig, SimulationResults, SimulatorBuilder};
use ems_spatial::{HospitalIndex, StraightLineOracle};

use synthetic::incident_week;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:             u64 = 42;
const SYNTHETIC_CALLS:  usize = 1_500;
const SPEED_KMH:        f64 = 50.0;
const SEARCH_BUDGET:    Duration = Duration::from_secs(60);
const OUTPUT_DIR:       &str = "output/weekly";

// ── Reporting ─────────────────────────────────────────────────────────────────

fn summarize(label: &str, results: &SimulationResults) -> serde_json::Value {
    let average = results.average_response_secs().unwrap_or(f64::NAN);
    let survival = results.average_survival_rate().unwrap_or(f64::NAN);
    let acute_12 = results.share_within(UrgencyLevel::Acute, 12 * 60).unwrap_or(f64::NAN);
    println!(
        "{:<10} {:>8} {:>12.1} {:>10.4} {:>10.3}",
        label,
        results.len(),
        average,
        survival,
        acute_12
    );
    json!({
        "responses": results.len(),
        "average_response_secs": average,
        "average_survival": survival,
        "acute_within_12_min": acute_12,
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();
    let config = SimConfig::default();
    let stations = StationTable::oslo();

    // 1. Incidents.
    let incidents = match std::env::args().nth(1) {
        Some(path) => {
            let (log, report) = load_incidents_csv(Path::new(&path))?;
            info!(path = %path, rows = report.rows, skipped = report.skipped, "loaded incidents");
            log
        }
        None => incident_week(&stations, config.first_call_time(), config.end, SYNTHETIC_CALLS, SEED),
    };
    let demand = DemandTable::from_incidents(&incidents);
    println!("=== weekly — ambulance allocation ===");
    println!(
        "Incidents: {}  |  Stations: {}  |  Ambulances: {} day / {} night",
        incidents.len(),
        stations.len(),
        config.ambulances_day,
        config.ambulances_night
    );
    println!();

    // 2. Simulator.
    let oracle = Arc::new(StraightLineOracle::new(SPEED_KMH / 3.6, 1));
    let simulator = Arc::new(
        SimulatorBuilder::new(incidents, oracle)
            .stations(stations)
            .hospitals(HospitalIndex::oslo())
            .demand(demand)
            .build()?,
    );

    // 3. Baseline.
    let problem = Problem::from_simulation(Arc::clone(&simulator), config.clone(), FitnessConfig::default())?;
    let baseline: Allocation =
        problem.generate(InitializerKind::PopulationProportionate.initializer(), &mut SearchRng::new(SEED));

    // 4. Search.
    let t0 = Instant::now();
    let ga_config = GaConfig {
        population_size: 24,
        elite_size: 2,
        tournament_size: 4,
        max_generations: 10,
        max_running_time: SEARCH_BUDGET,
        seed: SEED,
        initializer: InitializerKind::Mix,
        ..GaConfig::default()
    };
    let mut ga = GeneticAlgorithm::new(problem.clone(), ga_config.clone())?;
    ga.optimize()?;

    let mut moga = MultiObjectiveGeneticAlgorithm::new(problem.clone(), ga_config)?;
    moga.optimize()?;
    info!(front = moga.pareto_front().count(), "multi-objective search done");

    let mut sls = StochasticLocalSearch::new(
        problem,
        SlsConfig { max_tries: 25, max_running_time: SEARCH_BUDGET, seed: SEED, ..SlsConfig::default() },
    )?;
    sls.optimize()?;
    println!("Search complete in {:.1} s", t0.elapsed().as_secs_f64());
    println!();

    // 5. Summary.
    println!("{:<10} {:>8} {:>12} {:>10} {:>10}", "Allocation", "Calls", "Avg resp s", "Survival", "A ≤ 12 min");
    println!("{}", "-".repeat(54));
    let mut summary = serde_json::Map::new();
    summary.insert("baseline".into(), summarize("baseline", &simulator.simulate(&baseline, &config)?));

    let optimizers: [&dyn Optimizer; 3] = [&ga, &moga, &sls];
    for optimizer in optimizers {
        let Some(best) = optimizer.optimal_solution() else {
            continue;
        };
        let name = optimizer.abbreviation();
        let results = simulator.simulate(best.allocation(), &config)?;
        let mut entry = summarize(name, &results);
        entry["fitness"] = json!(best.cached_fitness());
        entry["statistics"] = serde_json::to_value(optimizer.run_statistics())?;
        entry["day"] = json!(best.allocation().day().iter().map(|s| s.0).collect::<Vec<_>>());
        entry["night"] = json!(best.allocation().night().iter().map(|s| s.0).collect::<Vec<_>>());
        summary.insert(name.into(), entry);
    }
    summary.insert("config".into(), serde_json::to_value(&config)?);

    std::fs::create_dir_all(OUTPUT_DIR)?;
    let path = Path::new(OUTPUT_DIR).join("summary.json");
    std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
    println!();
    println!("Wrote {}", path.display());
    Ok(())
}
