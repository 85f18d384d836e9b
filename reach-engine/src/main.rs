use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use reach_engine::distance::{KvEstimateStorage, OsrmDistanceClient, WalkingCostProviderBuilder};
use reach_engine::planner::{ForkJoinAllocator, ReachPlanner};
use reach_engine::scenario::Scenario;
use reach_engine::schedule::TimetableSchedule;
use reach_engine::scorecard::{PathScoreCard, ScoreCard};
use reach_engine::store::{KeyValueStore, MemoryStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: reach-engine <scenario.json>");
        return ExitCode::from(2);
    };

    match run(Path::new(&path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &Path) -> Result<(), BoxError> {
    let scenario = Scenario::load(path)?;
    info!(
        stops = scenario.stops.len(),
        landmarks = scenario.landmarks.len(),
        trips = scenario.trips.len(),
        tasks = scenario.tasks.len(),
        "Loaded scenario"
    );

    let schedule = TimetableSchedule::new(
        scenario.stops.iter().cloned(),
        scenario.trips.iter().cloned(),
    );

    let store = estimate_store(&scenario)?;
    let mut builder =
        WalkingCostProviderBuilder::new(scenario.locations(), scenario.walking.clone())
            .with_cache(scenario.cache.clone())
            .with_storage(
                Arc::new(KvEstimateStorage::new(store)),
                scenario.walking.max_walk_meters,
            );
    if let Some(osrm) = &scenario.osrm {
        info!(base_url = %osrm.base_url, profile = %osrm.profile, "Using OSRM walking distances");
        builder = builder
            .with_max_batch(osrm.max_batch)
            .with_client(Arc::new(OsrmDistanceClient::new(osrm.clone())?));
    }
    let walking = builder.build();

    let allocator = match scenario.search.threads {
        Some(threads) => ForkJoinAllocator::with_threads(threads)?,
        None => ForkJoinAllocator::new(),
    };
    let scorecard = PathScoreCard::new();
    let planner = ReachPlanner::new(&scenario.search, &walking, &schedule, &scorecard, &allocator);

    let mut failures = 0usize;
    for (task, result) in planner.run_batch(&scenario.tasks) {
        let line = match result {
            Ok(stats) => json!({
                "task": task.0,
                "reached": scorecard.locations_reached(task).len(),
                "stats": stats,
            }),
            Err(e) => {
                failures += 1;
                json!({
                    "task": task.0,
                    "error": e.to_string(),
                    "fatal": e.is_fatal(),
                })
            }
        };
        println!("{line}");
    }

    if failures > 0 {
        warn!(failures, "Some tasks failed");
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn estimate_store(scenario: &Scenario) -> Result<Arc<dyn KeyValueStore>, BoxError> {
    use reach_engine::store::SqliteStore;

    match &scenario.estimate_db {
        Some(path) => {
            info!(path = %path.display(), "Persisting estimates to SQLite");
            Ok(Arc::new(SqliteStore::open(path)?))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

#[cfg(not(feature = "sqlite"))]
fn estimate_store(scenario: &Scenario) -> Result<Arc<dyn KeyValueStore>, BoxError> {
    if let Some(path) = &scenario.estimate_db {
        warn!(path = %path.display(), "Built without the sqlite feature; keeping estimates in memory");
    }
    Ok(Arc::new(MemoryStore::new()))
}
