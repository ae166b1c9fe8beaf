//! Virtual Pet Simulation Demo
//!
//! Creates a pet in a JSON store, lets it tick for a few seconds, feeds it,
//! and prints what happened.
//!
//! Usage: pet-sim [DATA_DIR] [CONFIG_JSON]

use std::sync::Arc;
use std::time::Duration;

use simulation::{
    InteractionKind, JsonFileStore, LoadOutcome, PetMetrics, PetSession, SessionHandle,
    SimulationConfig, SystemClock,
};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

const DEMO_USER: &str = "demo-user";

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "pet-data".to_string());
    let config = match args.next() {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level()?)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Virtual pet engine starting (data in {})...", data_dir);

    let store = Arc::new(JsonFileStore::open(&data_dir)?);
    let metrics = Arc::new(PetMetrics::new());
    let session = PetSession::new(
        DEMO_USER,
        store,
        metrics.clone(),
        Arc::new(SystemClock),
        config.clone(),
    );
    let handle = SessionHandle::new(session);

    match handle.load()? {
        LoadOutcome::Loaded(record) if !record.is_dead => {
            info!("Welcome back, {} the {}", record.pet_name, record.pet_type);
        }
        LoadOutcome::Loaded(record) => {
            info!("{} has passed away; starting over", record.pet_name);
            handle.create("blueSheep", "Dolly")?;
        }
        LoadOutcome::NewUser => {
            handle.create("blueSheep", "Dolly")?;
        }
    }

    handle.start_ticking(|report| {
        info!(
            "hunger {:.1} | happiness {:.1} | health {:.1} | age {} | {:?}",
            report.stats.hunger, report.stats.happiness, report.stats.health, report.age, report.state
        );
    })?;

    std::thread::sleep(Duration::from_millis(config.tick_interval_ms * 5));
    let outcome = handle.interact(InteractionKind::Feed)?;
    info!("Fed the pet: {:?}", outcome);
    std::thread::sleep(Duration::from_millis(config.tick_interval_ms * 3));

    handle.sign_out();
    info!("Metrics summary: {:?}", metrics.summary());
    Ok(())
}
