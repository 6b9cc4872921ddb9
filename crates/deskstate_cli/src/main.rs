//! First-launch runner.
//!
//! # Responsibility
//! - Run the first-launch flow (initial data, ToS acceptance, starter
//!   layout) against an in-memory store.
//! - Keep output deterministic apart from generated ids.

use deskstate_core::{init_logging_from_config, ClientService, CoreConfig, EventBus, ObjectStore};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run_first_launch() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("first launch failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_first_launch() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::default();
    let log_dir = std::env::temp_dir().join("deskstate-logs");
    if let Err(err) = init_logging_from_config(&config, &log_dir.to_string_lossy()) {
        // Logging is best effort here.
        eprintln!("logging disabled: {err}");
    }

    let store = Arc::new(ObjectStore::open_in_memory()?);
    let bus = Arc::new(EventBus::new());
    let service = ClientService::new(store, Arc::clone(&bus), config);

    let client = service.ensure_initial_data(&mut service.new_context())?;
    let window_id = client
        .window_ids
        .first()
        .cloned()
        .ok_or("client has no windows after init")?;
    let events = bus.register(window_id.as_str());

    let updates = service.agree_tos(service.new_context())?;
    println!("first_launch window_id={window_id} updates={}", updates.len());

    for event in events.try_iter() {
        if let Some(action) = event.as_layout_action() {
            println!(
                "layout_action block_id={} index_path={:?}",
                action.block_id, action.index_path
            );
        }
    }
    Ok(())
}
