//! Print snapshots and events from a live session
//!
//! ```text
//! SPROUT_API_BASE=http://raspberrypi.local:8000 \
//! SPROUT_API_KEY=secret \
//! SPROUT_LOG_MODE=development \
//!     cargo run -p sprout-sdk --example watch_session
//! ```
//!
//! Waters once at startup, then prints every change until Ctrl-C.

use sprout_sdk::logging;
use sprout_sdk::{ClientConfig, Feature, PlantEvent, PlantSession, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let session = PlantSession::start(ClientConfig::from_env(), SessionConfig::default())?;
    let mut snapshots = session.watch();
    let mut events = session.subscribe();

    if !session.is_enabled(Feature::Polling) {
        println!("SPROUT_API_BASE is not set; running offline");
    }
    if let Some(url) = session.preview_url() {
        println!("Live preview: {url}");
    }

    session.touch()?;
    if session.is_enabled(Feature::Watering) {
        match session.water().await {
            Ok(outcome) => println!("Watering: {outcome:?}"),
            Err(e) => println!("Watering failed: {e}"),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = snapshots.borrow_and_update().clone();
                println!(
                    "mood={:?} dry={} light={} cooldown={}s hearts={}/{}/{}",
                    s.mood,
                    s.sensors.soil_is_dry,
                    s.sensors.light_level.as_u8(),
                    s.cooldown_remaining_secs,
                    s.hearts.photo_taken,
                    s.hearts.watered,
                    s.hearts.touched,
                );
            }
            Ok(event) = events.recv() => {
                if let PlantEvent::WaterDropCue = event {
                    println!("💧");
                } else {
                    println!("event: {event:?}");
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}
