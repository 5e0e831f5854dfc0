//! Player-Radar server entry point.
//!
//! Wires together the infrastructure services and starts the Tokio async
//! runtime. In a real deployment the host game server delivers session events
//! and owns the per-connection packet queues; this headless binary stands in
//! for it with a small simulation — a few entities orbiting the origin — so
//! the broadcast loop can be observed end to end.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML config or defaults
//!  └─ ChannelTransport       -- per-entity outbound packet queues
//!  └─ RadarService           -- registry + diff engine + scheduler
//!  └─ spawn_session_pump     -- host connect/disconnect events
//!  └─ simulation tasks       -- movers + per-entity frame drains
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use radar_core::{decode_update, EntityRef, Position};
use radar_server::application::broadcast::RadarService;
use radar_server::infrastructure::session::{spawn_session_pump, SessionEvent};
use radar_server::infrastructure::storage::config::{config_file_path, load_config, save_config};
use radar_server::infrastructure::transport::ChannelTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so its log level can seed the filter;
    // `RUST_LOG` still overrides it.
    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config unreadable, using defaults: {e}");
            Default::default()
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.radar.log_level.clone())),
        )
        .init();

    info!("Player-Radar server starting");

    // First run: write the defaults out so operators have a file to edit.
    if let Ok(path) = config_file_path() {
        if !path.exists() {
            if let Err(e) = save_config(&config) {
                warn!("could not write default config to {}: {e}", path.display());
            }
        }
    }

    let transport = Arc::new(ChannelTransport::new());
    let service = Arc::new(RadarService::new(
        config.broadcast_config(),
        Arc::clone(&transport) as _,
    ));

    // ── Session event pump ────────────────────────────────────────────────────
    let (session_tx, session_rx) = mpsc::channel(64);
    spawn_session_pump(Arc::clone(&service), session_rx);

    service.start();

    // ── Simulated session: three entities orbiting spawn ──────────────────────
    for (i, name) in ["steve", "alex", "herobrine"].iter().enumerate() {
        let id = Uuid::new_v4();
        let entity = EntityRef::new(id, *name, Position::new(i as f64 * 10.0, 64.0, 0.0));

        // The packet queue the host would attach to this connection.
        let (packet_tx, mut packet_rx) = mpsc::channel::<Vec<u8>>(32);
        transport.register_connection(id, packet_tx);

        // Drain task: what the real host's connection writer would do.
        let drain_name = name.to_string();
        tokio::spawn(async move {
            while let Some(frame) = packet_rx.recv().await {
                match decode_update(&frame) {
                    Ok((update, _)) => debug!(
                        viewer = %drain_name,
                        add = update.markers_to_add.len(),
                        remove = update.marker_ids_to_remove.len(),
                        "compass update delivered"
                    ),
                    Err(e) => warn!(viewer = %drain_name, "bad frame: {e}"),
                }
            }
        });

        // Mover task: the host's world simulation mutating the live position.
        let position = entity.position_handle();
        let phase = i as f64 * 2.0;
        tokio::spawn(async move {
            let mut t = 0.0f64;
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                t += 0.1;
                let mut pos = position.write().unwrap_or_else(std::sync::PoisonError::into_inner);
                pos.x = ((t + phase).cos()) * 40.0;
                pos.z = ((t + phase).sin()) * 40.0;
            }
        });

        session_tx.send(SessionEvent::Connected(entity)).await?;
    }

    // Give the pump a moment to register the simulated entities before the
    // readiness line reports the count.
    tokio::time::sleep(Duration::from_millis(50)).await;
    info!(
        entities = service.active_count(),
        "Player-Radar ready.  Press Ctrl-C to exit."
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    service.stop();
    info!("Player-Radar server stopped");
    Ok(())
}
