mod config;
mod connection;
mod game;
mod security;
mod session;

use std::path::Path;
use std::time::{Duration, Instant};

use subspace_types::Tick;
use tracing_subscriber::EnvFilter;

use config::ClientConfig;
use game::{Game, ShipInput};

const TICK_HZ: u64 = 100;
const TICK_DURATION: Duration = Duration::from_millis(1000 / TICK_HZ);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let config = ClientConfig::load(Path::new("config/client.toml"))?;
    let started = Instant::now();
    let mut tick = Tick::ZERO;

    let mut game = Game::new(&config, tick, "zones")?;
    tracing::info!(arena = %config.arena_name, server = %config.server_ip, "connecting");

    loop {
        let frame_start = Instant::now();

        game.tick(tick, ShipInput::default());

        for (_, event) in game.drain_events() {
            tracing::debug!(?event, "game event");
        }

        if game.state().is_terminal() {
            tracing::info!(state = ?game.state(), "connection ended");
            break;
        }

        tick = tick.advance(1);
        let elapsed = frame_start.elapsed();
        if elapsed < TICK_DURATION {
            std::thread::sleep(TICK_DURATION - elapsed);
        }
    }

    tracing::info!(uptime_secs = started.elapsed().as_secs(), "client shut down");
    Ok(())
}
