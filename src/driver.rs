//! Fixed-cadence tick loop for hosts running on tokio.
//!
//! DESIGN
//! ======
//! The session is `!Send`, so this never spawns: it runs on the caller's task
//! (a `current_thread` runtime or a `LocalSet`). Each interval tick calls
//! `NetworkSession::tick` once; missed ticks are skipped rather than bursted
//! so a stalled host does not replay a backlog of I/O steps.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::engine::ConnectionEngine;
use crate::session::NetworkSession;

const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
const MIN_TICK_INTERVAL_MS: u64 = 1;

/// Tick period from `LOBBY_TICK_INTERVAL_MS`, default 50ms, never below 1ms.
#[must_use]
pub fn tick_interval_from_env() -> Duration {
    let ms = env_parse("LOBBY_TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS);
    Duration::from_millis(ms.max(MIN_TICK_INTERVAL_MS))
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Tick `session` every `period` until `shutdown` resolves or the session is
/// disconnected. Returns the number of ticks performed.
///
/// Shutdown wins over a tick that is due at the same time. A zero `period`
/// is raised to 1ms.
pub async fn run<E, F>(session: &mut NetworkSession<E>, period: Duration, shutdown: F) -> u64
where
    E: ConnectionEngine,
    F: Future<Output = ()>,
{
    let period = period.max(Duration::from_millis(MIN_TICK_INTERVAL_MS));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut ticks: u64 = 0;
    info!(?period, player = %session.player_name(), "tick loop started");
    while session.is_connected() {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                debug!("tick loop shutdown requested");
                break;
            }
            _ = interval.tick() => {
                session.tick();
                ticks += 1;
            }
        }
    }
    info!(ticks, connected = session.is_connected(), "tick loop stopped");
    ticks
}

#[cfg(test)]
#[path = "driver_test.rs"]
mod tests;
