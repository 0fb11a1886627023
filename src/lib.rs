//! Client-side lobby session on top of an external connection engine.
//!
//! The engine does the protocol work. This crate owns what sits above it:
//! connection lifecycle with deterministic teardown, routing of server-pushed
//! events (join/leave, chat, system messages) into the lobby or room log, and
//! the player list.
//!
//! ```text
//! host ── tick() ──▶ NetworkSession ──▶ Connection::tick()
//!                          ▲                   │
//!                          └──── bindings ◀────┘  (same thread, same call)
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod log;
pub mod players;
pub mod session;

#[cfg(test)]
mod mock_engine;

pub use config::SessionConfig;
pub use engine::{Connection, ConnectionEngine, EventContext};
pub use error::SessionError;
pub use log::{EntryKind, LogEntry, MessageKind, MessageLog};
pub use players::PlayerList;
pub use session::NetworkSession;
