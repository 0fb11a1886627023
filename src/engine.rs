//! Contract for the external connection engine.
//!
//! ARCHITECTURE
//! ============
//! The engine does the actual protocol work; this crate only wraps it. The
//! contract is split in two: [`ConnectionEngine`] is the capability that loads
//! config and creates/destroys connections, and [`Connection`] is the live
//! handle that ticks, sends, and dispatches inbound events to registered
//! bindings.
//!
//! Bindings are invoked synchronously from inside [`Connection::tick`]. Each
//! invocation receives the connection itself as an [`EventContext`], the same
//! way a native callback receives its context pointer, so a binding can ask
//! "are we in a room?" at dispatch time without re-entering the engine.

use std::path::Path;
use std::rc::Rc;

/// Read-only view of connection state available to bindings during dispatch.
pub trait EventContext {
    /// `true` while the local player is inside a room rather than the lobby.
    fn is_in_room_context(&self) -> bool;
}

/// Binding for lobby-join events: `(ctx, name)`.
pub type JoinBinding = Rc<dyn Fn(&dyn EventContext, &str)>;
/// Binding for lobby-leave events: `(ctx, name, reason)`.
pub type LeaveBinding = Rc<dyn Fn(&dyn EventContext, &str, &str)>;
/// Binding for chat events: `(ctx, sender, text)`.
pub type ChatBinding = Rc<dyn Fn(&dyn EventContext, &str, &str)>;
/// Binding for system messages: `(ctx, type_code, text)`.
pub type MessageBinding = Rc<dyn Fn(&dyn EventContext, i32, &str)>;

/// Parameters for [`ConnectionEngine::connect`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectParams<'a> {
    pub player_name: &'a str,
    pub data_path: &'a Path,
    pub host: &'a str,
    pub port: u16,
}

/// Capability that creates and destroys connections.
///
/// Implementations are used from a single thread; nothing here requires `Send`.
pub trait ConnectionEngine {
    /// Loaded metascheme (ruleset configuration).
    type Config;
    /// Live connection handle.
    type Connection: Connection;

    /// Load the metascheme from `path`. `None` if missing or unreadable.
    fn load_config(&self, path: &Path) -> Option<Self::Config>;

    /// Release a metascheme. Must accept `None`.
    fn release_config(&self, config: Option<Self::Config>);

    /// Establish a connection. `None` if the server could not be reached.
    fn connect(&self, params: &ConnectParams<'_>, config: &Self::Config) -> Option<Self::Connection>;

    /// Tear down a connection. After this the engine never invokes its bindings again.
    fn destroy(&self, connection: Self::Connection);
}

/// A live connection created by a [`ConnectionEngine`].
pub trait Connection: EventContext {
    /// Make bounded I/O progress and dispatch pending events to bindings.
    fn tick(&mut self);

    fn send_chat(&mut self, text: &str);
    fn send_nick(&mut self, nick: &str);
    fn send_password(&mut self, password: &str);
    fn send_quit(&mut self, message: &str);

    fn on_lobby_join(&mut self, binding: JoinBinding);
    fn on_lobby_leave(&mut self, binding: LeaveBinding);
    fn on_chat(&mut self, binding: ChatBinding);
    fn on_message(&mut self, binding: MessageBinding);
}

// =============================================================================
// CONNECTION HANDLE
// =============================================================================

/// Exclusive owner of a live connection.
///
/// Not `Clone`; the only release path is [`ConnectionHandle::destroy`], which
/// consumes the handle, so a connection cannot be destroyed twice.
pub struct ConnectionHandle<C> {
    inner: C,
}

impl<C: Connection> ConnectionHandle<C> {
    pub(crate) fn new(inner: C) -> Self {
        Self { inner }
    }

    pub(crate) fn get(&self) -> &C {
        &self.inner
    }

    pub(crate) fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub(crate) fn destroy<E>(self, engine: &E)
    where
        E: ConnectionEngine<Connection = C>,
    {
        engine.destroy(self.inner);
    }
}

// =============================================================================
// CONFIG GUARD
// =============================================================================

/// Scope guard that releases a metascheme exactly once, on every exit path.
pub(crate) struct ConfigGuard<'e, E: ConnectionEngine> {
    engine: &'e E,
    config: Option<E::Config>,
}

impl<'e, E: ConnectionEngine> ConfigGuard<'e, E> {
    pub(crate) fn load(engine: &'e E, path: &Path) -> Self {
        Self { engine, config: engine.load_config(path) }
    }

    pub(crate) fn config(&self) -> Option<&E::Config> {
        self.config.as_ref()
    }
}

impl<E: ConnectionEngine> Drop for ConfigGuard<'_, E> {
    fn drop(&mut self) {
        self.engine.release_config(self.config.take());
    }
}
