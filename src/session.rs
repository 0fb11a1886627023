//! Network session: connection lifecycle and inbound event routing.
//!
//! DESIGN
//! ======
//! `NetworkSession` owns exactly one engine connection plus the lobby state it
//! feeds: a player list and two message logs (lobby, room). The host drives
//! `tick()`; the connection dispatches inbound events synchronously into the
//! four bindings registered at connect time, which mutate the shared state.
//!
//! Join/leave are always lobby-scoped. Chat and system messages go to the
//! log matching the room flag at dispatch time, which is read from the
//! connection on every routing decision and never cached.
//!
//! THREADING
//! =========
//! Single-threaded by construction: state is shared with the bindings through
//! `Rc<RefCell<_>>`, so the session is `!Send` and every tick, callback and
//! outbound call runs on the thread that owns it.
//!
//! LIFECYCLE
//! =========
//! The bindings are held as named fields for as long as the connection is
//! live and dropped only after the engine has destroyed it. `disconnect()` is
//! the single teardown path and is idempotent. Dropping a still-connected
//! session destroys the connection and logs a leaked-session error.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::config::{SessionConfig, normalize_player_name};
use crate::engine::{
    ChatBinding, ConfigGuard, ConnectParams, Connection, ConnectionEngine, ConnectionHandle, EventContext,
    JoinBinding, LeaveBinding, MessageBinding,
};
use crate::error::SessionError;
use crate::log::MessageLog;
use crate::players::PlayerList;

/// Quit notice sent by [`NetworkSession::disconnect`].
pub const QUIT_MESSAGE: &str = "User quit";

// =============================================================================
// LOBBY STATE
// =============================================================================

/// State mutated by inbound events. Outlives individual ticks; shared with bindings.
#[derive(Debug, Default)]
pub(crate) struct LobbyState {
    pub(crate) players: PlayerList,
    pub(crate) lobby_log: MessageLog,
    pub(crate) room_log: MessageLog,
}

impl LobbyState {
    fn current_log(&mut self, in_room: bool) -> &mut MessageLog {
        if in_room { &mut self.room_log } else { &mut self.lobby_log }
    }

    pub(crate) fn on_lobby_join(&mut self, name: &str) {
        if !self.players.add(name) {
            warn!(%name, "lobby join for player already present");
        }
        self.lobby_log.append_player_join(name);
    }

    pub(crate) fn on_lobby_leave(&mut self, name: &str, reason: &str) {
        if !self.players.remove(name) {
            warn!(%name, "lobby leave for unknown player");
        }
        self.lobby_log.append_player_leave(name, reason);
    }

    pub(crate) fn on_chat(&mut self, in_room: bool, sender: &str, text: &str) {
        debug!(%sender, in_room, "chat received");
        self.current_log(in_room).append_chat(sender, text);
    }

    pub(crate) fn on_message(&mut self, in_room: bool, code: i32, text: &str) {
        debug!(code, in_room, "system message received");
        self.current_log(in_room).append_message(code, text);
    }
}

// =============================================================================
// BINDINGS
// =============================================================================

/// The four inbound-event bindings, retained for the connection's lifetime.
struct Bindings {
    lobby_join: JoinBinding,
    lobby_leave: LeaveBinding,
    chat: ChatBinding,
    message: MessageBinding,
}

impl Bindings {
    fn new(state: &Rc<RefCell<LobbyState>>) -> Self {
        let join_state = Rc::clone(state);
        let leave_state = Rc::clone(state);
        let chat_state = Rc::clone(state);
        let message_state = Rc::clone(state);

        Self {
            lobby_join: Rc::new(move |_ctx: &dyn EventContext, name: &str| {
                join_state.borrow_mut().on_lobby_join(name);
            }),
            lobby_leave: Rc::new(move |_ctx: &dyn EventContext, name: &str, reason: &str| {
                leave_state.borrow_mut().on_lobby_leave(name, reason);
            }),
            chat: Rc::new(move |ctx: &dyn EventContext, sender: &str, text: &str| {
                chat_state.borrow_mut().on_chat(ctx.is_in_room_context(), sender, text);
            }),
            message: Rc::new(move |ctx: &dyn EventContext, code: i32, text: &str| {
                message_state.borrow_mut().on_message(ctx.is_in_room_context(), code, text);
            }),
        }
    }

    fn register<C: Connection>(&self, connection: &mut C) {
        connection.on_lobby_join(Rc::clone(&self.lobby_join));
        connection.on_lobby_leave(Rc::clone(&self.lobby_leave));
        connection.on_chat(Rc::clone(&self.chat));
        connection.on_message(Rc::clone(&self.message));
    }
}

// =============================================================================
// NETWORK SESSION
// =============================================================================

pub struct NetworkSession<E: ConnectionEngine> {
    engine: E,
    conn: Option<ConnectionHandle<E::Connection>>,
    /// Dropped only after `conn` has been destroyed.
    bindings: Option<Bindings>,
    player_name: String,
    state: Rc<RefCell<LobbyState>>,
}

impl<E: ConnectionEngine> NetworkSession<E> {
    /// Connect to the official server.
    ///
    /// # Errors
    ///
    /// See [`NetworkSession::connect`].
    pub fn connect_default(
        engine: E,
        data_path: impl Into<std::path::PathBuf>,
        player_name: &str,
    ) -> Result<Self, SessionError> {
        Self::connect(engine, &SessionConfig::new(data_path, player_name))
    }

    /// Load the metascheme, connect, and register the event bindings.
    ///
    /// The metascheme is released exactly once before this returns, whether
    /// or not the connection succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Configuration`] if the metascheme cannot be
    /// loaded and [`SessionError::Connection`] if the engine refuses the
    /// connection. No connection is retained on either path.
    pub fn connect(engine: E, config: &SessionConfig) -> Result<Self, SessionError> {
        let player_name = normalize_player_name(Some(&config.player_name));
        let metascheme_path = config.metascheme_path();

        let connection = {
            let guard = ConfigGuard::load(&engine, &metascheme_path);
            let Some(metascheme) = guard.config() else {
                warn!(path = %metascheme_path.display(), "metascheme missing or unreadable");
                return Err(SessionError::Configuration { path: metascheme_path });
            };
            let params = ConnectParams {
                player_name: &player_name,
                data_path: config.data_path(),
                host: &config.host,
                port: config.port,
            };
            engine.connect(&params, metascheme)
        };

        let Some(connection) = connection else {
            warn!(host = %config.host, port = config.port, "engine refused connection");
            return Err(SessionError::Connection { host: config.host.clone(), port: config.port });
        };

        let mut handle = ConnectionHandle::new(connection);
        let state = Rc::new(RefCell::new(LobbyState::default()));
        let bindings = Bindings::new(&state);
        bindings.register(handle.get_mut());

        info!(player = %player_name, host = %config.host, port = config.port, "session connected");

        Ok(Self { engine, conn: Some(handle), bindings: Some(bindings), player_name, state })
    }

    /// Drive one step of engine I/O, dispatching any pending events.
    ///
    /// No-op once disconnected.
    pub fn tick(&mut self) {
        if let Some(handle) = self.conn.as_mut() {
            handle.get_mut().tick();
        }
    }

    /// Send a quit notice, destroy the connection, and release the bindings.
    ///
    /// Idempotent. Logs and the player list stay readable afterwards.
    pub fn disconnect(&mut self) {
        let Some(mut handle) = self.conn.take() else {
            return;
        };
        handle.get_mut().send_quit(QUIT_MESSAGE);
        handle.destroy(&self.engine);
        self.bindings = None;
        info!(player = %self.player_name, "session disconnected");
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Room flag as reported by the engine right now. `false` when disconnected.
    #[must_use]
    pub fn is_in_room(&self) -> bool {
        self.conn.as_ref().is_some_and(|h| h.get().is_in_room_context())
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Send chat and echo it locally under the player's own name.
    ///
    /// The echo goes to the log matching the current room flag; the server
    /// does not echo a sender's own chat back.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] after teardown.
    pub fn send_chat(&mut self, text: &str) -> Result<(), SessionError> {
        let handle = self.conn.as_mut().ok_or(SessionError::NotConnected)?;
        handle.get_mut().send_chat(text);
        let in_room = handle.get().is_in_room_context();
        self.state.borrow_mut().current_log(in_room).append_chat(&self.player_name, text);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] after teardown.
    pub fn send_nick(&mut self, nick: &str) -> Result<(), SessionError> {
        self.connection_mut()?.send_nick(nick);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] after teardown.
    pub fn send_password(&mut self, password: &str) -> Result<(), SessionError> {
        self.connection_mut()?.send_password(password);
        Ok(())
    }

    /// Send a quit notice without tearing down the connection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotConnected`] after teardown.
    pub fn send_quit(&mut self, message: &str) -> Result<(), SessionError> {
        self.connection_mut()?.send_quit(message);
        Ok(())
    }

    fn connection_mut(&mut self) -> Result<&mut E::Connection, SessionError> {
        self.conn.as_mut().map(ConnectionHandle::get_mut).ok_or(SessionError::NotConnected)
    }

    // =========================================================================
    // READ-ONLY VIEWS
    // =========================================================================

    #[must_use]
    pub fn player_list(&self) -> Ref<'_, PlayerList> {
        Ref::map(self.state.borrow(), |s| &s.players)
    }

    #[must_use]
    pub fn lobby_log(&self) -> Ref<'_, MessageLog> {
        Ref::map(self.state.borrow(), |s| &s.lobby_log)
    }

    #[must_use]
    pub fn room_log(&self) -> Ref<'_, MessageLog> {
        Ref::map(self.state.borrow(), |s| &s.room_log)
    }

    /// The log chat would currently be routed to.
    #[must_use]
    pub fn current_log(&self) -> Ref<'_, MessageLog> {
        if self.is_in_room() { self.room_log() } else { self.lobby_log() }
    }

    #[cfg(test)]
    fn has_bindings(&self) -> bool {
        self.bindings.is_some()
    }
}

impl<E: ConnectionEngine> Drop for NetworkSession<E> {
    fn drop(&mut self) {
        if let Some(handle) = self.conn.take() {
            error!(player = %self.player_name, "leaked session: dropped without disconnect");
            handle.destroy(&self.engine);
        }
        self.bindings = None;
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
