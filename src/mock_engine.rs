//! Journaling in-memory engine for unit tests.
//!
//! Every call the session makes is recorded in a shared [`Journal`]; tests
//! script inbound events and the room flag through a [`MockControl`] while the
//! session owns the connection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::{
    ChatBinding, ConnectParams, Connection, ConnectionEngine, EventContext, JoinBinding, LeaveBinding, MessageBinding,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LoadConfig(PathBuf),
    ReleaseConfig { loaded: bool },
    Connect { player_name: String, data_path: PathBuf, host: String, port: u16 },
    Destroy { bindings_live: bool },
    Tick,
    SendChat(String),
    SendNick(String),
    SendPassword(String),
    SendQuit(String),
    Register(&'static str),
}

#[derive(Debug, Clone)]
pub enum Inbound {
    Join(String),
    Leave(String, String),
    Chat(String, String),
    Message(i32, String),
    /// Flip the room flag mid-tick, between two dispatches.
    SetInRoom(bool),
}

#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<Call>,
    pending: VecDeque<Inbound>,
    in_room: bool,
}

/// Test-side view of the journal.
#[derive(Clone)]
pub struct MockControl {
    journal: Rc<RefCell<Journal>>,
}

impl MockControl {
    pub fn push(&self, event: Inbound) {
        self.journal.borrow_mut().pending.push_back(event);
    }

    pub fn set_in_room(&self, in_room: bool) {
        self.journal.borrow_mut().in_room = in_room;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.borrow().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.journal.borrow().calls.iter().filter(|c| pred(c)).count()
    }
}

// =============================================================================
// TEST SUPPORT
// =============================================================================

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serializes every test that reads or mutates `LOBBY_*` env vars.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Route `tracing` output through the test harness so it shows up on failure.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return everything it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap_or_else(PoisonError::into_inner).clone();
    (out, String::from_utf8_lossy(&bytes).into_owned())
}

pub struct MockEngine {
    journal: Rc<RefCell<Journal>>,
    config_ok: bool,
    connect_ok: bool,
}

pub struct MockConfig;

impl MockEngine {
    pub fn new() -> (Self, MockControl) {
        Self::with_outcomes(true, true)
    }

    pub fn with_outcomes(config_ok: bool, connect_ok: bool) -> (Self, MockControl) {
        init_test_tracing();
        let journal = Rc::new(RefCell::new(Journal::default()));
        let control = MockControl { journal: Rc::clone(&journal) };
        (Self { journal, config_ok, connect_ok }, control)
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().calls.push(call);
    }
}

impl ConnectionEngine for MockEngine {
    type Config = MockConfig;
    type Connection = MockConnection;

    fn load_config(&self, path: &Path) -> Option<MockConfig> {
        self.record(Call::LoadConfig(path.to_path_buf()));
        self.config_ok.then_some(MockConfig)
    }

    fn release_config(&self, config: Option<MockConfig>) {
        self.record(Call::ReleaseConfig { loaded: config.is_some() });
    }

    fn connect(&self, params: &ConnectParams<'_>, _config: &MockConfig) -> Option<MockConnection> {
        self.record(Call::Connect {
            player_name: params.player_name.to_owned(),
            data_path: params.data_path.to_path_buf(),
            host: params.host.to_owned(),
            port: params.port,
        });
        self.connect_ok.then(|| MockConnection {
            journal: Rc::clone(&self.journal),
            join: None,
            leave: None,
            chat: None,
            message: None,
        })
    }

    fn destroy(&self, connection: MockConnection) {
        let bindings_live = connection.join.is_some()
            && connection.leave.is_some()
            && connection.chat.is_some()
            && connection.message.is_some();
        self.record(Call::Destroy { bindings_live });
    }
}

pub struct MockConnection {
    journal: Rc<RefCell<Journal>>,
    join: Option<JoinBinding>,
    leave: Option<LeaveBinding>,
    chat: Option<ChatBinding>,
    message: Option<MessageBinding>,
}

impl MockConnection {
    fn record(&self, call: Call) {
        self.journal.borrow_mut().calls.push(call);
    }
}

impl EventContext for MockConnection {
    fn is_in_room_context(&self) -> bool {
        self.journal.borrow().in_room
    }
}

impl Connection for MockConnection {
    fn tick(&mut self) {
        self.record(Call::Tick);
        loop {
            // Journal borrow must end before a binding runs; bindings query the room flag.
            let Some(event) = self.journal.borrow_mut().pending.pop_front() else {
                break;
            };
            match event {
                Inbound::Join(name) => {
                    if let Some(cb) = self.join.clone() {
                        cb(&*self, &name);
                    }
                }
                Inbound::Leave(name, reason) => {
                    if let Some(cb) = self.leave.clone() {
                        cb(&*self, &name, &reason);
                    }
                }
                Inbound::Chat(name, text) => {
                    if let Some(cb) = self.chat.clone() {
                        cb(&*self, &name, &text);
                    }
                }
                Inbound::Message(code, text) => {
                    if let Some(cb) = self.message.clone() {
                        cb(&*self, code, &text);
                    }
                }
                Inbound::SetInRoom(in_room) => self.journal.borrow_mut().in_room = in_room,
            }
        }
    }

    fn send_chat(&mut self, text: &str) {
        self.record(Call::SendChat(text.to_owned()));
    }

    fn send_nick(&mut self, nick: &str) {
        self.record(Call::SendNick(nick.to_owned()));
    }

    fn send_password(&mut self, password: &str) {
        self.record(Call::SendPassword(password.to_owned()));
    }

    fn send_quit(&mut self, message: &str) {
        self.record(Call::SendQuit(message.to_owned()));
    }

    fn on_lobby_join(&mut self, binding: JoinBinding) {
        self.record(Call::Register("lobby_join"));
        self.join = Some(binding);
    }

    fn on_lobby_leave(&mut self, binding: LeaveBinding) {
        self.record(Call::Register("lobby_leave"));
        self.leave = Some(binding);
    }

    fn on_chat(&mut self, binding: ChatBinding) {
        self.record(Call::Register("chat"));
        self.chat = Some(binding);
    }

    fn on_message(&mut self, binding: MessageBinding) {
        self.record(Call::Register("message"));
        self.message = Some(binding);
    }
}
