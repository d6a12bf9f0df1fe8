use bytes::BytesMut;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::detect::Detector;
use crate::error::Result;
use crate::notify::Notifier;
use crate::session::{Diagnostics, Session};
use crate::transport::Transport;

/// One transport connection and its telnet state, from open to close.
///
/// Inbound chunks are passed through untouched until telnet is detected
/// (or forced with [`enable_telnet`](Connection::enable_telnet)); from then
/// on they are run through the [`Session`].
pub struct Connection<T, N> {
    session: Session<T, N>,
    detector: Detector,
    auto_detect: bool,
}

impl<T, N> Connection<T, N>
where
    T: Transport,
    N: Notifier,
{
    /// Start tracking a freshly opened transport.
    pub fn open(config: &Config, transport: T, notifier: N) -> Self {
        debug!(auto_detect = config.auto_detect, "connection opened");
        Connection {
            session: Session::new(config, transport, notifier),
            detector: Detector::new(),
            auto_detect: config.auto_detect,
        }
    }

    /// The telnet session.
    pub fn session(&self) -> &Session<T, N> {
        &self.session
    }

    /// The telnet session, mutably.
    pub fn session_mut(&mut self) -> &mut Session<T, N> {
        &mut self.session
    }

    /// Whether telnet mode is engaged.
    pub fn is_telnet(&self) -> bool {
        self.session.is_active()
    }

    /// Whether inbound data is scanned for telnet.
    pub fn auto_detect(&self) -> bool {
        self.auto_detect
    }

    /// Turn scanning on or off. Turning it off while telnet mode is
    /// engaged also disables telnet mode.
    pub fn set_auto_detect(&mut self, enabled: bool) {
        self.auto_detect = enabled;
        if !enabled && self.session.is_active() {
            self.disable_telnet();
        }
    }

    /// Handle a chunk from the transport and return what the terminal
    /// should display.
    #[instrument(level = "trace", skip(self, chunk), fields(len = chunk.len()))]
    pub fn on_message(&mut self, chunk: &[u8]) -> BytesMut {
        if !self.session.is_active() && self.auto_detect && self.detector.inspect(chunk).is_some()
        {
            self.session.activate();
            self.session.initialize_negotiation();
        }

        if self.session.is_active() {
            self.session.feed(chunk)
        } else {
            BytesMut::from(chunk)
        }
    }

    /// Send text typed by the user. See [`Session::send_text`].
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.session.send_text(text)
    }

    /// Send binary application data. See [`Session::send_bytes`].
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.session.send_bytes(data)
    }

    /// The terminal was resized.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.session.set_dimensions(columns, rows);
    }

    /// Force telnet mode on, restarting negotiation from scratch.
    pub fn enable_telnet(&mut self) {
        self.detector.latch();
        self.session.reset();
        self.session.activate();
        self.session.initialize_negotiation();
    }

    /// Force telnet mode off. Negotiated state is discarded and detection
    /// may trigger again.
    pub fn disable_telnet(&mut self) {
        self.detector.unlatch();
        self.session.deactivate();
        self.session.reset();
    }

    /// When [`poll_deferred`](Connection::poll_deferred) next has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.next_deadline()
    }

    /// Fire the delayed negotiation announcement if due.
    pub fn poll_deferred(&mut self) -> bool {
        self.session.poll_deferred()
    }

    /// Snapshot for display.
    pub fn diagnostics(&self) -> Diagnostics {
        self.session.diagnostics()
    }

    /// Tear down telnet state and hand back the transport and notifier.
    pub fn close(mut self) -> (T, N) {
        debug!("connection closed");
        self.session.deactivate();
        self.session.reset();
        self.session.into_parts()
    }
}
