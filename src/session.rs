use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::Config;
use crate::dedup::{CommandTracker, Direction, NegotiationDeduper, Signature};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::notify::{Notifier, Signal};
use crate::op::{ttype, Cmd, Ctl, Opt};
use crate::parser::{Parser, ParserState};
use crate::transport::Transport;
use crate::util::escape_iac;

const CR_NUL: [u8; 2] = [Ctl::CR as u8, Ctl::NUL as u8];
const CR_LF: [u8; 2] = [Ctl::CR as u8, Ctl::LF as u8];

/// Agreement on one option, per direction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OptionState {
    /// This client performs the option.
    pub local: bool,
    /// The server performs the option.
    pub remote: bool,
}

/// Telnet state for one live connection.
///
/// Owns the parser, the duplicate trackers, the agreed options and the
/// terminal metadata, plus the outbound [`Transport`] every byte is written
/// through and the [`Notifier`] that hears about echo and line mode.
pub struct Session<T, N> {
    parser: Parser,
    dedup: NegotiationDeduper,
    tracker: CommandTracker,
    app_tracker: CommandTracker,
    options: HashMap<Opt, OptionState>,
    terminal_type: String,
    width: u16,
    height: u16,
    naws_sent: Option<(u16, u16)>,
    announce_delay: Duration,
    announce_at: Option<Instant>,
    initialized: bool,
    active: bool,
    transport: T,
    notifier: N,
}

impl<T, N> Session<T, N>
where
    T: Transport,
    N: Notifier,
{
    /// An inactive, uninitialized session.
    pub fn new(config: &Config, transport: T, notifier: N) -> Self {
        Session {
            parser: Parser::new(),
            dedup: NegotiationDeduper::new(config.negotiation_window),
            tracker: CommandTracker::new(config.outbound_window),
            app_tracker: CommandTracker::new(config.outbound_window),
            options: HashMap::new(),
            terminal_type: config.terminal_type.clone(),
            width: config.width,
            height: config.height,
            naws_sent: None,
            announce_delay: config.announce_delay,
            announce_at: None,
            initialized: false,
            active: false,
            transport,
            notifier,
        }
    }

    /// Whether telnet processing is engaged.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether negotiation has been started.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Engage telnet mode and tell the UI. No-op when already active.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        info!("telnet mode enabled");
        self.active = true;
        self.notifier.notify(Signal::TelnetMode(true));
    }

    /// Drop telnet mode and tell the UI. No-op when already inactive.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        info!("telnet mode disabled");
        self.active = false;
        self.notifier.notify(Signal::TelnetMode(false));
    }

    /// Agreement state of `opt`.
    pub fn option(&self, opt: Opt) -> OptionState {
        self.options.get(&opt).copied().unwrap_or_default()
    }

    /// True if this client agreed to perform `opt`.
    pub fn local_enabled(&self, opt: Opt) -> bool {
        self.option(opt).local
    }

    /// True if the server agreed to perform `opt`.
    pub fn remote_enabled(&self, opt: Opt) -> bool {
        self.option(opt).remote
    }

    /// Current `(columns, rows)`.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The terminal type reported to the server.
    pub fn terminal_type(&self) -> &str {
        &self.terminal_type
    }

    /// Change the terminal type reported on the next TERMINAL-TYPE SEND.
    pub fn set_terminal_type(&mut self, terminal_type: impl Into<String>) {
        self.terminal_type = terminal_type.into();
    }

    /// Where the parser currently is.
    pub fn parser_state(&self) -> &ParserState {
        self.parser.state()
    }

    /// The negotiation duplicate tracker.
    pub fn dedup(&self) -> &NegotiationDeduper {
        &self.dedup
    }

    /// The outbound transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The outbound transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The UI notifier.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Give back the transport and notifier.
    pub fn into_parts(self) -> (T, N) {
        (self.transport, self.notifier)
    }

    /// Parse inbound bytes, answer any negotiation in them, and return the
    /// plain data for the terminal.
    #[instrument(level = "trace", skip(self, chunk), fields(len = chunk.len()))]
    pub fn feed(&mut self, chunk: &[u8]) -> BytesMut {
        let mut output = BytesMut::with_capacity(chunk.len());
        for event in self.parser.feed(chunk) {
            match event {
                Event::Data(data) => output.extend_from_slice(&data),
                Event::Negotiation(cmd, opt) => self.handle_negotiation(cmd, opt),
                Event::Subnegotiation(opt, params) => self.handle_subnegotiation(opt, &params),
                Event::Cmd(Cmd::SE) => debug!("ignoring SE without SB"),
                Event::Cmd(cmd) => trace!(%cmd, "ignoring command"),
            }
        }
        output
    }

    fn set_local(&mut self, opt: Opt, enabled: bool) {
        self.options.entry(opt).or_default().local = enabled;
    }

    fn set_remote(&mut self, opt: Opt, enabled: bool) {
        self.options.entry(opt).or_default().remote = enabled;
    }

    fn handle_negotiation(&mut self, cmd: Cmd, opt: Opt) {
        if !self.dedup.admit(Direction::Received, cmd, opt) {
            debug!(%cmd, %opt, "skipping duplicate command");
            return;
        }

        debug!(%cmd, %opt, "received");
        match cmd {
            Cmd::DO => self.handle_do(opt),
            Cmd::DONT => self.handle_dont(opt),
            Cmd::WILL => self.handle_will(opt),
            Cmd::WONT => self.handle_wont(opt),
            other => debug!(cmd = %other, "not a negotiation command"),
        }
    }

    fn handle_do(&mut self, opt: Opt) {
        match opt {
            Opt::TERMINAL_TYPE | Opt::SGA => {
                self.set_local(opt, true);
                self.send_negotiation(Cmd::WILL, opt);
            }
            Opt::NAWS => {
                self.set_local(opt, true);
                self.send_negotiation(Cmd::WILL, opt);
                self.send_window_size();
            }
            Opt::ECHO => {
                self.set_local(opt, true);
                self.send_negotiation(Cmd::WILL, opt);
                debug!("server will handle echo, disabling local echo");
                self.notifier.notify(Signal::LocalEcho(false));
            }
            _ => self.send_negotiation(Cmd::WONT, opt),
        }
    }

    fn handle_dont(&mut self, opt: Opt) {
        self.set_local(opt, false);
        self.send_negotiation(Cmd::WONT, opt);

        if opt == Opt::NAWS {
            self.naws_sent = None;
        }

        // Servers that say DONT ECHO frequently keep echoing anyway.
        if opt == Opt::ECHO {
            debug!("DONT ECHO received, keeping local echo disabled");
            self.notifier.notify(Signal::LocalEcho(false));
        }
    }

    fn handle_will(&mut self, opt: Opt) {
        match opt {
            Opt::ECHO => {
                self.set_remote(opt, true);
                self.send_negotiation(Cmd::DO, opt);
                debug!("server will echo, disabling local echo");
                self.notifier.notify(Signal::LocalEcho(false));
            }
            Opt::SGA => {
                self.set_remote(opt, true);
                self.send_negotiation(Cmd::DO, opt);
            }
            Opt::LINEMODE => {
                self.set_remote(opt, true);
                self.send_negotiation(Cmd::DO, opt);
                debug!("server wants line mode");
                self.notifier.notify(Signal::LineMode(true));
            }
            _ => self.send_negotiation(Cmd::DO, opt),
        }
    }

    fn handle_wont(&mut self, opt: Opt) {
        let was_enabled = self.remote_enabled(opt);
        self.set_remote(opt, false);
        self.send_negotiation(Cmd::DONT, opt);

        if opt == Opt::ECHO {
            debug!("server will not echo, enabling local echo");
            self.notifier.notify(Signal::LocalEcho(true));
        } else if opt == Opt::LINEMODE && was_enabled {
            self.notifier.notify(Signal::LineMode(false));
        }
    }

    fn handle_subnegotiation(&mut self, opt: Opt, params: &[u8]) {
        debug!(%opt, ?params, "subnegotiation");
        match opt {
            Opt::TERMINAL_TYPE if params.first() == Some(&ttype::SEND) => {
                self.send_terminal_type();
            }
            _ => debug!(%opt, "unhandled subnegotiation"),
        }
    }

    fn send_negotiation(&mut self, cmd: Cmd, opt: Opt) {
        if !self.dedup.admit(Direction::Sent, cmd, opt) {
            debug!(%cmd, %opt, "skipping duplicate outgoing command");
            return;
        }

        let frame = Event::Negotiation(cmd, opt).to_bytes();
        if self.tracker.was_sent_recently(&frame) {
            debug!(signature = ?Signature::of(&frame), "preventing duplicate outgoing frame");
            return;
        }

        debug!(%cmd, %opt, "sending");
        self.write_frame(&frame);
    }

    /// Answer a TERMINAL-TYPE SEND. Every SEND gets its own reply.
    fn send_terminal_type(&mut self) {
        debug!(terminal_type = %self.terminal_type, "sending terminal type");
        let mut params = BytesMut::with_capacity(1 + self.terminal_type.len());
        params.put_u8(ttype::IS);
        params.extend_from_slice(self.terminal_type.as_bytes());
        let frame = Event::Subnegotiation(Opt::TERMINAL_TYPE, params).to_bytes();
        self.write_frame(&frame);
    }

    /// Report the current size. Only the delayed announcement skips a size
    /// that was already sent.
    fn send_window_size(&mut self) {
        debug!(width = self.width, height = self.height, "sending window size");
        let mut params = BytesMut::with_capacity(4);
        params.put_u16(self.width);
        params.put_u16(self.height);
        let frame = Event::Subnegotiation(Opt::NAWS, params).to_bytes();
        self.write_frame(&frame);
        self.naws_sent = Some((self.width, self.height));
    }

    /// Write an engine-built frame. A refused write is logged and dropped.
    fn write_frame(&mut self, frame: &[u8]) {
        if !self.transport.send(frame) {
            warn!(len = frame.len(), "transport refused protocol frame");
        }
    }

    fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if self.transport.send(bytes) {
            Ok(())
        } else {
            Err(Error::NotSent)
        }
    }

    fn send_escaped(&mut self, data: &[u8]) -> Result<()> {
        let escaped = escape_iac(data);
        if escaped.len() != data.len() {
            trace!(count = escaped.len() - data.len(), "escaped IAC bytes");
        }
        self.send_raw(&escaped)
    }

    /// Send text typed by the user.
    ///
    /// In telnet mode a lone CR goes out as CR NUL, and a lone LF or a CR LF
    /// pair as CR LF; anything else is IAC-escaped. Outside telnet mode the
    /// text is sent as is.
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        if !self.active {
            return self.send_raw(text.as_bytes());
        }
        match text {
            "\r" => self.send_raw(&CR_NUL),
            "\n" | "\r\n" => self.send_raw(&CR_LF),
            _ => self.send_escaped(text.as_bytes()),
        }
    }

    /// Send binary application data.
    ///
    /// In telnet mode the payload is IAC-escaped; IAC-led payloads that
    /// repeat one sent through here within the outbound window are dropped
    /// and reported as sent. The engine's own replies are tracked apart.
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        if !self.active {
            return self.send_raw(data);
        }
        if self.app_tracker.was_sent_recently(data) {
            debug!(signature = ?Signature::of(data), "preventing duplicate outgoing command");
            return Ok(());
        }
        self.send_escaped(data)
    }

    /// Record new terminal dimensions, sending NAWS if it was agreed.
    /// Zero dimensions are ignored.
    pub fn set_dimensions(&mut self, width: u16, height: u16) {
        if width == 0 || height == 0 {
            warn!(width, height, "ignoring empty terminal dimensions");
            return;
        }
        self.width = width;
        self.height = height;

        if self.local_enabled(Opt::NAWS) {
            self.send_window_size();
        }
    }

    /// Offer the options this client supports and arm the delayed
    /// terminal type / window size announcement. Only the first call per
    /// session does anything.
    pub fn initialize_negotiation(&mut self) {
        if self.initialized {
            debug!("negotiation already initialized, skipping");
            return;
        }

        info!("starting telnet negotiation");
        self.dedup.reset();

        self.send_negotiation(Cmd::WILL, Opt::TERMINAL_TYPE);
        self.send_negotiation(Cmd::WILL, Opt::NAWS);
        self.send_negotiation(Cmd::WILL, Opt::SGA);
        self.send_negotiation(Cmd::DO, Opt::SGA);
        self.send_negotiation(Cmd::WILL, Opt::ECHO);

        self.announce_at = Some(Instant::now() + self.announce_delay);
        self.initialized = true;
    }

    /// When the pending announcement is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.announce_at
    }

    /// Send the delayed announcement if it is due. Returns true if it fired.
    pub fn poll_deferred(&mut self) -> bool {
        match self.announce_at {
            Some(at) if Instant::now() >= at => {
                self.announce_at = None;
                if self.local_enabled(Opt::TERMINAL_TYPE) {
                    self.send_terminal_type();
                }
                if self.local_enabled(Opt::NAWS) && self.naws_sent != Some(self.dimensions()) {
                    self.send_window_size();
                }
                true
            }
            _ => false,
        }
    }

    /// Return to the state of a fresh connection: idle parser, no agreed
    /// options, empty trackers, no pending announcement. Telnet mode and
    /// terminal metadata are kept.
    pub fn reset(&mut self) {
        debug!("resetting telnet session");
        self.parser.reset();
        self.options.clear();
        self.dedup.reset();
        self.tracker.reset();
        self.app_tracker.reset();
        self.naws_sent = None;
        self.announce_at = None;
        self.initialized = false;
    }

    /// Snapshot of the session for display.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut options: Vec<_> = self.options.iter().map(|(o, s)| (*o, *s)).collect();
        options.sort_by_key(|(opt, _)| u8::from(*opt));
        Diagnostics {
            active: self.active,
            initialized: self.initialized,
            terminal_type: self.terminal_type.clone(),
            width: self.width,
            height: self.height,
            announce_pending: self.announce_at.is_some(),
            options,
        }
    }
}

/// Point-in-time view of a [`Session`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    /// Telnet mode engaged.
    pub active: bool,
    /// Negotiation started.
    pub initialized: bool,
    /// Reported terminal type.
    pub terminal_type: String,
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
    /// Delayed announcement still armed.
    pub announce_pending: bool,
    /// Every option that has been negotiated, by option code.
    pub options: Vec<(Opt, OptionState)>,
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let on_off = |b: bool| if b { "enabled" } else { "disabled" };
        writeln!(f, "telnet mode: {}", on_off(self.active))?;
        writeln!(f, "negotiation: {}", if self.initialized { "started" } else { "idle" })?;
        writeln!(f, "terminal: {} {}x{}", self.terminal_type, self.width, self.height)?;
        for (opt, state) in &self.options {
            writeln!(
                f,
                "  {opt}: local {}, remote {}",
                on_off(state.local),
                on_off(state.remote)
            )?;
        }
        Ok(())
    }
}
