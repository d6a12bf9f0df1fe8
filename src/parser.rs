use std::collections::VecDeque;
use std::convert::TryFrom;
use std::mem;

use crate::event::Event;
use crate::op::{Cmd, Opt};

use tracing::*;

use either::Either;

use bytes::{BufMut, BytesMut};

/// Longest subnegotiation payload kept before the sequence is abandoned.
pub const MAX_SUBNEGOTIATION_LEN: usize = 4096;

/// Where the parser is inside the telnet grammar.
///
/// Everything needed to resume after a chunk boundary lives here, so a
/// sequence split across any number of reads parses the same as one read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// Between sequences; bytes are plain data.
    #[default]
    Idle,
    /// Saw `IAC`, waiting for the command byte.
    Iac,
    /// Saw `IAC <WILL|WONT|DO|DONT>`, waiting for the option byte.
    Command(Cmd),
    /// Saw `IAC SB`, waiting for the option byte.
    SubnegStart,
    /// Collecting subnegotiation parameters.
    Subneg {
        /// Option being subnegotiated.
        opt: Opt,
        /// Parameters collected so far, unescaped.
        params: BytesMut,
    },
    /// Saw `IAC` inside a subnegotiation; `SE` ends it, `IAC` is a literal.
    SubnegIac {
        /// Option being subnegotiated.
        opt: Opt,
        /// Parameters collected so far, unescaped.
        params: BytesMut,
    },
}

/// Incremental telnet stream parser.
#[derive(Default, Debug)]
pub struct Parser {
    state: ParserState,
    pub(crate) pending: VecDeque<Event>,
}

impl Parser {
    /// A parser in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current parse state.
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Drop any partial sequence and return to idle.
    pub fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.pending.clear();
    }

    /// Advance by one byte.
    ///
    /// Returns `Left` for a plain data byte, `Right` for a completed protocol
    /// event, or `None` when the byte was consumed by a partial sequence.
    pub fn step(&mut self, byte: u8) -> Option<Either<u8, Event>> {
        let (next, out) = match mem::take(&mut self.state) {
            ParserState::Idle if byte == Cmd::IAC => (ParserState::Iac, None),
            ParserState::Idle => (ParserState::Idle, Some(Either::Left(byte))),
            ParserState::Iac => match Cmd::try_from(byte) {
                Ok(Cmd::IAC) => (ParserState::Idle, Some(Either::Left(byte))),
                Ok(Cmd::SB) => (ParserState::SubnegStart, None),
                Ok(cmd) if cmd.is_negotiation() => (ParserState::Command(cmd), None),
                Ok(cmd) => {
                    if cmd == Cmd::SE {
                        debug!("SE outside of subnegotiation");
                    }
                    trace!(%cmd, "found command");
                    (ParserState::Idle, Some(Either::Right(Event::Cmd(cmd))))
                }
                Err(_) => {
                    warn!(byte, "dropping unknown telnet command");
                    (ParserState::Idle, None)
                }
            },
            ParserState::Command(cmd) => {
                let opt = Opt::from(byte);
                trace!(%cmd, %opt, "found negotiation");
                (
                    ParserState::Idle,
                    Some(Either::Right(Event::Negotiation(cmd, opt))),
                )
            }
            ParserState::SubnegStart => (
                ParserState::Subneg {
                    opt: Opt::from(byte),
                    params: BytesMut::new(),
                },
                None,
            ),
            ParserState::Subneg { opt, mut params } => {
                if byte == Cmd::IAC {
                    (ParserState::SubnegIac { opt, params }, None)
                } else {
                    params.put_u8(byte);
                    collect(opt, params)
                }
            }
            ParserState::SubnegIac { opt, mut params } => {
                if byte == Cmd::SE {
                    trace!(%opt, len = params.len(), "found subnegotiation");
                    (
                        ParserState::Idle,
                        Some(Either::Right(Event::Subnegotiation(opt, params))),
                    )
                } else {
                    if byte != Cmd::IAC {
                        params.put_u8(Cmd::IAC.into());
                    }
                    params.put_u8(byte);
                    collect(opt, params)
                }
            }
        };

        self.state = next;
        out
    }

    /// Parse a chunk of arbitrary length.
    ///
    /// Runs of plain bytes are coalesced into [`Event::Data`]; protocol
    /// events are returned in stream order between them.
    #[instrument(level = "trace", skip(self, chunk), fields(len = chunk.len()))]
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        let mut data = BytesMut::new();

        for byte in chunk {
            match self.step(*byte) {
                Some(Either::Left(b)) => data.put_u8(b),
                Some(Either::Right(event)) => {
                    if !data.is_empty() {
                        events.push(Event::Data(data.split()));
                    }
                    events.push(event);
                }
                None => {}
            }
        }

        if !data.is_empty() {
            events.push(Event::Data(data));
        }

        events
    }
}

/// Keep collecting parameters unless they outgrew the limit, in which case
/// the whole subnegotiation is dropped and bytes are data again.
fn collect(opt: Opt, params: BytesMut) -> (ParserState, Option<Either<u8, Event>>) {
    if params.len() > MAX_SUBNEGOTIATION_LEN {
        warn!(%opt, len = params.len(), "dropping oversized subnegotiation");
        return (ParserState::Idle, None);
    }
    (ParserState::Subneg { opt, params }, None)
}
