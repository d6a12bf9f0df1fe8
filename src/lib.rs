#![warn(missing_docs)]

//! Client-side telnet engine for a browser terminal.
//!
//! The engine sits between a byte transport (typically a websocket proxied
//! to a TCP service) and a terminal surface. It strips telnet commands from
//! the inbound stream, answers option negotiation for the handful of
//! options a terminal client cares about, and escapes outbound data.
//! It performs no I/O of its own: bytes come in through
//! [`Connection::on_message`] and leave through a [`Transport`].

mod op;
mod util;
#[doc(inline)]
pub use op::*;
#[doc(inline)]
pub use util::{escape_iac, unescape_iac, Escape};
mod parser;
#[doc(inline)]
pub use parser::{Parser, ParserState, MAX_SUBNEGOTIATION_LEN};
mod event;
#[doc(inline)]
pub use event::*;
pub mod dedup;
mod config;
pub use config::Config;
mod error;
pub use error::{Error, Result};
mod notify;
pub use notify::*;
mod transport;
pub use transport::Transport;
mod session;
pub use session::{Diagnostics, OptionState, Session};
mod detect;
pub use detect::{find_negotiation, Detection, Detector};
mod connection;
pub use connection::Connection;

#[cfg(feature = "codec")]
mod codec;
