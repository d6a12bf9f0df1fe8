use crate::op::{Cmd, Opt};
use crate::util::Escape;

use bytes::{BufMut, BytesMut};

/// One unit of a telnet byte stream.
#[derive(Debug, Eq, Clone, PartialEq)]
pub enum Event {
    /// Plain application bytes, already unescaped.
    Data(BytesMut),
    /// A two-byte `IAC <cmd>` sequence.
    Cmd(Cmd),
    /// `IAC <WILL|WONT|DO|DONT> <opt>`.
    Negotiation(Cmd, Opt),
    /// `IAC SB <opt> <params> IAC SE`, params unescaped.
    Subnegotiation(Opt, BytesMut),
}

impl Event {
    /// Serialize into wire form, escaping data and subnegotiation params.
    pub fn encode_to(&self, dst: &mut BytesMut) {
        match self {
            Event::Data(bytes) => {
                bytes[..].escape_to(dst);
            }
            Event::Cmd(cmd) => {
                dst.put_u8(Cmd::IAC.into());
                dst.put_u8((*cmd).into());
            }
            Event::Negotiation(cmd, opt) => {
                dst.put_u8(Cmd::IAC.into());
                dst.put_u8((*cmd).into());
                dst.put_u8((*opt).into());
            }
            Event::Subnegotiation(opt, params) => {
                dst.put_u8(Cmd::IAC.into());
                dst.put_u8(Cmd::SB.into());
                dst.put_u8((*opt).into());
                params[..].escape_to(dst);
                dst.put_u8(Cmd::IAC.into());
                dst.put_u8(Cmd::SE.into());
            }
        }
    }

    /// Wire form in a fresh buffer.
    pub fn to_bytes(&self) -> BytesMut {
        let mut dst = BytesMut::new();
        self.encode_to(&mut dst);
        dst
    }
}
