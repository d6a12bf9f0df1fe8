use std::io;

use crate::error::Error;
use crate::event::Event;
use crate::parser::Parser;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

impl Decoder for Parser {
    type Error = Error;
    type Item = Event;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_empty() && !buf.is_empty() {
            let chunk = buf.split();
            let events = self.feed(&chunk);
            self.pending.extend(events);
        }
        Ok(self.pending.pop_front())
    }
}

impl Encoder<Event> for Parser {
    type Error = io::Error;

    fn encode(&mut self, item: Event, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.encode_to(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Cmd, Opt};

    fn decode_all(parser: &mut Parser, buf: &mut BytesMut) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = parser.decode(buf).unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn decodes_across_reads() {
        let mut parser = Parser::new();
        let mut buf = BytesMut::from(&b"ab\xff"[..]);
        assert_eq!(
            decode_all(&mut parser, &mut buf),
            vec![Event::Data(BytesMut::from(&b"ab"[..]))]
        );
        assert!(buf.is_empty());

        buf.extend_from_slice(&[251, 1, b'c']);
        assert_eq!(
            decode_all(&mut parser, &mut buf),
            vec![
                Event::Negotiation(Cmd::WILL, Opt::ECHO),
                Event::Data(BytesMut::from(&b"c"[..])),
            ]
        );
    }

    #[test]
    fn encodes_events() {
        let mut parser = Parser::new();
        let mut dst = BytesMut::new();
        parser
            .encode(Event::Negotiation(Cmd::DO, Opt::SGA), &mut dst)
            .unwrap();
        parser
            .encode(Event::Data(BytesMut::from(&[b'x', 255][..])), &mut dst)
            .unwrap();
        parser.encode(Event::Cmd(Cmd::GA), &mut dst).unwrap();
        assert_eq!(&dst[..], &[255, 253, 3, b'x', 255, 255, 255, 249]);
    }
}
