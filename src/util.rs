use std::borrow::Cow;

use bytes::{BufMut, BytesMut};

use crate::op::Cmd;

/// IAC doubling for data headed onto the wire.
pub trait Escape {
    /// Append `self` to `dst`, doubling every IAC byte.
    fn escape_to(&self, dst: &mut BytesMut);
    /// Append `self` to `dst`, collapsing every `IAC IAC` pair to one byte.
    fn unescape_to(&self, dst: &mut BytesMut);
}

impl Escape for [u8] {
    fn escape_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.len());
        for byte in self {
            if *byte == Cmd::IAC {
                dst.put_u8(*byte);
            }

            dst.put_u8(*byte)
        }
    }

    fn unescape_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.len());
        let mut iter = self.iter();
        while let Some(b) = iter.next() {
            if *b == Cmd::IAC {
                iter.next();
            }
            dst.put_u8(*b);
        }
    }
}

/// Double every IAC in an outbound payload.
///
/// Payloads without an IAC byte are handed back untouched; otherwise the
/// result is `data.len() + count(IAC)` bytes long.
pub fn escape_iac(data: &[u8]) -> Cow<'_, [u8]> {
    let count = data.iter().filter(|b| **b == Cmd::IAC).count();
    if count == 0 {
        return Cow::Borrowed(data);
    }

    let mut out = BytesMut::with_capacity(data.len() + count);
    data.escape_to(&mut out);
    Cow::Owned(out.to_vec())
}

/// Inverse of [`escape_iac`].
pub fn unescape_iac(data: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(data.len());
    data.unescape_to(&mut out);
    out
}
