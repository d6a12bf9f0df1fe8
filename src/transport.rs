/// The outbound half of a connection.
///
/// Implementations hand bytes to whatever carries them (a websocket, a TCP
/// stream, a test buffer). Sending is fire-and-forget: `false` means the
/// channel was not open and nothing was queued. Retrying is the caller's
/// business.
pub trait Transport {
    /// Queue `bytes` for transmission.
    fn send(&mut self, bytes: &[u8]) -> bool;
}

impl<F> Transport for F
where
    F: FnMut(&[u8]) -> bool,
{
    fn send(&mut self, bytes: &[u8]) -> bool {
        self(bytes)
    }
}
