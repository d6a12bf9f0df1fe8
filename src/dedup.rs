//! Suppression of repeated negotiation traffic.
//!
//! Some servers retransmit the same `DO`/`WILL` bursts, and a naive client
//! answers every copy, which the server answers again. Both trackers here
//! remember what went past within a wall-clock window and let the session
//! drop the repeats. This is a compatibility shim, not telnet semantics: the
//! windows are configurable because they were tuned against real servers.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::trace;

use crate::op::{Cmd, Opt};

/// Which way a negotiation command travelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From the server.
    Received,
    /// From this client.
    Sent,
}

/// Which party performs an option.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// This client performs it.
    Local,
    /// The server performs it.
    Remote,
}

impl Side {
    /// The side a negotiation command speaks about.
    ///
    /// `WILL`/`WONT` describe the sender, `DO`/`DONT` the receiver.
    pub fn of(direction: Direction, cmd: Cmd) -> Side {
        let about_sender = matches!(cmd, Cmd::WILL | Cmd::WONT);
        match (direction, about_sender) {
            (Direction::Received, true) | (Direction::Sent, false) => Side::Remote,
            (Direction::Received, false) | (Direction::Sent, true) => Side::Local,
        }
    }
}

/// Recently handled `(direction, command, option)` triples and the option
/// state they imply.
#[derive(Debug)]
pub struct NegotiationDeduper {
    window: Duration,
    recent: HashMap<(Direction, Cmd, Opt), Instant>,
    states: HashMap<(Side, Opt), bool>,
}

impl NegotiationDeduper {
    /// A deduper that treats repeats within `window` as duplicates.
    pub fn new(window: Duration) -> Self {
        NegotiationDeduper {
            window,
            recent: HashMap::new(),
            states: HashMap::new(),
        }
    }

    /// True if this exact command was handled within the window.
    pub fn is_recent(&self, direction: Direction, cmd: Cmd, opt: Opt) -> bool {
        self.recent
            .get(&(direction, cmd, opt))
            .is_some_and(|seen| seen.elapsed() < self.window)
    }

    /// Record the command as handled now.
    pub fn mark(&mut self, direction: Direction, cmd: Cmd, opt: Opt) {
        self.prune();
        self.recent.insert((direction, cmd, opt), Instant::now());
        let enabled = matches!(cmd, Cmd::WILL | Cmd::DO);
        self.states.insert((Side::of(direction, cmd), opt), enabled);
    }

    /// Mark the command unless it is a duplicate. Returns false for a
    /// duplicate.
    pub fn admit(&mut self, direction: Direction, cmd: Cmd, opt: Opt) -> bool {
        if self.is_recent(direction, cmd, opt) {
            return false;
        }
        self.mark(direction, cmd, opt);
        true
    }

    /// The last state any recorded command implied for `opt` on `side`.
    pub fn option_state(&self, side: Side, opt: Opt) -> Option<bool> {
        self.states.get(&(side, opt)).copied()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// True when nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    /// Drop records older than the window.
    pub fn prune(&mut self) {
        let window = self.window;
        self.recent.retain(|key, seen| {
            let keep = seen.elapsed() <= window;
            if !keep {
                trace!(?key, "expiring negotiation record");
            }
            keep
        });
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.recent.clear();
        self.states.clear();
    }
}

/// Identity of an outbound protocol frame for [`CommandTracker`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Signature {
    /// A three byte `IAC <cmd> <opt>` frame.
    Negotiation(u8, u8),
    /// An `IAC SB <opt> ...` frame and everything after the option byte.
    Subnegotiation(u8, Bytes),
    /// Any other IAC-led payload, by its first eight bytes.
    Other(Bytes),
}

impl Signature {
    /// The signature of an IAC-led frame, or `None` for data.
    pub fn of(frame: &[u8]) -> Option<Signature> {
        if frame.len() < 3 || frame[0] != Cmd::IAC {
            return None;
        }
        if frame.len() == 3 {
            return Some(Signature::Negotiation(frame[1], frame[2]));
        }
        if frame[1] == Cmd::SB {
            return Some(Signature::Subnegotiation(
                frame[2],
                Bytes::copy_from_slice(&frame[3..]),
            ));
        }
        let n = frame.len().min(8);
        Some(Signature::Other(Bytes::copy_from_slice(&frame[..n])))
    }
}

/// Outbound frames sent within a window, keyed by [`Signature`].
#[derive(Debug)]
pub struct CommandTracker {
    window: Duration,
    recent: HashMap<Signature, Instant>,
}

impl CommandTracker {
    /// A tracker that suppresses repeats within `window`.
    pub fn new(window: Duration) -> Self {
        CommandTracker {
            window,
            recent: HashMap::new(),
        }
    }

    /// Returns true if an identical IAC-led frame went out within the
    /// window; otherwise records `frame` as sent now and returns false.
    /// Frames that do not start with IAC are never tracked.
    pub fn was_sent_recently(&mut self, frame: &[u8]) -> bool {
        let Some(signature) = Signature::of(frame) else {
            return false;
        };

        let window = self.window;
        self.recent.retain(|_, sent| sent.elapsed() < window);

        if self.recent.contains_key(&signature) {
            return true;
        }
        self.recent.insert(signature, Instant::now());
        false
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn repeat_within_window_is_duplicate() {
        let mut dedup = NegotiationDeduper::new(WINDOW);
        assert!(dedup.admit(Direction::Received, Cmd::DO, Opt::ECHO));
        assert!(!dedup.admit(Direction::Received, Cmd::DO, Opt::ECHO));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(dedup.admit(Direction::Received, Cmd::DO, Opt::ECHO));
    }

    #[tokio::test(start_paused = true)]
    async fn directions_are_independent() {
        let mut dedup = NegotiationDeduper::new(WINDOW);
        assert!(dedup.admit(Direction::Sent, Cmd::WILL, Opt::SGA));
        assert!(dedup.admit(Direction::Received, Cmd::WILL, Opt::SGA));
    }

    #[tokio::test(start_paused = true)]
    async fn option_state_follows_last_command() {
        let mut dedup = NegotiationDeduper::new(WINDOW);
        dedup.mark(Direction::Received, Cmd::WILL, Opt::ECHO);
        assert_eq!(dedup.option_state(Side::Remote, Opt::ECHO), Some(true));
        dedup.mark(Direction::Received, Cmd::WONT, Opt::ECHO);
        assert_eq!(dedup.option_state(Side::Remote, Opt::ECHO), Some(false));

        dedup.mark(Direction::Sent, Cmd::WILL, Opt::NAWS);
        assert_eq!(dedup.option_state(Side::Local, Opt::NAWS), Some(true));
        assert_eq!(dedup.option_state(Side::Remote, Opt::NAWS), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_records_are_pruned() {
        let mut dedup = NegotiationDeduper::new(WINDOW);
        dedup.mark(Direction::Received, Cmd::DO, Opt::ECHO);
        tokio::time::advance(Duration::from_secs(2)).await;
        dedup.mark(Direction::Received, Cmd::DO, Opt::SGA);
        assert_eq!(dedup.len(), 1);

        dedup.reset();
        assert!(dedup.is_empty());
        assert_eq!(dedup.option_state(Side::Local, Opt::SGA), None);
    }

    #[test]
    fn signatures() {
        assert_eq!(Signature::of(b"abc"), None);
        assert_eq!(Signature::of(&[255, 251]), None);
        assert_eq!(
            Signature::of(&[255, 251, 24]),
            Some(Signature::Negotiation(251, 24))
        );
        assert_eq!(
            Signature::of(&[255, 250, 31, 0, 80, 0, 24, 255, 240]),
            Some(Signature::Subnegotiation(
                31,
                Bytes::from_static(&[0, 80, 0, 24, 255, 240])
            ))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tracker_suppresses_identical_frames() {
        let mut tracker = CommandTracker::new(Duration::from_secs(2));
        assert!(!tracker.was_sent_recently(&[255, 253, 3]));
        assert!(tracker.was_sent_recently(&[255, 253, 3]));
        assert!(!tracker.was_sent_recently(b"data"));
        assert!(!tracker.was_sent_recently(b"data"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!tracker.was_sent_recently(&[255, 253, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn tracker_tells_window_sizes_apart() {
        let mut tracker = CommandTracker::new(Duration::from_secs(2));
        assert!(!tracker.was_sent_recently(&[255, 250, 31, 0, 80, 0, 24, 255, 240]));
        assert!(!tracker.was_sent_recently(&[255, 250, 31, 0, 132, 0, 43, 255, 240]));
    }
}
