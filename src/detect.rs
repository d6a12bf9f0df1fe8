use std::convert::TryFrom;

use tracing::{debug, info};

use crate::op::{Cmd, Opt};

/// The first telnet sequence found in a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    /// Offset of the IAC byte.
    pub position: usize,
    /// `DO`, `DONT`, `WILL`, `WONT` or `SB`.
    pub cmd: Cmd,
    /// The byte after the command.
    pub opt: Opt,
}

/// Look for `IAC <DO|DONT|WILL|WONT|SB> <opt>` anywhere in `data`.
pub fn find_negotiation(data: &[u8]) -> Option<Detection> {
    data.windows(3).enumerate().find_map(|(position, w)| {
        if w[0] != Cmd::IAC {
            return None;
        }
        let cmd = Cmd::try_from(w[1]).ok()?;
        if !(cmd.is_negotiation() || cmd == Cmd::SB) {
            return None;
        }
        Some(Detection {
            position,
            cmd,
            opt: Opt::from(w[2]),
        })
    })
}

/// Decides, once per connection, whether the peer speaks telnet.
#[derive(Debug, Default)]
pub struct Detector {
    latched: bool,
}

impl Detector {
    /// A detector that has not seen telnet yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// True once telnet has been detected or forced.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Stop scanning, as if telnet had been detected.
    pub fn latch(&mut self) {
        self.latched = true;
    }

    /// Allow scanning again.
    pub fn unlatch(&mut self) {
        self.latched = false;
    }

    /// Scan `data` unless already latched. The first hit latches.
    pub fn inspect(&mut self, data: &[u8]) -> Option<Detection> {
        if self.latched {
            return None;
        }
        let found = find_negotiation(data);
        match found {
            Some(found) => {
                info!(
                    cmd = %found.cmd,
                    opt = %found.opt,
                    position = found.position,
                    "telnet detected"
                );
                self.latched = true;
            }
            None => debug!(len = data.len(), "no telnet negotiation in chunk"),
        }
        found
    }
}
