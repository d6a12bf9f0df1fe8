//! Session configuration

use std::time::Duration;

/// Telnet session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Terminal type reported through TERMINAL-TYPE (e.g. "xterm")
    pub terminal_type: String,

    /// Terminal width in columns
    pub width: u16,

    /// Terminal height in rows
    pub height: u16,

    /// Window within which a repeated DO/DONT/WILL/WONT is ignored
    pub negotiation_window: Duration,

    /// Window within which an identical outbound protocol frame is dropped
    pub outbound_window: Duration,

    /// Delay between starting negotiation and announcing terminal type and
    /// window size
    pub announce_delay: Duration,

    /// Switch to telnet mode when the server is seen negotiating
    pub auto_detect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terminal_type: "xterm".to_string(),
            width: 80,
            height: 24,
            negotiation_window: Duration::from_millis(1000),
            outbound_window: Duration::from_millis(2000),
            announce_delay: Duration::from_millis(250),
            auto_detect: true,
        }
    }
}

impl Config {
    /// Set the reported terminal type.
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set the initial dimensions. Zero values are ignored.
    pub fn with_dimensions(mut self, width: u16, height: u16) -> Self {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
        self
    }

    /// Set both dedup windows.
    pub fn with_windows(mut self, negotiation: Duration, outbound: Duration) -> Self {
        self.negotiation_window = negotiation;
        self.outbound_window = outbound;
        self
    }

    /// Set the announcement delay.
    pub fn with_announce_delay(mut self, delay: Duration) -> Self {
        self.announce_delay = delay;
        self
    }

    /// Enable or disable auto-detection.
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect = auto_detect;
        self
    }
}
