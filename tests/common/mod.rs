#![allow(dead_code)]

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use webtelnet::{Config, Connection, Session, Signal, Transport};

pub const IAC: u8 = 255;
pub const DONT: u8 = 254;
pub const DO: u8 = 253;
pub const WONT: u8 = 252;
pub const WILL: u8 = 251;
pub const SB: u8 = 250;
pub const SE: u8 = 240;

/// Records every write; refuses writes once closed.
#[derive(Default, Debug)]
pub struct Wire {
    pub frames: Vec<Vec<u8>>,
    pub closed: bool,
}

impl Transport for Wire {
    fn send(&mut self, bytes: &[u8]) -> bool {
        if self.closed {
            return false;
        }
        self.frames.push(bytes.to_vec());
        true
    }
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn session() -> Session<Wire, Vec<Signal>> {
    init_tracing();
    Session::new(&Config::default(), Wire::default(), Vec::new())
}

pub fn connection(config: &Config) -> Connection<Wire, Vec<Signal>> {
    init_tracing();
    Connection::open(config, Wire::default(), Vec::new())
}
