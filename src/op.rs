use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Copy, Clone, Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq, Hash)]
#[repr(u8)]
/// A telnet command.
pub enum Cmd {
    /// End of Record
    EOR = 239,
    /// End of subnegotiation parameters.
    SE = 240,
    /// No operation.
    NOP = 241,
    /// Data Mark.
    DM = 242,
    /// NVT character BRK.
    Break = 243,
    /// The function IP.
    IP = 244,
    /// The function AO.
    AO = 245,
    /// The function AYT.
    AYT = 246,
    /// The function EC.
    EC = 247,
    /// The function EL.
    EL = 248,
    /// The GA signal.
    GA = 249,
    /// Indicates that what follows is subnegotiation of the indicated option.
    SB = 250,
    /// The sender wants to begin, or confirms it is now performing, the
    /// indicated option.
    WILL = 251,
    /// The sender refuses to perform, or continue performing, the option.
    WONT = 252,
    /// The sender asks the other party to perform the option.
    DO = 253,
    /// The sender demands the other party stop performing the option.
    DONT = 254,
    /// Interpret As Command. Doubled, it is data byte 255.
    IAC = 255,
}

impl Cmd {
    /// True for the four option negotiation verbs.
    pub fn is_negotiation(self) -> bool {
        matches!(self, Cmd::WILL | Cmd::WONT | Cmd::DO | Cmd::DONT)
    }

    /// The name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Cmd::EOR => "EOR",
            Cmd::SE => "SE",
            Cmd::NOP => "NOP",
            Cmd::DM => "DM",
            Cmd::Break => "BRK",
            Cmd::IP => "IP",
            Cmd::AO => "AO",
            Cmd::AYT => "AYT",
            Cmd::EC => "EC",
            Cmd::EL => "EL",
            Cmd::GA => "GA",
            Cmd::SB => "SB",
            Cmd::WILL => "WILL",
            Cmd::WONT => "WONT",
            Cmd::DO => "DO",
            Cmd::DONT => "DONT",
            Cmd::IAC => "IAC",
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PartialEq<Cmd> for u8 {
    fn eq(&self, other: &Cmd) -> bool {
        *self == *other as u8
    }
}

impl PartialEq<u8> for Cmd {
    fn eq(&self, other: &u8) -> bool {
        *self as u8 == *other
    }
}

#[derive(Copy, Clone, Debug, TryFromPrimitive, IntoPrimitive, PartialEq, Eq)]
#[repr(u8)]
#[allow(non_camel_case_types)]
/// NVT control codes that matter when sending line endings and keys.
#[allow(missing_docs)]
pub enum Ctl {
    NUL = 0,
    CTRL_C = 3,
    BS = 8,
    LF = 10,
    CR = 13,
    DEL = 127,
}

impl PartialEq<Ctl> for u8 {
    fn eq(&self, other: &Ctl) -> bool {
        *self == *other as u8
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
/// A telnet option.
pub enum Opt {
    /// An option this client knows by name.
    Known(KnownOpt),
    /// A valid, but unrecognized option.
    Unknown(u8),
}

impl Opt {
    /// Echo.
    pub const ECHO: Opt = Opt::Known(KnownOpt::ECHO);
    /// Suppress Go Ahead.
    pub const SGA: Opt = Opt::Known(KnownOpt::SUPPRESS_GA);
    /// Terminal type.
    pub const TERMINAL_TYPE: Opt = Opt::Known(KnownOpt::TERMINAL_TYPE);
    /// Negotiate About Window Size.
    pub const NAWS: Opt = Opt::Known(KnownOpt::NAWS);
    /// Line mode.
    pub const LINEMODE: Opt = Opt::Known(KnownOpt::LINEMODE);
}

impl From<u8> for Opt {
    fn from(other: u8) -> Self {
        match KnownOpt::try_from_primitive(other) {
            Ok(opt) => Opt::Known(opt),
            Err(_) => Opt::Unknown(other),
        }
    }
}

impl From<Opt> for u8 {
    fn from(other: Opt) -> u8 {
        match other {
            Opt::Known(opt) => opt as u8,
            Opt::Unknown(opt) => opt,
        }
    }
}

impl From<KnownOpt> for Opt {
    fn from(other: KnownOpt) -> Self {
        Opt::Known(other)
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opt::Known(opt) => f.write_str(opt.name()),
            Opt::Unknown(code) => write!(f, "UNKNOWN-OPTION-{code}"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
#[allow(non_camel_case_types)]
/// The telnet options this client can name.
#[allow(missing_docs)]
pub enum KnownOpt {
    ECHO = 1,
    SUPPRESS_GA = 3,
    STATUS = 5,
    TIMING_MARK = 6,
    TERMINAL_TYPE = 24,
    NAWS = 31,
    TERMINAL_SPEED = 32,
    LINEMODE = 34,
    ENVIRON = 36,
    NEW_ENVIRON = 39,
}

impl KnownOpt {
    /// The conventional short name, as printed in negotiation logs.
    pub fn name(self) -> &'static str {
        match self {
            KnownOpt::ECHO => "ECHO",
            KnownOpt::SUPPRESS_GA => "SGA",
            KnownOpt::STATUS => "STATUS",
            KnownOpt::TIMING_MARK => "TIMING-MARK",
            KnownOpt::TERMINAL_TYPE => "TERMINAL-TYPE",
            KnownOpt::NAWS => "NAWS",
            KnownOpt::TERMINAL_SPEED => "TERMINAL-SPEED",
            KnownOpt::LINEMODE => "LINEMODE",
            KnownOpt::ENVIRON => "ENVIRON",
            KnownOpt::NEW_ENVIRON => "NEW-ENVIRON",
        }
    }
}

impl PartialEq<KnownOpt> for u8 {
    fn eq(&self, other: &KnownOpt) -> bool {
        *self == *other as u8
    }
}

impl PartialEq<u8> for KnownOpt {
    fn eq(&self, other: &u8) -> bool {
        *self as u8 == *other
    }
}

impl PartialEq<Opt> for u8 {
    fn eq(&self, other: &Opt) -> bool {
        *self == u8::from(*other)
    }
}

impl PartialEq<u8> for Opt {
    fn eq(&self, other: &u8) -> bool {
        u8::from(*self) == *other
    }
}

/// TERMINAL-TYPE subnegotiation codes (RFC 1091).
pub mod ttype {
    /// `IAC SB TERMINAL-TYPE IS <name> IAC SE`
    pub const IS: u8 = 0;
    /// `IAC SB TERMINAL-TYPE SEND IAC SE`
    pub const SEND: u8 = 1;
}
