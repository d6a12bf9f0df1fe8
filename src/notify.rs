use tracing::debug;

/// An advisory signal for the terminal UI.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Whether keystrokes should be echoed locally.
    LocalEcho(bool),
    /// Whether input should be buffered a line at a time.
    LineMode(bool),
    /// Whether telnet processing is engaged on the connection.
    TelnetMode(bool),
}

/// Receives UI signals from a telnet session.
///
/// Every method has a no-op default, so implementors only pick the signals
/// they render. Nothing in the engine depends on them being consumed.
pub trait Notifier {
    /// Called for every signal. Dispatches to the specific methods below.
    fn notify(&mut self, signal: Signal) {
        match signal {
            Signal::LocalEcho(enabled) => self.local_echo(enabled),
            Signal::LineMode(enabled) => self.line_mode(enabled),
            Signal::TelnetMode(active) => self.telnet_mode(active),
        }
    }

    /// Local echo should be turned on or off.
    fn local_echo(&mut self, _enabled: bool) {}

    /// Line-buffered input should be turned on or off.
    fn line_mode(&mut self, _enabled: bool) {}

    /// Telnet mode was engaged or dropped.
    fn telnet_mode(&mut self, _active: bool) {}
}

/// Ignores every signal.
pub struct NopNotifier;

impl Notifier for NopNotifier {}

/// Logs every signal at debug level.
pub struct DebugNotifier;

impl Notifier for DebugNotifier {
    fn notify(&mut self, signal: Signal) {
        debug!(?signal, "ui signal");
    }
}

/// Records signals in order.
impl Notifier for Vec<Signal> {
    fn notify(&mut self, signal: Signal) {
        self.push(signal);
    }
}

impl<N> Notifier for &mut N
where
    N: Notifier + ?Sized,
{
    fn notify(&mut self, signal: Signal) {
        (**self).notify(signal)
    }
}

impl<N> Notifier for Box<N>
where
    N: Notifier + ?Sized,
{
    fn notify(&mut self, signal: Signal) {
        (**self).notify(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct EchoOnly {
        echo: Option<bool>,
    }

    impl Notifier for EchoOnly {
        fn local_echo(&mut self, enabled: bool) {
            self.echo = Some(enabled);
        }
    }

    #[test]
    fn default_dispatch() {
        let mut notifier = EchoOnly::default();
        notifier.notify(Signal::LineMode(true));
        assert_eq!(notifier.echo, None);
        notifier.notify(Signal::LocalEcho(false));
        assert_eq!(notifier.echo, Some(false));
    }

    #[test]
    fn debug_notifier_swallows_signals() {
        let mut notifier = DebugNotifier;
        notifier.notify(Signal::LineMode(true));
        NopNotifier.notify(Signal::LocalEcho(true));
    }

    #[test]
    fn forwarding_through_references() {
        let mut log = Vec::new();
        {
            let mut boxed: Box<dyn Notifier + '_> = Box::new(&mut log);
            boxed.notify(Signal::TelnetMode(true));
        }
        assert_eq!(log, vec![Signal::TelnetMode(true)]);
    }
}
