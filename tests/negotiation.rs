mod common;

use common::*;
use proptest::prelude::*;
use webtelnet::{Opt, Signal, MAX_SUBNEGOTIATION_LEN};

#[test]
fn will_and_wont_echo() {
    let mut session = session();
    session.feed(&[IAC, WILL, 1]);
    assert_eq!(session.transport().frames, vec![vec![IAC, DO, 1]]);
    assert_eq!(session.notifier(), &vec![Signal::LocalEcho(false)]);

    let mut session = common::session();
    session.feed(&[IAC, WONT, 1]);
    assert_eq!(session.transport().frames, vec![vec![IAC, DONT, 1]]);
    assert_eq!(session.notifier(), &vec![Signal::LocalEcho(true)]);
}

#[test]
fn duplicate_do_echo() {
    let mut session = session();
    session.feed(&[IAC, DO, 1, IAC, DO, 1]);
    session.feed(&[IAC, DO, 1]);
    assert_eq!(session.transport().frames, vec![vec![IAC, WILL, 1]]);
    assert_eq!(session.notifier(), &vec![Signal::LocalEcho(false)]);
}

#[test]
fn terminal_type_request() {
    let mut session = session();
    session.feed(&[IAC, SB, 24, 1, IAC, SE]);
    assert_eq!(
        session.transport().frames,
        vec![vec![IAC, SB, 24, 0, b'x', b't', b'e', b'r', b'm', IAC, SE]]
    );
}

#[test]
fn initialize_twice() {
    let mut session = session();
    session.initialize_negotiation();
    let sent = session.transport().frames.len();
    assert_eq!(sent, 5);
    session.initialize_negotiation();
    assert_eq!(session.transport().frames.len(), sent);
}

#[test]
fn text_around_a_command() {
    let mut session = session();
    let mut input = b"hi".to_vec();
    input.extend_from_slice(&[IAC, WILL, 3]);
    input.extend_from_slice(b"bye");
    assert_eq!(&session.feed(&input)[..], b"hibye");
}

#[test]
fn naws_after_resize() {
    let mut session = session();
    session.feed(&[IAC, DO, 31]);
    assert!(session.local_enabled(Opt::NAWS));
    session.set_dimensions(132, 43);
    assert_eq!(
        session.transport().frames.last(),
        Some(&vec![IAC, SB, 31, 0, 132, 0, 43, IAC, SE])
    );
}

#[test]
fn resize_and_back() {
    let mut session = session();
    session.feed(&[IAC, DO, 31]);
    session.set_dimensions(132, 43);
    session.set_dimensions(80, 24);
    assert_eq!(
        session.transport().frames.last(),
        Some(&vec![IAC, SB, 31, 0, 80, 0, 24, IAC, SE])
    );
}

#[test]
fn unterminated_subnegotiation_gives_way() {
    let mut session = session();
    let mut input = vec![IAC, SB, 24];
    input.resize(3 + MAX_SUBNEGOTIATION_LEN + 1, b'x');
    assert!(session.feed(&input).is_empty());
    assert_eq!(&session.feed(b"login: ")[..], b"login: ");
}

#[test]
fn typical_server_handshake() -> anyhow::Result<()> {
    let mut session = session();
    session.activate();
    session.initialize_negotiation();

    let greeting: Vec<u8> = [
        &[IAC, DO, 24, IAC, DO, 31, IAC, WILL, 1, IAC, WILL, 3][..],
        &b"\r\nWelcome\r\n"[..],
        &[IAC, SB, 24, 1, IAC, SE][..],
        &b"login: "[..],
    ]
    .concat();
    let shown = session.feed(&greeting);
    assert_eq!(&shown[..], b"\r\nWelcome\r\nlogin: ");

    assert!(session.local_enabled(Opt::TERMINAL_TYPE));
    assert!(session.local_enabled(Opt::NAWS));
    assert!(session.remote_enabled(Opt::ECHO));
    assert!(session.remote_enabled(Opt::SGA));

    session.send_text("guest")?;
    session.send_text("\r\n")?;
    let frames = &session.transport().frames;
    assert_eq!(frames[frames.len() - 2], b"guest".to_vec());
    assert_eq!(frames[frames.len() - 1], vec![13, 10]);
    Ok(())
}

fn token() -> impl Strategy<Value = Vec<u8>> {
    let opt = prop::sample::select(vec![1u8, 3, 5, 24, 31, 34, 39, 200]);
    prop_oneof![
        (0u8..255).prop_map(|b| vec![b]),
        Just(vec![IAC, IAC]),
        Just(vec![IAC, 249]),
        (251u8..=254, opt).prop_map(|(cmd, opt)| vec![IAC, cmd, opt]),
        Just(vec![IAC, SB, 24, 1, IAC, SE]),
        Just(vec![IAC, SB, 31, 0, 255, 255, 0, 24, IAC, SE]),
    ]
}

fn stream() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    prop::collection::vec(token(), 0..40)
        .prop_map(|tokens| tokens.concat())
        .prop_flat_map(|bytes| {
            let len = bytes.len();
            (Just(bytes), prop::collection::vec(0..=len, 0..8))
        })
}

proptest! {
    #[test]
    fn chunk_boundaries_are_invisible((bytes, mut cuts) in stream()) {
        let mut whole = session();
        let expected = whole.feed(&bytes);

        cuts.sort_unstable();
        let mut split = session();
        let mut output = Vec::new();
        let mut start = 0;
        for cut in cuts.into_iter().chain(std::iter::once(bytes.len())) {
            output.extend_from_slice(&split.feed(&bytes[start..cut]));
            start = cut;
        }

        prop_assert_eq!(&output[..], &expected[..]);
        prop_assert_eq!(&split.transport().frames, &whole.transport().frames);
        prop_assert_eq!(split.notifier(), whole.notifier());
        prop_assert_eq!(split.parser_state(), whole.parser_state());
    }
}
