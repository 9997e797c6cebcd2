use super::*;

fn connected_view() -> TerminalView {
    let mut view = TerminalView::new();
    view.begin_session();
    view.session_allocated(SessionId::from("abc"));
    view.transport_opened();
    view
}

fn texts(view: &TerminalView) -> Vec<&str> {
    view.scrollback().iter().map(|l| l.text.as_str()).collect()
}

#[test]
fn test_initial_state() {
    let view = TerminalView::new();
    assert_eq!(view.state(), ConnectionState::Disconnected);
    assert!(!view.input_enabled());
    assert!(view.session_id().is_none());
}

#[test]
fn test_connect_enables_input() {
    let mut view = TerminalView::new();
    view.begin_session();
    assert_eq!(view.state(), ConnectionState::Connecting);
    assert!(!view.input_enabled());

    view.session_allocated(SessionId::from("abc"));
    view.transport_opened();
    assert_eq!(view.state(), ConnectionState::Connected);
    assert!(view.input_enabled());
    assert_eq!(view.session_id().map(SessionId::as_str), Some("abc"));
    assert_eq!(texts(&view), vec!["Terminal connected"]);
}

#[test]
fn test_submit_echoes_and_appends_newline() {
    let mut view = connected_view();
    let message = view.submit("ls -la").unwrap();
    assert_eq!(message, ClientMessage::input("ls -la\n"));

    let last = view.scrollback().last().unwrap();
    assert_eq!(last.kind, LineKind::Input);
    assert_eq!(last.text, "$ ls -la");
}

#[test]
fn test_blank_submit_is_ignored() {
    let mut view = connected_view();
    let before = view.scrollback().len();
    assert!(view.submit("   ").is_none());
    assert_eq!(view.scrollback().len(), before);
}

#[test]
fn test_submit_before_connect_is_ignored() {
    let mut view = TerminalView::new();
    view.begin_session();
    assert!(view.submit("ls").is_none());
    assert!(view.scrollback().is_empty());
}

#[test]
fn test_output_and_exit() {
    let mut view = connected_view();
    view.handle_frame(r#"{"type":"output","data":"hi\n"}"#);
    view.handle_frame(r#"{"type":"exit","code":0}"#);

    assert_eq!(
        texts(&view),
        vec!["Terminal connected", "hi\n", "Process exited with code 0"]
    );
    assert_eq!(view.state(), ConnectionState::Closed);
    assert!(!view.input_enabled());

    // Nothing is appended after the exit
    view.handle_frame(r#"{"type":"output","data":"late"}"#);
    assert_eq!(view.scrollback().len(), 3);
}

#[test]
fn test_malformed_frames_are_ignored() {
    let mut view = connected_view();
    view.handle_frame("garbage");
    view.handle_frame(r#"{"type":"bogus"}"#);
    assert_eq!(view.state(), ConnectionState::Connected);
    assert_eq!(view.scrollback().len(), 1);
}

#[test]
fn test_transport_error_disables_input() {
    let mut view = connected_view();
    view.transport_error("connection reset");
    assert_eq!(view.state(), ConnectionState::Errored);
    assert!(!view.input_enabled());
    assert!(view.submit("ls").is_none());
    assert_eq!(
        view.scrollback().last().unwrap().text,
        "Connection error: connection reset"
    );
}

#[test]
fn test_transport_closed() {
    let mut view = connected_view();
    view.transport_closed();
    assert_eq!(view.state(), ConnectionState::Closed);
    assert_eq!(view.scrollback().last().unwrap().kind, LineKind::System);
}

#[test]
fn test_clear_is_local_only() {
    let mut view = connected_view();
    view.handle_frame(r#"{"type":"output","data":"x"}"#);
    view.clear();
    assert!(view.scrollback().is_empty());
    assert_eq!(view.state(), ConnectionState::Connected);
    assert!(view.session_id().is_some());
}

#[test]
fn test_new_session_discards_scrollback() {
    let mut view = connected_view();
    view.handle_frame(r#"{"type":"exit","code":1}"#);

    view.begin_session();
    assert!(view.scrollback().is_empty());
    assert!(view.session_id().is_none());
    assert_eq!(view.state(), ConnectionState::Connecting);

    view.session_allocated(SessionId::from("def"));
    view.transport_opened();
    assert!(view.input_enabled());
}
