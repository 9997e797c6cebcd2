use super::*;

#[test]
fn test_input_deserialization() {
    let json = r#"{"type":"input","data":"echo hi\n"}"#;
    let msg = ClientMessage::decode(json).unwrap();
    assert_eq!(msg, ClientMessage::input("echo hi\n"));
}

#[test]
fn test_unknown_type_is_malformed() {
    let err = ClientMessage::decode(r#"{"type":"bogus"}"#).unwrap_err();
    assert!(matches!(err, Error::MalformedMessage(_)));
}

#[test]
fn test_missing_data_is_malformed() {
    let err = ClientMessage::decode(r#"{"type":"input"}"#).unwrap_err();
    assert!(matches!(err, Error::MalformedMessage(_)));
}

#[test]
fn test_not_json_is_malformed() {
    assert!(ClientMessage::decode("echo hi").is_err());
}

#[test]
fn test_output_serialization() {
    let json = ServerMessage::output(b"hi\n").encode().unwrap();
    assert!(json.contains("\"type\":\"output\""));
    assert!(json.contains("\"data\":\"hi\\n\""));
}

#[test]
fn test_exit_serialization() {
    let json = ServerMessage::Exit { code: 127 }.encode().unwrap();
    assert_eq!(json, r#"{"type":"exit","code":127}"#);
}

#[test]
fn test_output_replaces_invalid_utf8() {
    let msg = ServerMessage::output(&[b'o', b'k', 0xFF]);
    assert_eq!(
        msg,
        ServerMessage::Output {
            data: "ok\u{FFFD}".to_string()
        }
    );
}

#[test]
fn test_input_command_from_message() {
    let command = InputCommand::from(ClientMessage::input("ls\n"));
    assert_eq!(command.data, b"ls\n".to_vec());
}
