//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use logkv::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, CommandType, Response, Status,
    MAX_PAYLOAD_SIZE,
};
use logkv::LogKvError;

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_get() {
    let cmd = Command::Get {
        key: "hello".to_string(),
    };
    let encoded = encode_command(&cmd);
    let decoded = decode_command(&encoded).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_set() {
    let cmd = Command::Set {
        key: "mykey".to_string(),
        value: "myvalue".to_string(),
    };
    let encoded = encode_command(&cmd);
    let decoded = decode_command(&encoded).unwrap();

    match decoded {
        Command::Set { key, value } => {
            assert_eq!(key, "mykey");
            assert_eq!(value, "myvalue");
        }
        _ => panic!("Expected SET command"),
    }
}

#[test]
fn test_encode_decode_compact() {
    let encoded = encode_command(&Command::Compact);
    assert_eq!(encoded.len(), 5);
    assert_eq!(decode_command(&encoded).unwrap(), Command::Compact);
}

#[test]
fn test_encode_decode_ping() {
    let encoded = encode_command(&Command::Ping);
    assert_eq!(decode_command(&encoded).unwrap(), Command::Ping);
}

#[test]
fn test_encode_decode_empty_value() {
    let cmd = Command::Set {
        key: "key".to_string(),
        value: String::new(),
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_value_with_separator_and_unicode() {
    let cmd = Command::Set {
        key: "город".to_string(),
        value: "a,b,c → d".to_string(),
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_command_type_codes() {
    assert_eq!(CommandType::Get as u8, 0x01);
    assert_eq!(CommandType::Set as u8, 0x02);
    assert_eq!(CommandType::Compact as u8, 0x03);
    assert_eq!(CommandType::Ping as u8, 0x04);
    assert_eq!(Command::Compact.command_type(), CommandType::Compact);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_ok() {
    let resp = Response::ok(Some("value".to_string()));
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, Some("value".to_string()));
}

#[test]
fn test_encode_decode_response_ok_no_payload() {
    let resp = Response::ok(None);
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded, resp);
}

#[test]
fn test_empty_payload_decodes_as_none() {
    let resp = Response::ok(Some(String::new()));
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded.payload, None);
}

#[test]
fn test_encode_decode_response_not_found() {
    let decoded = decode_response(&encode_response(&Response::not_found())).unwrap();

    assert_eq!(decoded.status, Status::NotFound);
    assert!(decoded.payload.is_none());
}

#[test]
fn test_encode_decode_response_error() {
    let resp = Response::error("Something went wrong");
    let decoded = decode_response(&encode_response(&resp)).unwrap();

    assert_eq!(decoded.status, Status::Error);
    assert_eq!(decoded.payload.as_deref(), Some("Something went wrong"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x01, 0x00, 0x00]; // Only 3 bytes, need 5
    let result = decode_command(&bytes);
    assert!(matches!(result, Err(LogKvError::Protocol(_))));
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Incomplete command header"));
}

#[test]
fn test_incomplete_payload() {
    // Header says 10 bytes payload, but only 5 provided
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x05, 0x68];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Incomplete"));
}

#[test]
fn test_unknown_command_type() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_command(&bytes);
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unknown command type"));
}

#[test]
fn test_unknown_response_status() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_response(&bytes);
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Unknown response status"));
}

#[test]
fn test_get_missing_key_length() {
    // GET command with payload too short for key length
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00];
    let result = decode_command(&bytes);
    assert!(matches!(result, Err(LogKvError::Protocol(_))));
}

#[test]
fn test_get_key_length_past_payload() {
    // key_len 9 but only 2 key bytes follow
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x09, b'h', b'i'];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("incomplete key"));
}

#[test]
fn test_get_with_trailing_bytes() {
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, b'k', b'x'];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("trailing bytes"));
}

#[test]
fn test_set_invalid_utf8_value() {
    let bytes = [0x02, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x01, b'k', 0xff, 0xfe];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("not valid UTF-8"));
}

#[test]
fn test_response_invalid_utf8_payload() {
    let bytes = [0x00, 0x00, 0x00, 0x00, 0x02, 0xff, 0xfe];
    let result = decode_response(&bytes);
    assert!(matches!(result, Err(LogKvError::Protocol(_))));
}

#[test]
fn test_ping_with_unexpected_payload() {
    let bytes = [0x04, 0x00, 0x00, 0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F];
    let result = decode_command(&bytes);
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("unexpected payload"));
}

#[test]
fn test_oversized_payload_rejected() {
    let len = (MAX_PAYLOAD_SIZE + 1).to_be_bytes();
    let bytes = [0x04, len[0], len[1], len[2], len[3]];

    let result = read_command(&mut Cursor::new(bytes.to_vec()));

    assert!(result.unwrap_err().to_string().contains("too large"));
}

#[test]
fn test_read_from_closed_stream() {
    let result = read_command(&mut Cursor::new(Vec::new()));
    assert!(matches!(result, Err(LogKvError::Io(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_command() {
    let cmd = Command::Set {
        key: "key".to_string(),
        value: "value".to_string(),
    };

    let mut buffer = Vec::new();
    write_command(&mut buffer, &cmd).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_command(&mut cursor).unwrap(), cmd);
}

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::Set {
            key: "k1".to_string(),
            value: "v1".to_string(),
        },
        Command::Get {
            key: "k1".to_string(),
        },
        Command::Compact,
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }
}

#[test]
fn test_stream_multiple_responses() {
    let responses = vec![
        Response::ok(Some("data".to_string())),
        Response::not_found(),
        Response::error("oops"),
        Response::ok(None),
    ];

    let mut buffer = Vec::new();
    for resp in &responses {
        write_response(&mut buffer, resp).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &responses {
        let decoded = read_response(&mut cursor).unwrap();
        assert_eq!(&decoded, expected);
    }
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_get() {
    let cmd = Command::Get {
        key: "test".to_string(),
    };
    let encoded = encode_command(&cmd);

    // [0x01][0x00 0x00 0x00 0x08][0x00 0x00 0x00 0x04][t e s t]
    //  cmd   payload_len(8)       key_len(4)          key
    assert_eq!(encoded[0], 0x01);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x08]);
    assert_eq!(&encoded[5..9], &[0x00, 0x00, 0x00, 0x04]);
    assert_eq!(&encoded[9..13], b"test");
}

#[test]
fn test_wire_format_set() {
    let cmd = Command::Set {
        key: "k".to_string(),
        value: "vv".to_string(),
    };
    let encoded = encode_command(&cmd);

    // [0x02][0 0 0 7][0 0 0 1][k][v v]
    assert_eq!(
        encoded,
        vec![0x02, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x01, b'k', b'v', b'v']
    );
}

#[test]
fn test_wire_format_response_ok() {
    let resp = Response::ok(Some("hi".to_string()));
    let encoded = encode_response(&resp);

    // [0x00][0x00 0x00 0x00 0x02][h i]
    //  status payload_len(2)      payload
    assert_eq!(encoded[0], 0x00);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(&encoded[5..7], b"hi");
}
