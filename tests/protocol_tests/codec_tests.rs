//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use lindaspace::protocol::{
    decode_command, decode_pattern, decode_response, decode_tuple, encode_command,
    encode_pattern, encode_response, encode_tuple, read_command, read_frame, read_response,
    write_command, write_frame, write_response, Command, CommandType, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE, PONG,
};
use lindaspace::{pattern, tuple, SpaceError};

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_out() {
    let cmd = Command::Out {
        tuple: tuple!["foo", 42i64, 3.14],
    };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded[0], CommandType::Out as u8);
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_encode_decode_rd_with_wildcards() {
    let cmd = Command::Rd {
        pattern: pattern![_, "bar", _],
    };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded[0], CommandType::Rd as u8);
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_encode_decode_in() {
    let cmd = Command::In {
        pattern: pattern!["job", -1i64],
    };
    let encoded = encode_command(&cmd).unwrap();

    assert_eq!(encoded[0], CommandType::In as u8);
    assert_eq!(decode_command(&encoded).unwrap(), cmd);
}

#[test]
fn test_encode_ping_has_empty_payload() {
    let encoded = encode_command(&Command::Ping).unwrap();

    assert_eq!(encoded, vec![0x04, 0, 0, 0, 0]);
    assert_eq!(decode_command(&encoded).unwrap(), Command::Ping);
}

#[test]
fn test_header_length_matches_payload() {
    let encoded = encode_command(&Command::Out {
        tuple: tuple!["abc"],
    })
    .unwrap();

    let len = u32::from_be_bytes([encoded[1], encoded[2], encoded[3], encoded[4]]) as usize;
    assert_eq!(encoded.len(), HEADER_SIZE + len);
}

// =============================================================================
// Malformed Commands
// =============================================================================

#[test]
fn test_decode_incomplete_header() {
    let result = decode_command(&[0x01, 0x00]);
    assert!(matches!(result, Err(SpaceError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let mut encoded = encode_command(&Command::Out {
        tuple: tuple!["truncated"],
    })
    .unwrap();
    encoded.truncate(encoded.len() - 2);

    assert!(matches!(decode_command(&encoded), Err(SpaceError::Protocol(_))));
}

#[test]
fn test_decode_unknown_command() {
    let result = decode_command(&[0x7f, 0, 0, 0, 0]);
    assert!(matches!(result, Err(SpaceError::Protocol(_))));
}

#[test]
fn test_decode_oversized_payload() {
    let len = (MAX_PAYLOAD_SIZE + 1).to_be_bytes();
    let frame = [0x01, len[0], len[1], len[2], len[3]];

    assert!(matches!(decode_command(&frame), Err(SpaceError::Protocol(_))));
    assert!(matches!(
        read_frame(&mut Cursor::new(frame.to_vec())),
        Err(SpaceError::Protocol(_))
    ));
}

#[test]
fn test_decode_garbage_payload() {
    let mut frame = vec![0x02, 0, 0, 0, 3];
    frame.extend_from_slice(&[0xff, 0xff, 0xff]);

    assert!(matches!(decode_command(&frame), Err(SpaceError::Protocol(_))));
}

#[test]
fn test_decode_empty_tuple_is_validation_error() {
    // bincode encodes an empty Vec as a zero u64 length
    let mut frame = vec![0x01, 0, 0, 0, 8];
    frame.extend_from_slice(&[0u8; 8]);

    assert!(matches!(decode_command(&frame), Err(SpaceError::Validation(_))));
}

#[test]
fn test_decode_ping_with_payload_rejected() {
    let frame = [0x04, 0, 0, 0, 1, 0xaa];
    assert!(matches!(decode_command(&frame), Err(SpaceError::Protocol(_))));
}

// =============================================================================
// Payload Helpers
// =============================================================================

#[test]
fn test_tuple_and_pattern_payloads() {
    let t = tuple!["k", 1i64];
    let p = pattern!["k", _];

    assert_eq!(decode_tuple(&encode_tuple(&t).unwrap()).unwrap(), t);
    assert_eq!(decode_pattern(&encode_pattern(&p).unwrap()).unwrap(), p);
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_response_with_tuple() {
    let response = Response::with_tuple(&tuple!["foo", 3.14]).unwrap();
    let decoded = decode_response(&encode_response(&response)).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.into_tuple().unwrap(), tuple!["foo", 3.14]);
}

#[test]
fn test_response_ok_without_payload() {
    let encoded = encode_response(&Response::ok(None));
    assert_eq!(encoded, vec![0x00, 0, 0, 0, 0]);

    let decoded = decode_response(&encoded).unwrap();
    assert!(decoded.payload.is_none());
    decoded.into_unit().unwrap();
}

#[test]
fn test_response_error_message() {
    let decoded = decode_response(&encode_response(&Response::error("bad things"))).unwrap();

    assert_eq!(decoded.status, Status::Error);
    match decoded.into_tuple() {
        Err(SpaceError::Remote(message)) => assert_eq!(message, "bad things"),
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[test]
fn test_response_pong() {
    let decoded = decode_response(&encode_response(&Response::pong())).unwrap();
    assert_eq!(decoded.payload.as_deref(), Some(PONG));
}

#[test]
fn test_decode_unknown_status() {
    assert!(matches!(
        decode_response(&[0x09, 0, 0, 0, 0]),
        Err(SpaceError::Protocol(_))
    ));
}

#[test]
fn test_ok_response_missing_tuple() {
    assert!(matches!(
        Response::ok(None).into_tuple(),
        Err(SpaceError::Protocol(_))
    ));
}

// =============================================================================
// Stream-based I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Out {
            tuple: tuple!["a", 1i64],
        },
        Command::Rd {
            pattern: pattern!["a", _],
        },
        Command::Ping,
        Command::In {
            pattern: pattern![_, 1i64],
        },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }

    // Stream exhausted
    assert!(matches!(read_command(&mut cursor), Err(SpaceError::Io(_))));
}

#[test]
fn test_write_frame_from_borrowed_payload() {
    let t = tuple!["borrowed", 7i64];
    let p = pattern!["borrowed", _];

    let mut buffer = Vec::new();
    write_frame(&mut buffer, CommandType::Out as u8, &encode_tuple(&t).unwrap()).unwrap();
    write_frame(&mut buffer, CommandType::In as u8, &encode_pattern(&p).unwrap()).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_command(&mut cursor).unwrap(), Command::Out { tuple: t });
    assert_eq!(read_command(&mut cursor).unwrap(), Command::In { pattern: p });
}

#[test]
fn test_stream_responses() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::ok(None)).unwrap();
    write_response(&mut buffer, &Response::error("nope")).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert!(read_response(&mut cursor).unwrap().is_ok());
    assert_eq!(read_response(&mut cursor).unwrap().status, Status::Error);
}

#[test]
fn test_read_frame_keeps_stream_in_sync_after_bad_frame() {
    let mut buffer = vec![0x7f, 0, 0, 0, 2, 0xde, 0xad];
    write_command(&mut buffer, &Command::Ping).unwrap();

    let mut cursor = Cursor::new(buffer);
    let bad = read_frame(&mut cursor).unwrap();
    assert!(decode_command(&bad).is_err());

    let good = read_frame(&mut cursor).unwrap();
    assert_eq!(decode_command(&good).unwrap(), Command::Ping);
}
