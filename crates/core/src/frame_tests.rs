use super::*;
use std::io::Cursor;

fn encode(payload: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    send_frame(&mut buf, payload).unwrap();
    buf
}

#[test]
fn send_then_receive_roundtrips() {
    let wire = encode("STATUS Closed 3 3");
    let mut cursor = Cursor::new(wire);
    let got = receive_frame(&mut cursor).unwrap();
    assert_eq!(got, "STATUS Closed 3 3");
}

#[test]
fn receive_frame_into_fits_small_payload() {
    let wire = encode("FLOOR 7");
    let mut cursor = Cursor::new(wire);
    let mut buf = [0u8; 64];
    let n = receive_frame_into(&mut cursor, &mut buf).unwrap();
    assert_eq!(&buf[..n], b"FLOOR 7");
}

#[test]
fn receive_frame_into_truncates_oversized_payload_and_drains_remainder() {
    let payload = "X".repeat(2000);
    let wire = encode(&payload);
    let mut cursor = Cursor::new(wire);
    let mut buf = [0u8; 16];
    let n = receive_frame_into(&mut cursor, &mut buf).unwrap();
    assert_eq!(n, 15);
    assert_eq!(&buf[..n], "X".repeat(15).as_bytes());
    // The drained remainder must be fully consumed: nothing left to read.
    assert!(matches!(receive_frame(&mut cursor), Err(FrameError::Closed)));
}

#[test]
fn receive_frame_into_drains_exact_multiple_of_chunk_size() {
    let payload = "Y".repeat(DRAIN_CHUNK * 2 + 10);
    let wire = encode(&payload);
    let mut cursor = Cursor::new(wire);
    let mut buf = [0u8; 8];
    let n = receive_frame_into(&mut cursor, &mut buf).unwrap();
    assert_eq!(n, 7);
    // Stream is fully drained: the 2-byte length prefix of a follow-up frame
    // is absent, so a subsequent receive reports the connection closed.
    assert!(matches!(receive_frame(&mut cursor), Err(FrameError::Closed)));
}

#[test]
fn send_frame_clamps_to_u16_max() {
    let huge = "Z".repeat(u16::MAX as usize + 500);
    let mut buf = Vec::new();
    send_frame(&mut buf, &huge).unwrap();
    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    assert_eq!(len, u16::MAX as usize);
    assert_eq!(buf.len(), 2 + len);
}

#[test]
fn receive_frame_on_empty_stream_is_closed() {
    let mut cursor = Cursor::new(Vec::new());
    assert!(matches!(receive_frame(&mut cursor), Err(FrameError::Closed)));
}

#[test]
fn receive_frame_rejects_invalid_utf8() {
    let mut wire = vec![0u8, 2];
    wire.extend_from_slice(&[0xFF, 0xFE]);
    let mut cursor = Cursor::new(wire);
    assert!(matches!(
        receive_frame(&mut cursor),
        Err(FrameError::InvalidEncoding)
    ));
}

#[test]
fn empty_payload_roundtrips() {
    let wire = encode("");
    let mut cursor = Cursor::new(wire);
    assert_eq!(receive_frame(&mut cursor).unwrap(), "");
}
