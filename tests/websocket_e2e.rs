//! WebSocket Frame Decoder E2E Verification Suite
//!
//! End-to-end verification for the four-stage frame decoder driven
//! through the per-connection driver, the way a transport layer would.
//!
//! Test Coverage:
//! - Masking round trips (text and binary)
//! - Extended payload length selection: 125 / 126 / 127 / 65535 / 65536
//! - Fragmentation with interleaved chunk splits of the frame headers
//! - Control frames between fragments
//! - Permessage-deflate decode after reassembly
//! - Structural errors never deliver a package

#![allow(missing_docs)]

mod common;

use common::*;
use proptest::prelude::*;
use sockfilter::buffer::Segment;
use sockfilter::error::ProtocolError;
use sockfilter::filter::{FilterDriver, FilterState};
use sockfilter::websocket::{
    AssembledMessage, OpCode, PerMessageDeflate, WebSocketExtension, WebSocketFilter,
    WebSocketPackage, WsMessage,
};

fn init_test(test_name: &str) {
    init_test_logging();
    test_phase!(test_name);
}

fn client_driver() -> FilterDriver<WebSocketPackage> {
    FilterDriver::new(Box::new(WebSocketFilter::client()))
}

fn server_driver() -> FilterDriver<WebSocketPackage> {
    FilterDriver::new(Box::new(WebSocketFilter::server()))
}

// ============================================================================
// MASKING
// ============================================================================

/// E2E-WS-001: a text message masked with a key decodes back to the
/// original UTF-8 string exactly.
#[test]
fn e2e_ws_001_masking_round_trip() {
    init_test("e2e_ws_001_masking_round_trip");

    let key = [0x37, 0xFA, 0x21, 0x3D];
    let original = "Hello, WebSocket! Ünïcödé too.";
    let mut driver = server_driver();
    driver.push(Segment::copy_from_slice(&build_frame(
        true,
        false,
        0x1,
        Some(key),
        original.as_bytes(),
    )));

    let package = driver.poll_package().expect("decode").expect("package");
    assert_with_log!(
        package.message.as_text() == Some(original),
        "unmasked text",
        original,
        package.message.as_text()
    );
    assert_with_log!(package.has_mask, "mask flag", true, package.has_mask);
    assert_with_log!(
        package.mask_key == Some(key),
        "mask key",
        Some(key),
        package.mask_key
    );

    test_complete!("e2e_ws_001_masking_round_trip");
}

/// E2E-WS-002: a server-side filter rejects unmasked frames; no
/// package is delivered for the failed message.
#[test]
fn e2e_ws_002_server_requires_mask() {
    init_test("e2e_ws_002_server_requires_mask");

    let mut driver = server_driver();
    driver.push(Segment::copy_from_slice(&build_frame(
        true, false, 0x1, None, b"nope",
    )));

    let err = driver.poll_package().expect_err("unmasked");
    assert_with_log!(
        matches!(err, ProtocolError::UnmaskedFrame),
        "unmasked frame error",
        "UnmaskedFrame",
        err
    );
    assert_with_log!(
        driver.state() == FilterState::Error,
        "latched",
        FilterState::Error,
        driver.state()
    );

    test_complete!("e2e_ws_002_server_requires_mask");
}

// ============================================================================
// EXTENDED LENGTH
// ============================================================================

/// E2E-WS-003: payload lengths 125, 126, 127, 65535, 65536 each select
/// the correct length-reading path.
#[test]
fn e2e_ws_003_extended_length_boundaries() {
    init_test("e2e_ws_003_extended_length_boundaries");

    for (len, header_len) in [(125, 2), (126, 4), (127, 4), (65535, 4), (65536, 10)] {
        test_section!(format!("payload length {len}"));
        let wire = build_frame(true, false, 0x2, None, &vec![0x5A; len]);
        assert_with_log!(
            wire.len() == header_len + len,
            "header width",
            header_len,
            wire.len() - len
        );

        let mut driver = client_driver();
        driver.push(Segment::copy_from_slice(&wire));
        let package = driver.poll_package().expect("decode").expect("package");
        assert_with_log!(
            package.message.as_bytes().len() == len,
            "payload length",
            len,
            package.message.as_bytes().len()
        );
        assert_with_log!(
            package.payload_length == len as u64,
            "reported wire length",
            len,
            package.payload_length
        );
    }

    test_complete!("e2e_ws_003_extended_length_boundaries");
}

// ============================================================================
// FRAGMENTATION
// ============================================================================

/// E2E-WS-004: a message split into 3 frames with FIN=0,0,1
/// reassembles into the single original payload.
#[test]
fn e2e_ws_004_three_fragment_reassembly() {
    init_test("e2e_ws_004_three_fragment_reassembly");

    let mut wire = build_frame(false, false, 0x1, None, b"one ");
    wire.extend_from_slice(&build_frame(false, false, 0x0, None, b"two "));
    wire.extend_from_slice(&build_frame(true, false, 0x0, None, b"three"));

    let mut driver = client_driver();
    driver.push(Segment::copy_from_slice(&wire));

    let package = driver.poll_package().expect("decode").expect("package");
    assert_with_log!(
        package.message.as_text() == Some("one two three"),
        "reassembled payload",
        "one two three",
        package.message.as_text()
    );
    assert_with_log!(
        package.op_code == OpCode::Text,
        "initial opcode",
        OpCode::Text,
        package.op_code
    );

    test_complete!("e2e_ws_004_three_fragment_reassembly");
}

/// E2E-WS-005: control frames interleave between fragments without
/// disturbing the accumulator.
#[test]
fn e2e_ws_005_control_between_fragments() {
    init_test("e2e_ws_005_control_between_fragments");

    let key = [1, 2, 3, 4];
    let mut wire = build_frame(false, false, 0x1, Some(key), b"He");
    wire.extend_from_slice(&build_frame(true, false, 0x9, Some(key), b"alive?"));
    wire.extend_from_slice(&build_frame(true, false, 0x0, Some(key), b"llo"));

    let mut driver = server_driver();
    driver.push(Segment::copy_from_slice(&wire));

    let ping = driver.poll_package().expect("decode").expect("ping first");
    assert_with_log!(ping.op_code == OpCode::Ping, "ping", OpCode::Ping, ping.op_code);
    assert_with_log!(
        ping.message.as_bytes() == b"alive?",
        "ping payload",
        b"alive?",
        ping.message.as_bytes()
    );

    let text = driver.poll_package().expect("decode").expect("then text");
    assert_with_log!(
        text.message.as_text() == Some("Hello"),
        "reassembled around control frame",
        "Hello",
        text.message.as_text()
    );

    test_complete!("e2e_ws_005_control_between_fragments");
}

/// E2E-WS-006: a zero-length FIN=0 frame legally opens a fragmented
/// message.
#[test]
fn e2e_ws_006_zero_length_fragment() {
    init_test("e2e_ws_006_zero_length_fragment");

    let mut wire = build_frame(false, false, 0x2, None, b"");
    wire.extend_from_slice(&build_frame(false, false, 0x0, None, b""));
    wire.extend_from_slice(&build_frame(true, false, 0x0, None, &[9, 9]));

    let mut driver = client_driver();
    driver.push(Segment::copy_from_slice(&wire));

    let package = driver.poll_package().expect("decode").expect("package");
    assert_with_log!(
        package.message.as_bytes() == [9, 9],
        "payload",
        [9, 9],
        package.message.as_bytes()
    );
    assert_with_log!(
        package.op_code == OpCode::Binary,
        "opcode from empty first fragment",
        OpCode::Binary,
        package.op_code
    );

    test_complete!("e2e_ws_006_zero_length_fragment");
}

// ============================================================================
// EXTENSIONS
// ============================================================================

/// E2E-WS-007: a compressed message inflates after reassembly and
/// before text materialization; RSV1 is consumed.
#[test]
fn e2e_ws_007_deflate_end_to_end() {
    init_test("e2e_ws_007_deflate_end_to_end");

    let original = "compressible compressible compressible compressible";

    // Outbound mirror: deflate the payload the way a peer would.
    let mut encoder = PerMessageDeflate::default();
    let mut outbound = AssembledMessage {
        op_code: OpCode::Text,
        rsv1: false,
        rsv2: false,
        rsv3: false,
        payload: original.as_bytes().to_vec(),
    };
    encoder.encode(&mut outbound).expect("deflate");
    assert_with_log!(outbound.rsv1, "rsv1 signalled", true, outbound.rsv1);

    let wire = build_frame(true, true, 0x1, None, &outbound.payload);
    let mut driver = FilterDriver::new(Box::new(
        WebSocketFilter::client().extension(Box::new(PerMessageDeflate::default())),
    ));
    driver.push(Segment::copy_from_slice(&wire));

    let package = driver.poll_package().expect("decode").expect("package");
    assert_with_log!(
        package.message.as_text() == Some(original),
        "inflated text",
        original,
        package.message.as_text()
    );
    assert_with_log!(!package.rsv1, "rsv1 consumed", false, package.rsv1);

    test_complete!("e2e_ws_007_deflate_end_to_end");
}

/// E2E-WS-008: a corrupt compressed stream surfaces as an error tagged
/// with the extension's name.
#[test]
fn e2e_ws_008_deflate_corrupt_stream() {
    init_test("e2e_ws_008_deflate_corrupt_stream");

    let wire = build_frame(true, true, 0x2, None, &[0xDE, 0xAD, 0xBE, 0xEF]);
    let mut driver = FilterDriver::new(Box::new(
        WebSocketFilter::client().extension(Box::new(PerMessageDeflate::default())),
    ));
    driver.push(Segment::copy_from_slice(&wire));

    let err = driver.poll_package().expect_err("corrupt stream");
    match err {
        ProtocolError::Extension { ref name, .. } => {
            assert_with_log!(
                name == "permessage-deflate",
                "tagged with extension name",
                "permessage-deflate",
                name
            );
        }
        other => panic!("expected extension error, got {other:?}"),
    }

    test_complete!("e2e_ws_008_deflate_corrupt_stream");
}

/// E2E-WS-009: RSV1 without a negotiated extension is a structural
/// error.
#[test]
fn e2e_ws_009_rsv1_without_extension() {
    init_test("e2e_ws_009_rsv1_without_extension");

    let mut driver = client_driver();
    driver.push(Segment::copy_from_slice(&build_frame(
        true, true, 0x1, None, b"x",
    )));

    let err = driver.poll_package().expect_err("reserved bits");
    assert_with_log!(
        matches!(err, ProtocolError::ReservedBitsSet),
        "reserved bits error",
        "ReservedBitsSet",
        err
    );

    test_complete!("e2e_ws_009_rsv1_without_extension");
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Chunk independence for a fragmented message: arbitrary splits of
    /// the wire bytes, including through frame headers, reassemble to
    /// the same single package.
    #[test]
    fn prop_ws_fragmentation_chunk_independence(
        cuts in proptest::collection::vec(0usize..40, 0..14),
    ) {
        init_test_logging();

        let mut wire = build_frame(false, false, 0x1, None, b"Hel");
        wire.extend_from_slice(&build_frame(false, false, 0x0, None, b"lo "));
        wire.extend_from_slice(&build_frame(true, false, 0x0, None, b"World"));

        let mut driver = client_driver();
        let mut packages = Vec::new();
        for chunk in split_at_cuts(&wire, &cuts) {
            driver.push(Segment::copy_from_slice(&chunk));
            while let Some(package) = driver.poll_package().expect("decode") {
                packages.push(package);
            }
        }

        prop_assert_eq!(packages.len(), 1);
        prop_assert_eq!(packages[0].message.as_text(), Some("Hello World"));
        prop_assert_eq!(driver.pending(), 0);
    }

    /// Chunk independence for a masked frame with a 16-bit extended
    /// length: splits through the length and mask-key stages decode
    /// identically.
    #[test]
    fn prop_ws_masked_extended_chunk_independence(
        cuts in proptest::collection::vec(0usize..220, 0..10),
    ) {
        init_test_logging();

        let payload: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let wire = build_frame(true, false, 0x2, Some([9, 8, 7, 6]), &payload);

        let mut driver = server_driver();
        let mut packages = Vec::new();
        for chunk in split_at_cuts(&wire, &cuts) {
            driver.push(Segment::copy_from_slice(&chunk));
            while let Some(package) = driver.poll_package().expect("decode") {
                packages.push(package);
            }
        }

        prop_assert_eq!(packages.len(), 1);
        prop_assert_eq!(packages[0].message.as_bytes(), &payload[..]);
    }

    /// Masking round trip over arbitrary payloads and keys.
    #[test]
    fn prop_ws_arbitrary_mask_round_trip(
        payload in proptest::collection::vec(any::<u8>(), 0..300),
        key in any::<[u8; 4]>(),
    ) {
        init_test_logging();

        let wire = build_frame(true, false, 0x2, Some(key), &payload);
        let mut driver = server_driver();
        driver.push(Segment::copy_from_slice(&wire));

        let package = driver.poll_package().expect("decode").expect("package");
        prop_assert_eq!(package.message.as_bytes(), &payload[..]);
    }
}

/// The WsMessage helpers expose text and raw views consistently.
#[test]
fn e2e_ws_010_message_views() {
    init_test("e2e_ws_010_message_views");

    let text = WsMessage::Text("abc".to_string());
    assert_eq!(text.as_text(), Some("abc"));
    assert_eq!(text.as_bytes(), b"abc");

    let binary = WsMessage::Binary(vec![1, 2, 3]);
    assert_eq!(binary.as_text(), None);
    assert_eq!(binary.as_bytes(), [1, 2, 3]);

    test_complete!("e2e_ws_010_message_views");
}
