//! Decoded WebSocket packages.

use super::opcode::OpCode;

/// The materialized content of a WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// A text message, validated as UTF-8.
    Text(String),
    /// A binary message, or the raw payload of a control frame.
    Binary(Vec<u8>),
}

impl WsMessage {
    /// The text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// The raw bytes of the message, regardless of kind.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// One fully decoded WebSocket package: either a complete logical
/// message reassembled from one or more frames, or a single control
/// frame.
///
/// For a fragmented message the frame-level fields describe the
/// message as a whole: `op_code` is the initial data frame's opcode
/// (never `Continuation`), `fin` is always true, `payload_length` is
/// the total wire payload across all fragments (before any extension
/// transform), and `has_mask`/`mask_key` come from the final frame.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)] // RFC 6455 exposes these as independent header bits.
pub struct WebSocketPackage {
    /// Message opcode.
    pub op_code: OpCode,
    /// Final-fragment flag; always true on a delivered package.
    pub fin: bool,
    /// Reserved bit 1, the compression-extension flag. Cleared by an
    /// extension that consumed it (e.g. after inflating).
    pub rsv1: bool,
    /// Reserved bit 2.
    pub rsv2: bool,
    /// Reserved bit 3.
    pub rsv3: bool,
    /// Total wire payload bytes, before extension transforms.
    pub payload_length: u64,
    /// Whether the (final) frame carried a mask.
    pub has_mask: bool,
    /// The 4-byte XOR mask key, if masked.
    pub mask_key: Option<[u8; 4]>,
    /// The materialized message content.
    pub message: WsMessage,
}

impl WebSocketPackage {
    /// Returns true if this package is a control frame.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        self.op_code.is_control()
    }
}

/// A fully reassembled message as seen by extensions: after fragment
/// flattening, before text/binary materialization.
///
/// Extensions may rewrite `payload` in place and clear the reserved
/// bit they consumed.
#[derive(Debug)]
pub struct AssembledMessage {
    /// Message opcode (`Text` or `Binary`).
    pub op_code: OpCode,
    /// Reserved bit 1 from the initial frame.
    pub rsv1: bool,
    /// Reserved bit 2 from the initial frame.
    pub rsv2: bool,
    /// Reserved bit 3 from the initial frame.
    pub rsv3: bool,
    /// The reassembled payload, engine-owned.
    pub payload: Vec<u8>,
}
