//! WebSocket frame decoding according to RFC 6455.
//!
//! The frame decoder is a chained four-stage state machine layered on
//! the filter contract: fixed part (2 bytes) → extended length (0, 2 or
//! 8 bytes) → mask key (0 or 4 bytes) → payload. On top of per-frame
//! decoding it handles fragmentation (continuation frames accumulate
//! until FIN) and pluggable per-message extensions such as
//! permessage-deflate compression.
//!
//! # Frame Format (RFC 6455 Section 5.2)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data (continued)                  |
//! +---------------------------------------------------------------+
//! ```

pub mod deflate;
pub mod extension;
pub mod filter;
pub mod opcode;
pub mod package;

pub use deflate::PerMessageDeflate;
pub use extension::{BoxedExtension, WebSocketExtension};
pub use filter::{apply_mask, WebSocketFilter};
pub use opcode::OpCode;
pub use package::{AssembledMessage, WebSocketPackage, WsMessage};
