//! Error types for the decoding engine.
//!
//! The engine distinguishes two outcomes that are not errors at all —
//! a completed package and "need more data" — from structural protocol
//! violations, which are fatal for the connection. Only the latter are
//! represented here. "Need more data" is `Ok(None)` on the filter
//! contract, never an error value.

/// Error raised by a WebSocket extension while transforming a message.
///
/// Extensions report failures (for example a corrupt compressed stream)
/// through this type; the engine tags them with the extension's name
/// before propagating them as [`ProtocolError::Extension`].
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ExtensionError(String);

impl ExtensionError {
    /// Creates an extension error from any displayable cause.
    pub fn new(cause: impl std::fmt::Display) -> Self {
        Self(cause.to_string())
    }
}

/// Structural protocol error detected while decoding.
///
/// Every variant is terminal for the connection: the filter that raised
/// it latches [`FilterState::Error`](crate::filter::FilterState::Error)
/// and refuses further input until [`reset`](crate::filter::Filter::reset).
/// No package is ever delivered for a message that failed structural
/// validation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A fixed-header package declared a negative body length.
    #[error("declared body length {0} is invalid")]
    InvalidBodyLength(i64),

    /// A package exceeded the configured maximum size.
    #[error("package too large: {size} bytes (max: {max})")]
    PackageTooLarge {
        /// Declared or accumulated package size in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: usize,
    },

    /// The leading byte matched none of the registered sub-filters.
    #[error("unrecognized sniff byte: 0x{0:02X}")]
    UnknownSniffByte(u8),

    /// The stream did not start with the expected begin mark.
    #[error("begin mark mismatch")]
    BadBeginMark,

    /// Invalid WebSocket opcode value.
    #[error("invalid opcode: 0x{0:X}")]
    InvalidOpcode(u8),

    /// A control frame arrived with the FIN bit clear.
    #[error("control frame cannot be fragmented")]
    FragmentedControlFrame,

    /// A control frame carried more than 125 payload bytes.
    #[error("control frame payload too large: {0} bytes (max: 125)")]
    ControlFrameTooLarge(usize),

    /// A frame arrived unmasked on a connection that requires masking.
    #[error("frame must be masked")]
    UnmaskedFrame,

    /// Reserved header bits were set without a negotiated extension.
    #[error("reserved bits set without extension")]
    ReservedBitsSet,

    /// Frame sequencing violation (fragmentation rules).
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// A text message payload was not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    /// A registered extension failed to transform the message.
    #[error("extension {name} failed: {source}")]
    Extension {
        /// Negotiated name of the failing extension.
        name: String,
        /// The extension's own failure.
        #[source]
        source: ExtensionError,
    },

    /// The filter already reported a structural error and was not reset.
    #[error("filter is in error state")]
    Poisoned,
}
