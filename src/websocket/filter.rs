//! The four-stage WebSocket frame filter.

use super::extension::BoxedExtension;
use super::opcode::OpCode;
use super::package::{AssembledMessage, WebSocketPackage, WsMessage};
use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::{Decoded, Filter, FilterState};

/// Default maximum payload size for one logical message (16 MB).
const DEFAULT_MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Apply XOR masking to payload data.
///
/// Used for both masking and unmasking; the key cycles every 4 bytes.
/// The engine only ever calls this on its own copies, never on
/// segments still owned by the transport.
pub fn apply_mask(payload: &mut [u8], mask_key: [u8; 4]) {
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte ^= mask_key[i % 4];
    }
}

/// Header fields accumulated across the first three stages of a frame.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)] // RFC 6455 exposes these as independent header bits.
struct FrameHeader {
    fin: bool,
    rsv1: bool,
    rsv2: bool,
    rsv3: bool,
    opcode: OpCode,
    masked: bool,
    mask_key: Option<[u8; 4]>,
    payload_len: u64,
}

/// Decode stage for the frame state machine.
///
/// Stages advance by assignment; each carries the header parsed so
/// far. This replaces chained part-reader objects with a flat finite
/// state machine.
#[derive(Debug, Clone, Copy)]
enum FrameStage {
    /// Waiting for the first 2 header bytes.
    FixedPart,
    /// Reading the 2- or 8-byte extended payload length.
    ExtendedLength { header: FrameHeader, width: usize },
    /// Reading the 4-byte mask key.
    MaskKey { header: FrameHeader },
    /// Waiting for `payload_len` payload bytes.
    Payload { header: FrameHeader },
}

/// Fragment accumulator for a logical message in flight.
///
/// Non-empty only while assembling a fragmented message; cleared the
/// instant the final fragment completes.
#[derive(Debug, Default)]
struct FragmentAccumulator {
    /// Opcode of the initial data frame; `Some` marks an active
    /// accumulation.
    opcode: Option<OpCode>,
    rsv1: bool,
    parts: Vec<Vec<u8>>,
    total: usize,
}

impl FragmentAccumulator {
    const fn is_active(&self) -> bool {
        self.opcode.is_some()
    }

    fn begin(&mut self, opcode: OpCode, rsv1: bool, payload: Vec<u8>) {
        self.opcode = Some(opcode);
        self.rsv1 = rsv1;
        self.total = payload.len();
        self.parts.push(payload);
    }

    fn append(&mut self, payload: Vec<u8>) {
        self.total += payload.len();
        self.parts.push(payload);
    }

    /// Flattens all fragments into one contiguous buffer and clears
    /// the accumulator.
    fn take(&mut self) -> (OpCode, bool, Vec<u8>, usize) {
        let opcode = self.opcode.take().unwrap_or(OpCode::Binary);
        let rsv1 = self.rsv1;
        let total = self.total;
        let mut flat = Vec::with_capacity(total);
        for part in self.parts.drain(..) {
            flat.extend_from_slice(&part);
        }
        self.rsv1 = false;
        self.total = 0;
        (opcode, rsv1, flat, total)
    }

    fn clear(&mut self) {
        self.opcode = None;
        self.rsv1 = false;
        self.parts.clear();
        self.total = 0;
    }
}

/// Decodes WebSocket frames into [`WebSocketPackage`]s.
///
/// Implements the filter contract over the RFC 6455 wire format:
/// resumable at any byte boundary, strict structural validation, frame
/// fragmentation with a fragment accumulator, interleaved control
/// frames, and a per-connection extension pipeline.
///
/// The filter tracks how far into the retained byte sequence it has
/// decoded, so the caller's retain-and-re-present contract never
/// re-parses frames of an in-flight fragmented message.
pub struct WebSocketFilter {
    stage: FrameStage,
    /// Bytes of the retained sequence already decoded into frames that
    /// did not yet complete a logical message.
    consumed: usize,
    require_mask: bool,
    max_payload_size: usize,
    extensions: Vec<BoxedExtension>,
    fragments: FragmentAccumulator,
    state: FilterState,
}

impl WebSocketFilter {
    /// Creates a server-side filter: inbound frames must be masked
    /// (RFC 6455 §5.1, client-to-server).
    #[must_use]
    pub fn server() -> Self {
        Self::new(true)
    }

    /// Creates a client-side filter: inbound frames are unmasked.
    #[must_use]
    pub fn client() -> Self {
        Self::new(false)
    }

    fn new(require_mask: bool) -> Self {
        Self {
            stage: FrameStage::FixedPart,
            consumed: 0,
            require_mask,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            extensions: Vec::new(),
            fragments: FragmentAccumulator::default(),
            state: FilterState::Normal,
        }
    }

    /// Sets the maximum payload size for one logical message.
    #[must_use]
    pub fn max_payload_size(mut self, max: usize) -> Self {
        self.max_payload_size = max;
        self
    }

    /// Overrides the masking requirement.
    #[must_use]
    pub fn require_mask(mut self, require: bool) -> Self {
        self.require_mask = require;
        self
    }

    /// Appends a handshake-negotiated extension to the pipeline.
    ///
    /// Extensions run in registration order on every completed
    /// message. Registering any extension permits the RSV1 bit on
    /// initial data frames.
    #[must_use]
    pub fn extension(mut self, extension: BoxedExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    fn fail<T>(&mut self, error: ProtocolError) -> Result<T, ProtocolError> {
        self.state = FilterState::Error;
        Err(error)
    }

    fn suspend<T>(&mut self, position: usize) -> Result<Option<T>, ProtocolError> {
        self.consumed = position;
        Ok(None)
    }

    fn check_payload_len(&mut self, len: u64) -> Result<(), ProtocolError> {
        if len > self.max_payload_size as u64 {
            let max = self.max_payload_size;
            self.fail(ProtocolError::PackageTooLarge { size: len, max })
        } else {
            Ok(())
        }
    }

    /// Stage after the payload length is fully known.
    const fn stage_after_length(header: FrameHeader) -> FrameStage {
        if header.masked {
            FrameStage::MaskKey { header }
        } else {
            FrameStage::Payload { header }
        }
    }
}

impl std::fmt::Debug for WebSocketFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketFilter")
            .field("stage", &self.stage)
            .field("consumed", &self.consumed)
            .field("fragments_active", &self.fragments.is_active())
            .field("state", &self.state)
            .finish()
    }
}

impl Filter for WebSocketFilter {
    type Package = WebSocketPackage;

    #[allow(clippy::too_many_lines)] // Single, explicit RFC 6455 decode state machine.
    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<WebSocketPackage>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }

        let mut pos = self.consumed;
        loop {
            match self.stage {
                FrameStage::FixedPart => {
                    if data.len() - pos < 2 {
                        return self.suspend(pos);
                    }

                    let first_byte = data.byte_at(pos);
                    let second_byte = data.byte_at(pos + 1);

                    let fin = (first_byte & 0x80) != 0;
                    let rsv1 = (first_byte & 0x40) != 0;
                    let rsv2 = (first_byte & 0x20) != 0;
                    let rsv3 = (first_byte & 0x10) != 0;
                    let opcode_raw = first_byte & 0x0F;
                    let masked = (second_byte & 0x80) != 0;
                    let payload_len_7 = second_byte & 0x7F;

                    let opcode = match OpCode::from_u8(opcode_raw) {
                        Ok(op) => op,
                        Err(e) => return self.fail(e),
                    };

                    // RSV1 is the compression flag; it is only legal on
                    // the initial data frame of a message, and only when
                    // an extension was negotiated. RSV2/3 have no
                    // negotiated meaning here.
                    if rsv2 || rsv3 {
                        return self.fail(ProtocolError::ReservedBitsSet);
                    }
                    if rsv1
                        && (self.extensions.is_empty()
                            || !matches!(opcode, OpCode::Text | OpCode::Binary))
                    {
                        return self.fail(ProtocolError::ReservedBitsSet);
                    }

                    if self.require_mask && !masked {
                        return self.fail(ProtocolError::UnmaskedFrame);
                    }

                    if opcode.is_control() {
                        if !fin {
                            return self.fail(ProtocolError::FragmentedControlFrame);
                        }
                        if payload_len_7 > 125 {
                            return self
                                .fail(ProtocolError::ControlFrameTooLarge(payload_len_7 as usize));
                        }
                    }

                    pos += 2;
                    let header = FrameHeader {
                        fin,
                        rsv1,
                        rsv2,
                        rsv3,
                        opcode,
                        masked,
                        mask_key: None,
                        payload_len: u64::from(payload_len_7),
                    };

                    match payload_len_7 {
                        126 => self.stage = FrameStage::ExtendedLength { header, width: 2 },
                        127 => self.stage = FrameStage::ExtendedLength { header, width: 8 },
                        _ => {
                            self.check_payload_len(header.payload_len)?;
                            self.stage = Self::stage_after_length(header);
                        }
                    }
                }

                FrameStage::ExtendedLength { mut header, width } => {
                    if data.len() - pos < width {
                        return self.suspend(pos);
                    }

                    let mut reader = data.reader_at(pos);
                    let payload_len = if width == 2 {
                        match reader.read_u16_be() {
                            Some(len) => u64::from(len),
                            None => unreachable!("length checked above"),
                        }
                    } else {
                        match reader.read_u64_be() {
                            Some(len) => len,
                            None => unreachable!("length checked above"),
                        }
                    };

                    // RFC 6455 §5.2: the most significant bit of the
                    // 64-bit length must be zero.
                    if width == 8 && payload_len & (1 << 63) != 0 {
                        return self.fail(ProtocolError::ProtocolViolation(
                            "64-bit payload length must not set the most significant bit",
                        ));
                    }
                    self.check_payload_len(payload_len)?;

                    pos += width;
                    header.payload_len = payload_len;
                    self.stage = Self::stage_after_length(header);
                }

                FrameStage::MaskKey { mut header } => {
                    if data.len() - pos < 4 {
                        return self.suspend(pos);
                    }

                    let mut mask_key = [0u8; 4];
                    let mut reader = data.reader_at(pos);
                    if reader.read_exact(&mut mask_key).is_none() {
                        unreachable!("mask key bytes checked above");
                    }

                    pos += 4;
                    header.mask_key = Some(mask_key);
                    self.stage = FrameStage::Payload { header };
                }

                FrameStage::Payload { header } => {
                    // Length was validated against max_payload_size,
                    // which is a usize, so this cast cannot truncate.
                    let payload_len = header.payload_len as usize;
                    if data.len() - pos < payload_len {
                        return self.suspend(pos);
                    }

                    // Copy out of the shared sequence; masking mutates
                    // only this engine-owned copy.
                    let mut payload = data.copy_range_to_vec(pos, payload_len);
                    if let Some(key) = header.mask_key {
                        apply_mask(&mut payload, key);
                    }
                    pos += payload_len;
                    self.stage = FrameStage::FixedPart;

                    if header.opcode.is_control() {
                        // Control frames pass through even between
                        // fragments of a data message, without touching
                        // the accumulator.
                        let package = WebSocketPackage {
                            op_code: header.opcode,
                            fin: true,
                            rsv1: header.rsv1,
                            rsv2: header.rsv2,
                            rsv3: header.rsv3,
                            payload_length: header.payload_len,
                            has_mask: header.masked,
                            mask_key: header.mask_key,
                            message: WsMessage::Binary(payload),
                        };
                        self.consumed = 0;
                        return Ok(Some(Decoded {
                            package,
                            rest: data.len() - pos,
                        }));
                    }

                    if header.opcode == OpCode::Continuation && !self.fragments.is_active() {
                        return self.fail(ProtocolError::ProtocolViolation(
                            "continuation frame without a message in progress",
                        ));
                    }
                    if header.opcode != OpCode::Continuation && self.fragments.is_active() {
                        return self.fail(ProtocolError::ProtocolViolation(
                            "new data frame while a fragmented message is in progress",
                        ));
                    }

                    if !header.fin {
                        // A zero-length non-final frame still opens or
                        // extends the fragmented message.
                        if self.fragments.is_active() {
                            self.fragments.append(payload);
                        } else {
                            self.fragments.begin(header.opcode, header.rsv1, payload);
                        }
                        if self.fragments.total > self.max_payload_size {
                            let size = self.fragments.total as u64;
                            let max = self.max_payload_size;
                            return self.fail(ProtocolError::PackageTooLarge { size, max });
                        }
                        // The logical message is still incomplete; keep
                        // decoding, the next frame may already be here.
                        continue;
                    }

                    let (op_code, rsv1, payload, wire_len) = if self.fragments.is_active() {
                        self.fragments.append(payload);
                        if self.fragments.total > self.max_payload_size {
                            let size = self.fragments.total as u64;
                            let max = self.max_payload_size;
                            return self.fail(ProtocolError::PackageTooLarge { size, max });
                        }
                        self.fragments.take()
                    } else {
                        (header.opcode, header.rsv1, payload, payload_len)
                    };

                    let mut assembled = AssembledMessage {
                        op_code,
                        rsv1,
                        rsv2: header.rsv2,
                        rsv3: header.rsv3,
                        payload,
                    };
                    let mut extension_failure = None;
                    for extension in &mut self.extensions {
                        if let Err(source) = extension.decode(&mut assembled) {
                            let name = extension.name().to_string();
                            extension_failure = Some(ProtocolError::Extension { name, source });
                            break;
                        }
                    }
                    if let Some(error) = extension_failure {
                        return self.fail(error);
                    }

                    let message = match op_code {
                        OpCode::Text => match String::from_utf8(assembled.payload) {
                            Ok(text) => WsMessage::Text(text),
                            Err(_) => return self.fail(ProtocolError::InvalidUtf8),
                        },
                        _ => WsMessage::Binary(assembled.payload),
                    };

                    let package = WebSocketPackage {
                        op_code,
                        fin: true,
                        rsv1: assembled.rsv1,
                        rsv2: assembled.rsv2,
                        rsv3: assembled.rsv3,
                        payload_length: wire_len as u64,
                        has_mask: header.masked,
                        mask_key: header.mask_key,
                        message,
                    };
                    self.consumed = 0;
                    return Ok(Some(Decoded {
                        package,
                        rest: data.len() - pos,
                    }));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.stage = FrameStage::FixedPart;
        self.consumed = 0;
        self.fragments.clear();
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }
}
