//! Permessage-deflate extension (RFC 7692).

use super::extension::WebSocketExtension;
use super::opcode::OpCode;
use super::package::AssembledMessage;
use crate::error::ExtensionError;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

const EXT_NAME: &str = "permessage-deflate";

/// The deflate stream trailer stripped from outbound messages and
/// restored before inflating inbound ones (RFC 7692 §7.2.1).
const SYNC_FLUSH_TRAILER: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

/// Per-message compression via raw deflate.
///
/// A compressed message sets RSV1 on its initial frame; on decode the
/// extension inflates the reassembled payload and clears the bit. By
/// default the compression context is carried across messages
/// ("context takeover"); [`no_context_takeover`] resets both streams
/// after every message.
///
/// [`no_context_takeover`]: PerMessageDeflate::no_context_takeover
pub struct PerMessageDeflate {
    compress: Compress,
    decompress: Decompress,
    compress_reset: bool,
    decompress_reset: bool,
}

impl PerMessageDeflate {
    /// Creates the extension with the given compression level and
    /// context takeover on both directions.
    #[must_use]
    pub fn new(level: Compression) -> Self {
        Self {
            compress: Compress::new(level, false),
            decompress: Decompress::new(false),
            compress_reset: false,
            decompress_reset: false,
        }
    }

    /// Resets both deflate contexts after every message, trading
    /// compression ratio for bounded memory.
    #[must_use]
    pub fn no_context_takeover(mut self) -> Self {
        self.compress_reset = true;
        self.decompress_reset = true;
        self
    }

    fn inflate(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), ExtensionError> {
        let mut offset = 0;
        loop {
            if output.len() == output.capacity() {
                output.reserve(input.len().max(512));
            }
            let before_in = self.decompress.total_in();
            let before_out = self.decompress.total_out();
            let status = self
                .decompress
                .decompress_vec(&input[offset..], output, FlushDecompress::Sync)
                .map_err(ExtensionError::new)?;
            offset += usize::try_from(self.decompress.total_in() - before_in)
                .map_err(ExtensionError::new)?;
            let produced = self.decompress.total_out() - before_out;

            match status {
                Status::StreamEnd => return Ok(()),
                Status::Ok | Status::BufError => {
                    if offset >= input.len() && produced == 0 {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn deflate(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<(), ExtensionError> {
        let mut offset = 0;
        loop {
            if output.len() == output.capacity() {
                output.reserve(input.len().max(512));
            }
            let before_in = self.compress.total_in();
            let before_out = self.compress.total_out();
            let status = self
                .compress
                .compress_vec(&input[offset..], output, FlushCompress::Sync)
                .map_err(ExtensionError::new)?;
            offset += usize::try_from(self.compress.total_in() - before_in)
                .map_err(ExtensionError::new)?;
            let produced = self.compress.total_out() - before_out;

            match status {
                Status::StreamEnd => return Ok(()),
                Status::Ok | Status::BufError => {
                    if offset >= input.len() && produced == 0 {
                        return Ok(());
                    }
                }
            }
        }
    }
}

impl Default for PerMessageDeflate {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl std::fmt::Debug for PerMessageDeflate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerMessageDeflate")
            .field("compress_reset", &self.compress_reset)
            .field("decompress_reset", &self.decompress_reset)
            .finish()
    }
}

impl WebSocketExtension for PerMessageDeflate {
    fn name(&self) -> &str {
        EXT_NAME
    }

    fn decode(&mut self, message: &mut AssembledMessage) -> Result<(), ExtensionError> {
        if !message.rsv1 {
            return Ok(());
        }

        // Restore the trailer the sender stripped, then inflate.
        let mut input = std::mem::take(&mut message.payload);
        input.extend_from_slice(&SYNC_FLUSH_TRAILER);

        let mut output = Vec::with_capacity(input.len() * 2);
        self.inflate(&input, &mut output)?;

        message.payload = output;
        message.rsv1 = false;

        if self.decompress_reset {
            self.decompress.reset(false);
        }
        Ok(())
    }

    fn encode(&mut self, message: &mut AssembledMessage) -> Result<(), ExtensionError> {
        if !matches!(message.op_code, OpCode::Text | OpCode::Binary) {
            return Ok(());
        }

        let input = std::mem::take(&mut message.payload);
        let mut output = Vec::with_capacity(input.len() / 2 + 64);
        self.deflate(&input, &mut output)?;

        // A sync flush always ends with the empty stored block; strip
        // it, the decoder restores it.
        if output.ends_with(&SYNC_FLUSH_TRAILER) {
            output.truncate(output.len() - SYNC_FLUSH_TRAILER.len());
        }

        message.payload = output;
        message.rsv1 = true;

        if self.compress_reset {
            self.compress.reset();
        }
        Ok(())
    }
}
