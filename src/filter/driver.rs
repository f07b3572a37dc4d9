//! Per-connection decode context.

use crate::buffer::{BufferSequence, Segment};
use crate::error::ProtocolError;
use crate::filter::contract::{BoxedFilter, Decoded, FilterState};
use tracing::trace;

/// Owns a connection's active filter and its retained unconsumed bytes,
/// and drives the two together.
///
/// The transport layer pushes each received chunk as a [`Segment`] and
/// then polls for packages. The driver presents the retained sequence
/// to the filter, trims the consumed prefix when a package completes,
/// and swaps in the next filter whenever the active one installs a
/// replacement — immediately re-presenting the retained bytes to the
/// new filter, which is what makes sniff-byte switching and
/// post-handshake switch-overs transparent to the caller.
///
/// One driver per connection; the decode path is synchronous and
/// CPU-bound, and never invoked concurrently.
pub struct FilterDriver<P> {
    filter: BoxedFilter<P>,
    buffer: BufferSequence,
}

impl<P> FilterDriver<P> {
    /// Creates a driver with the connection's initial filter.
    #[must_use]
    pub fn new(filter: BoxedFilter<P>) -> Self {
        Self {
            filter,
            buffer: BufferSequence::new(),
        }
    }

    /// Appends a newly received chunk.
    pub fn push(&mut self, segment: Segment) {
        self.buffer.push(segment);
    }

    /// Bytes currently retained and not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// State of the active filter.
    #[must_use]
    pub fn state(&self) -> FilterState {
        self.filter.state()
    }

    /// Attempts to decode the next package from the retained bytes.
    ///
    /// Returns `Ok(None)` when more data is needed; call again after
    /// the next [`push`](FilterDriver::push). Call repeatedly to drain
    /// multiple packages that arrived in one chunk. Errors are
    /// connection-fatal; no package is ever delivered for a message
    /// that failed structural validation.
    pub fn poll_package(&mut self) -> Result<Option<P>, ProtocolError> {
        loop {
            match self.filter.filter(&self.buffer)? {
                Some(Decoded { package, rest }) => {
                    let consumed = self.buffer.len() - rest;
                    self.buffer.advance(consumed);
                    trace!(consumed, rest, "package decoded");
                    if let Some(next) = self.filter.take_next_filter() {
                        trace!("filter switched after package");
                        self.filter = next;
                    }
                    return Ok(Some(package));
                }
                None => {
                    if let Some(next) = self.filter.take_next_filter() {
                        trace!(pending = self.buffer.len(), "filter switched");
                        self.filter = next;
                        // Re-present the retained bytes to the new filter.
                        continue;
                    }
                    return Ok(None);
                }
            }
        }
    }

    /// Discards all in-flight decode state: retained bytes are dropped
    /// and the active filter returns to its initial configuration.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.filter.reset();
    }
}

impl<P> std::fmt::Debug for FilterDriver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterDriver")
            .field("pending", &self.buffer.len())
            .field("state", &self.filter.state())
            .finish()
    }
}
