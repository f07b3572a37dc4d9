//! The contract every decoding strategy implements.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;

/// Externally visible filter state.
///
/// Filters with multi-step internal logic (header-then-body, frame
/// stages) track their progress with private fields; the public state
/// only distinguishes a healthy filter from one that detected malformed
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterState {
    /// Ready to accept more data.
    #[default]
    Normal,
    /// Malformed input detected; terminal until [`Filter::reset`].
    Error,
}

/// A completed package together with the count of trailing bytes that
/// were presented but belong to the next message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<P> {
    /// The decoded package.
    pub package: P,
    /// Unconsumed trailing bytes the caller must re-present next call.
    pub rest: usize,
}

/// A boxed filter, the form in which filters are chained and swapped.
pub type BoxedFilter<P> = Box<dyn Filter<Package = P> + Send>;

/// A stateful decoder for one protocol's framing rules.
///
/// The engine invokes [`filter`](Filter::filter) once per "new data
/// available" event with *all* bytes currently unconsumed for the
/// connection: the retained tail from the previous call concatenated
/// with newly arrived segments. The filter either produces a completed
/// package plus a leftover-byte count, or signals that it needs more
/// data by returning `Ok(None)` — in which case the caller retains the
/// presented bytes and re-invokes with the union of old and new.
///
/// Structural errors are terminal: the filter latches
/// [`FilterState::Error`] and every further call fails with
/// [`ProtocolError::Poisoned`] until [`reset`](Filter::reset).
///
/// A filter may install a different filter for the subsequent decode
/// step via [`take_next_filter`](Filter::take_next_filter) — the
/// mechanism behind protocol sniffing and post-handshake switch-overs.
pub trait Filter {
    /// The decoded, protocol-specific output object.
    type Package;

    /// Attempts to decode one package from the presented bytes.
    ///
    /// - `Ok(Some(decoded))`: one package completed; `decoded.rest`
    ///   trailing bytes were not consumed and belong to the next
    ///   message.
    /// - `Ok(None)`: insufficient data; the caller must retain all
    ///   presented bytes and re-invoke once more data arrives.
    /// - `Err(_)`: structural protocol error, fatal for the connection.
    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<Self::Package>>, ProtocolError>;

    /// Returns internal state to the filter's initial configuration.
    ///
    /// Used when a pooled filter object is attached to a new
    /// connection, or when a higher layer discards in-flight decode
    /// state after a recoverable protocol violation.
    fn reset(&mut self);

    /// Current externally visible state.
    fn state(&self) -> FilterState;

    /// Takes the filter to use for the subsequent decode call, if this
    /// filter installed one.
    ///
    /// The default implementation never switches.
    fn take_next_filter(&mut self) -> Option<BoxedFilter<Self::Package>> {
        None
    }
}
