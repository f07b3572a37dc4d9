//! Sockfilter: incremental package decoding filters for socket servers.
//!
//! # Overview
//!
//! A connection's bytes arrive as arbitrarily sized, arbitrarily
//! aligned chunks relative to message boundaries. Sockfilter turns that
//! stream into discrete application-level packages without ever
//! requiring a full message to arrive in one read, and without copying
//! the unread trailing bytes of a chunk. Every decoding strategy is a
//! resumable state machine behind one contract, so strategies can be
//! swapped per connection and even mid-stream (protocol sniffing,
//! post-handshake WebSocket switch-over).
//!
//! # Core Guarantees
//!
//! - **Chunk independence**: splitting a message at any byte boundary,
//!   down to one-byte chunks, yields the same packages as one read
//! - **No trailing copies**: unconsumed bytes are retained as shared
//!   segment handles and re-presented, never copied
//! - **Typed structural errors**: malformed input latches the filter
//!   and surfaces as a typed error; no package is ever delivered for a
//!   message that failed validation
//! - **Single ownership**: one filter chain per connection, no shared
//!   state, synchronous CPU-bound decoding
//!
//! # Module Structure
//!
//! - [`buffer`]: shared byte segments, discontiguous sequences, and
//!   the cross-segment scanning cursor
//! - [`filter`]: the filter contract, the primitive filters
//!   (fixed-size, fixed-header, terminator, begin/end-mark, sniff-byte
//!   switching) and the per-connection driver
//! - [`websocket`]: the four-stage RFC 6455 frame decoder with
//!   fragmentation and per-message extensions
//! - [`error`]: structural error types
//!
//! # Example
//!
//! ```
//! use sockfilter::buffer::Segment;
//! use sockfilter::filter::{CommandResolver, FilterDriver, TerminatorFilter};
//!
//! let filter = TerminatorFilter::new(b"##", CommandResolver);
//! let mut driver = FilterDriver::new(Box::new(filter));
//!
//! // Chunks need not align with package boundaries.
//! driver.push(Segment::from_static(b"ECHO he"));
//! assert!(driver.poll_package().unwrap().is_none());
//!
//! driver.push(Segment::from_static(b"llo##"));
//! let package = driver.poll_package().unwrap().unwrap();
//! assert_eq!(package.key, "ECHO");
//! assert_eq!(package.body, "hello");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod buffer;
pub mod error;
pub mod filter;
pub mod test_utils;
pub mod websocket;

// Re-exports for convenient access to core types
pub use buffer::{BufferSequence, Segment, SequenceReader};
pub use error::{ExtensionError, ProtocolError};
pub use filter::{
    BeginEndMarkFilter, BoxedFilter, CommandPackage, CommandResolver, Decoded, Filter,
    FilterDriver, FilterState, FixedHeaderFilter, FixedSizeFilter, HeaderPackageResolver,
    MarkSearcher, PackageResolver, SwitchBack, SwitcherFilter, TerminatorFilter,
};
pub use websocket::{
    apply_mask, AssembledMessage, OpCode, PerMessageDeflate, WebSocketExtension, WebSocketFilter,
    WebSocketPackage, WsMessage,
};
