//! Per-message extension hook.

use super::package::AssembledMessage;
use crate::error::ExtensionError;

/// A boxed extension, the form in which a connection carries its
/// negotiated extension pipeline.
pub type BoxedExtension = Box<dyn WebSocketExtension + Send>;

/// A named, handshake-negotiated transform applied to fully assembled
/// messages.
///
/// The decoder invokes [`decode`](WebSocketExtension::decode) on every
/// registered extension, in negotiated order, strictly after fragment
/// reassembly and before the payload is materialized as text or
/// binary. [`encode`](WebSocketExtension::encode) is the outbound
/// mirror, applied by an encoder before a message is framed.
///
/// Extensions are resolved once at handshake time and stored
/// per-connection; failures are tagged with the extension's
/// [`name`](WebSocketExtension::name) and are fatal for the
/// connection, never a panic.
pub trait WebSocketExtension {
    /// The extension token used during handshake negotiation.
    fn name(&self) -> &str;

    /// Transforms an inbound message in place (e.g. inflate).
    fn decode(&mut self, message: &mut AssembledMessage) -> Result<(), ExtensionError>;

    /// Transforms an outbound message in place (e.g. deflate).
    fn encode(&mut self, message: &mut AssembledMessage) -> Result<(), ExtensionError>;
}
