//! Protocol-specific parser hooks consumed by the generic filters.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;

/// Turns the raw bytes of one framed message into a package.
///
/// Implemented per protocol and handed to the generic filters; the
/// filters find the message boundaries, the resolver gives the bytes
/// their protocol-specific shape.
pub trait PackageResolver {
    /// The package type this resolver produces.
    type Package;

    /// Resolves a complete message body into a package.
    ///
    /// `body` excludes any framing bytes (terminators, marks); it may
    /// span multiple segments.
    fn resolve(&mut self, body: &BufferSequence) -> Result<Self::Package, ProtocolError>;
}

/// Resolver for fixed-header protocols: derives the body length from
/// the header, then resolves header and body together.
pub trait HeaderPackageResolver {
    /// The package type this resolver produces.
    type Package;

    /// Derives the body length from a complete header.
    ///
    /// A negative return is a structural error; the filter rejects it
    /// as [`ProtocolError::InvalidBodyLength`] without calling
    /// [`resolve`](HeaderPackageResolver::resolve).
    fn body_length(&self, header: &BufferSequence) -> i64;

    /// Resolves a complete header plus body into a package.
    ///
    /// `body` is empty when the header declared a zero-length body.
    fn resolve(
        &mut self,
        header: &BufferSequence,
        body: &BufferSequence,
    ) -> Result<Self::Package, ProtocolError>;
}
