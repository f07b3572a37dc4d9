//! Filter for length-prefixed (fixed-header) packages.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::contract::{Decoded, Filter, FilterState};
use crate::filter::resolver::HeaderPackageResolver;

/// Default cap on `header + body` size (8 MB).
const DEFAULT_MAX_PACKAGE_SIZE: usize = 8 * 1024 * 1024;

/// Decodes packages framed as a fixed-size header followed by a body
/// whose length is derived from that header.
///
/// A two-phase refinement of the fixed-size filter: the first phase
/// waits for `header_size` bytes and asks the resolver for the body
/// length; the second phase waits for `header_size + body_length` total
/// and resolves header and body together. The derived length is
/// validated once, when the header completes, and cached across
/// "need more data" round trips.
#[derive(Debug)]
pub struct FixedHeaderFilter<R> {
    header_size: usize,
    max_package_size: usize,
    /// Body length derived from a completed header; `None` while the
    /// header itself is still arriving.
    body_length: Option<usize>,
    resolver: R,
    state: FilterState,
}

impl<R> FixedHeaderFilter<R> {
    /// Creates a filter with a `header_size`-byte header and the
    /// default package size cap.
    ///
    /// # Panics
    ///
    /// Panics if `header_size` is zero.
    pub fn new(header_size: usize, resolver: R) -> Self {
        assert!(header_size > 0, "header size must be positive");
        Self {
            header_size,
            max_package_size: DEFAULT_MAX_PACKAGE_SIZE,
            body_length: None,
            resolver,
            state: FilterState::Normal,
        }
    }

    /// Sets the maximum allowed `header + body` size.
    #[must_use]
    pub fn max_package_size(mut self, max: usize) -> Self {
        self.max_package_size = max;
        self
    }

    /// The fixed header size in bytes.
    #[must_use]
    pub const fn header_size(&self) -> usize {
        self.header_size
    }

    fn fail<T>(&mut self, error: ProtocolError) -> Result<T, ProtocolError> {
        self.state = FilterState::Error;
        Err(error)
    }
}

impl<R: HeaderPackageResolver> Filter for FixedHeaderFilter<R> {
    type Package = R::Package;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<Self::Package>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }

        let body_length = match self.body_length {
            Some(len) => len,
            None => {
                if data.len() < self.header_size {
                    return Ok(None);
                }
                let header = data.slice(0, self.header_size);
                let declared = self.resolver.body_length(&header);
                if declared < 0 {
                    return self.fail(ProtocolError::InvalidBodyLength(declared));
                }
                let Ok(len) = usize::try_from(declared) else {
                    return self.fail(ProtocolError::InvalidBodyLength(declared));
                };
                let total = self.header_size as u64 + len as u64;
                if total > self.max_package_size as u64 {
                    return self.fail(ProtocolError::PackageTooLarge {
                        size: total,
                        max: self.max_package_size,
                    });
                }
                self.body_length = Some(len);
                len
            }
        };

        let total = self.header_size + body_length;
        if data.len() < total {
            return Ok(None);
        }

        let header = data.slice(0, self.header_size);
        let body = data.slice(self.header_size, body_length);
        match self.resolver.resolve(&header, &body) {
            Ok(package) => {
                self.body_length = None;
                Ok(Some(Decoded {
                    package,
                    rest: data.len() - total,
                }))
            }
            Err(e) => self.fail(e),
        }
    }

    fn reset(&mut self) {
        self.body_length = None;
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }
}
