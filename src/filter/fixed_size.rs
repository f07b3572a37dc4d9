//! Filter for packages of a fixed byte size.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::contract::{Decoded, Filter, FilterState};
use crate::filter::resolver::PackageResolver;

/// Decodes packages that are always exactly `size` bytes.
///
/// Accumulation is the caller's job (the driver retains unconsumed
/// bytes and re-presents the union), so this filter only has to split
/// at the size boundary and hand the prefix to its resolver.
#[derive(Debug)]
pub struct FixedSizeFilter<R> {
    size: usize,
    resolver: R,
    state: FilterState,
}

impl<R> FixedSizeFilter<R> {
    /// Creates a filter for packages of exactly `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize, resolver: R) -> Self {
        assert!(size > 0, "fixed package size must be positive");
        Self {
            size,
            resolver,
            state: FilterState::Normal,
        }
    }

    /// The fixed package size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl<R: PackageResolver> Filter for FixedSizeFilter<R> {
    type Package = R::Package;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<Self::Package>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }
        if data.len() < self.size {
            return Ok(None);
        }

        let body = data.slice(0, self.size);
        match self.resolver.resolve(&body) {
            Ok(package) => Ok(Some(Decoded {
                package,
                rest: data.len() - self.size,
            })),
            Err(e) => {
                self.state = FilterState::Error;
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }
}
