//! Filter for packages framed by a begin mark and an end mark.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::contract::{Decoded, Filter, FilterState};
use crate::filter::resolver::PackageResolver;
use crate::filter::terminator::MarkSearcher;

/// Decodes packages framed as `begin-mark body end-mark`.
///
/// The stream must open with the begin mark — any other leading bytes
/// are a structural error, there is no scanning for the start of a
/// package. The body handed to the resolver excludes both marks.
#[derive(Debug)]
pub struct BeginEndMarkFilter<R> {
    begin_mark: Vec<u8>,
    searcher: MarkSearcher,
    /// Count of begin-mark bytes verified so far.
    begin_verified: usize,
    /// Absolute position up to which the retained bytes were scanned
    /// for the end mark.
    scanned: usize,
    max_package_size: usize,
    resolver: R,
    state: FilterState,
}

impl<R> BeginEndMarkFilter<R> {
    /// Creates a filter with no package size limit.
    ///
    /// # Panics
    ///
    /// Panics if either mark is empty.
    #[must_use]
    pub fn new(begin_mark: &[u8], end_mark: &[u8], resolver: R) -> Self {
        Self::with_max_package_size(begin_mark, end_mark, usize::MAX, resolver)
    }

    /// Creates a filter that rejects packages exceeding `max` bytes
    /// before the end mark is seen.
    #[must_use]
    pub fn with_max_package_size(
        begin_mark: &[u8],
        end_mark: &[u8],
        max: usize,
        resolver: R,
    ) -> Self {
        assert!(!begin_mark.is_empty(), "begin mark must not be empty");
        Self {
            begin_mark: begin_mark.to_vec(),
            searcher: MarkSearcher::new(end_mark),
            begin_verified: 0,
            scanned: 0,
            max_package_size: max,
            resolver,
            state: FilterState::Normal,
        }
    }

    fn fail<T>(&mut self, error: ProtocolError) -> Result<T, ProtocolError> {
        self.state = FilterState::Error;
        Err(error)
    }
}

impl<R: PackageResolver> Filter for BeginEndMarkFilter<R> {
    type Package = R::Package;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<Self::Package>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }

        // Verify the begin mark incrementally; a mismatch anywhere in
        // the mark region is terminal.
        while self.begin_verified < self.begin_mark.len() {
            if self.begin_verified >= data.len() {
                return Ok(None);
            }
            if data.byte_at(self.begin_verified) != self.begin_mark[self.begin_verified] {
                return self.fail(ProtocolError::BadBeginMark);
            }
            self.begin_verified += 1;
        }

        if self.scanned < self.begin_mark.len() {
            self.scanned = self.begin_mark.len();
        }

        let mut reader = data.reader_at(self.scanned);
        while let Some(byte) = reader.read_u8() {
            if !self.searcher.feed(byte) {
                continue;
            }
            let end = reader.position();
            let body_start = self.begin_mark.len();
            let body_len = end - self.searcher.mark_len() - body_start;
            let body = data.slice(body_start, body_len);
            match self.resolver.resolve(&body) {
                Ok(package) => {
                    self.begin_verified = 0;
                    self.scanned = 0;
                    return Ok(Some(Decoded {
                        package,
                        rest: data.len() - end,
                    }));
                }
                Err(e) => return self.fail(e),
            }
        }

        if data.len() > self.max_package_size {
            let size = data.len() as u64;
            let max = self.max_package_size;
            return self.fail(ProtocolError::PackageTooLarge { size, max });
        }
        self.scanned = data.len();
        Ok(None)
    }

    fn reset(&mut self) {
        self.searcher.reset();
        self.begin_verified = 0;
        self.scanned = 0;
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }
}
