//! Filter for terminator-delimited packages.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::contract::{Decoded, Filter, FilterState};
use crate::filter::resolver::PackageResolver;

/// Streaming single-pattern matcher with partial-match carry-over.
///
/// Feeds one byte at a time and reports when the full mark has been
/// seen, so a mark split across chunk boundaries is still detected.
/// Mismatches fall back through a precomputed KMP failure table, which
/// keeps marks with repeated internal substrings (`"aa"`, `"abab"`)
/// correct where a naive matched-count counter would lose a prefix.
#[derive(Debug, Clone)]
pub struct MarkSearcher {
    mark: Vec<u8>,
    failure: Vec<usize>,
    matched: usize,
}

impl MarkSearcher {
    /// Creates a searcher for `mark`.
    ///
    /// # Panics
    ///
    /// Panics if `mark` is empty.
    #[must_use]
    pub fn new(mark: &[u8]) -> Self {
        assert!(!mark.is_empty(), "search mark must not be empty");
        Self {
            failure: Self::build_failure(mark),
            mark: mark.to_vec(),
            matched: 0,
        }
    }

    /// Classic KMP failure function: `failure[i]` is the length of the
    /// longest proper prefix of `mark[..=i]` that is also its suffix.
    fn build_failure(mark: &[u8]) -> Vec<usize> {
        let mut failure = vec![0usize; mark.len()];
        let mut k = 0;
        for i in 1..mark.len() {
            while k > 0 && mark[i] != mark[k] {
                k = failure[k - 1];
            }
            if mark[i] == mark[k] {
                k += 1;
            }
            failure[i] = k;
        }
        failure
    }

    /// Length of the mark in bytes.
    #[must_use]
    pub fn mark_len(&self) -> usize {
        self.mark.len()
    }

    /// Count of mark bytes currently matched.
    #[must_use]
    pub const fn matched(&self) -> usize {
        self.matched
    }

    /// Feeds one byte; returns true when the full mark completes.
    ///
    /// On completion the match counter resets, ready for the next
    /// package.
    pub fn feed(&mut self, byte: u8) -> bool {
        while self.matched > 0 && byte != self.mark[self.matched] {
            self.matched = self.failure[self.matched - 1];
        }
        if byte == self.mark[self.matched] {
            self.matched += 1;
        }
        if self.matched == self.mark.len() {
            self.matched = 0;
            return true;
        }
        false
    }

    /// Discards any partial match.
    pub fn reset(&mut self) {
        self.matched = 0;
    }
}

/// Decodes variable-length packages terminated by a fixed byte mark.
///
/// The package body is everything up to (and excluding) the
/// terminator; trailing bytes after the terminator are reported as
/// `rest`. The partial-match cursor persists across calls so a
/// terminator straddling a chunk boundary is detected, and the scan
/// resumes from the last search position rather than re-reading the
/// retained prefix.
#[derive(Debug)]
pub struct TerminatorFilter<R> {
    searcher: MarkSearcher,
    /// Absolute position up to which the retained bytes were scanned.
    scanned: usize,
    max_package_size: usize,
    resolver: R,
    state: FilterState,
}

impl<R> TerminatorFilter<R> {
    /// Creates a filter with no package size limit.
    ///
    /// # Panics
    ///
    /// Panics if `terminator` is empty.
    #[must_use]
    pub fn new(terminator: &[u8], resolver: R) -> Self {
        Self::with_max_package_size(terminator, usize::MAX, resolver)
    }

    /// Creates a filter that rejects packages whose body would exceed
    /// `max` bytes before a terminator is seen.
    #[must_use]
    pub fn with_max_package_size(terminator: &[u8], max: usize, resolver: R) -> Self {
        Self {
            searcher: MarkSearcher::new(terminator),
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

impl<R: PackageResolver> Filter for TerminatorFilter<R> {
    type Package = R::Package;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<Self::Package>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }

        let mut reader = data.reader_at(self.scanned);
        while let Some(byte) = reader.read_u8() {
            if !self.searcher.feed(byte) {
                continue;
            }
            let end = reader.position();
            let body = data.slice(0, end - self.searcher.mark_len());
            match self.resolver.resolve(&body) {
                Ok(package) => {
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
        self.scanned = 0;
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }
}
