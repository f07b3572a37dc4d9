//! Sniff-byte filter switching for non-uniform protocols.

use crate::buffer::BufferSequence;
use crate::error::ProtocolError;
use crate::filter::contract::{BoxedFilter, Decoded, Filter, FilterState};

/// Builds a sub-filter on demand when its sniff byte is seen.
pub type FilterFactory<P> = Box<dyn Fn() -> BoxedFilter<P> + Send>;

/// A meta-filter that consumes nothing itself: it inspects the first
/// available byte and installs one of several pre-registered
/// sub-filters as the next filter. The sniff byte stays in the stream,
/// so the chosen sub-filter sees it as part of its own framing.
///
/// A sniff byte matching none of the registered routes is a structural
/// error.
pub struct SwitcherFilter<P> {
    routes: Vec<(u8, FilterFactory<P>)>,
    next: Option<BoxedFilter<P>>,
    state: FilterState,
}

impl<P> SwitcherFilter<P> {
    /// Creates a switcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            next: None,
            state: FilterState::Normal,
        }
    }

    /// Registers a sub-filter factory for a sniff byte.
    #[must_use]
    pub fn route(
        mut self,
        sniff: u8,
        factory: impl Fn() -> BoxedFilter<P> + Send + 'static,
    ) -> Self {
        self.routes.push((sniff, Box::new(factory)));
        self
    }
}

impl<P> Default for SwitcherFilter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for SwitcherFilter<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitcherFilter")
            .field("routes", &self.routes.iter().map(|(b, _)| *b).collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}

impl<P> Filter for SwitcherFilter<P> {
    type Package = P;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<P>>, ProtocolError> {
        if self.state == FilterState::Error {
            return Err(ProtocolError::Poisoned);
        }
        if data.is_empty() {
            return Ok(None);
        }

        let sniff = data.byte_at(0);
        match self.routes.iter().find(|(byte, _)| *byte == sniff) {
            Some((_, factory)) => {
                self.next = Some(factory());
                Ok(None)
            }
            None => {
                self.state = FilterState::Error;
                Err(ProtocolError::UnknownSniffByte(sniff))
            }
        }
    }

    fn reset(&mut self) {
        self.next = None;
        self.state = FilterState::Normal;
    }

    fn state(&self) -> FilterState {
        self.state
    }

    fn take_next_filter(&mut self) -> Option<BoxedFilter<P>> {
        self.next.take()
    }
}

/// Decorates a filter so that, each time it completes a package,
/// control hands back to a filter produced by the given factory —
/// typically a fresh switcher, closing the loop for protocols where
/// every package re-sniffs its framing.
pub struct SwitchBack<F: Filter> {
    inner: F,
    factory: FilterFactory<F::Package>,
    next: Option<BoxedFilter<F::Package>>,
}

impl<F: Filter> SwitchBack<F> {
    /// Wraps `inner`, handing control to `factory()` after each
    /// completed package.
    #[must_use]
    pub fn new(
        inner: F,
        factory: impl Fn() -> BoxedFilter<F::Package> + Send + 'static,
    ) -> Self {
        Self {
            inner,
            factory: Box::new(factory),
            next: None,
        }
    }
}

impl<F: Filter> std::fmt::Debug for SwitchBack<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchBack")
            .field("state", &self.inner.state())
            .finish()
    }
}

impl<F: Filter> Filter for SwitchBack<F> {
    type Package = F::Package;

    fn filter(
        &mut self,
        data: &BufferSequence,
    ) -> Result<Option<Decoded<F::Package>>, ProtocolError> {
        let outcome = self.inner.filter(data)?;
        if outcome.is_some() {
            self.next = Some((self.factory)());
        }
        Ok(outcome)
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.next = None;
    }

    fn state(&self) -> FilterState {
        self.inner.state()
    }

    fn take_next_filter(&mut self) -> Option<BoxedFilter<F::Package>> {
        self.next.take().or_else(|| self.inner.take_next_filter())
    }
}
