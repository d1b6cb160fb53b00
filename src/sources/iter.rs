//! Immediate producer adapters over in-memory and generator-style sources.

use crate::{errors::SeqResult, traits::Producer};
use alloc::boxed::Box;
use core::fmt;

/// Adapts any [Iterator] into the canonical immediate producer form.
pub struct IterProducer<I> {
    iter: I,
}

impl<I> IterProducer<I> {
    /// Creates a new [IterProducer] over the given iterator.
    pub const fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I: Iterator> Producer for IterProducer<I> {
    type Item = I::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        Ok(self.iter.next())
    }
}

impl<I> fmt::Debug for IterProducer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterProducer").finish_non_exhaustive()
    }
}

/// An immediate producer backed by a fallible pull closure.
///
/// Useful for wrapping external generators whose pulls can fail; an `Err`
/// from the closure aborts the drive that observed it.
pub struct FnProducer<T> {
    pull_fn: Box<dyn FnMut() -> SeqResult<Option<T>> + Send>,
}

impl<T> FnProducer<T> {
    /// Creates a new [FnProducer] from the given pull closure.
    pub fn new(pull_fn: impl FnMut() -> SeqResult<Option<T>> + Send + 'static) -> Self {
        Self { pull_fn: Box::new(pull_fn) }
    }
}

impl<T> Producer for FnProducer<T> {
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        (self.pull_fn)()
    }
}

impl<T> fmt::Debug for FnProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProducer").finish_non_exhaustive()
    }
}
