//! Prefix-bounding stages: fixed counts and predicate boundaries.

use crate::{
    errors::SeqResult,
    stages::ArcPred,
    traits::{Producer, SuspendingProducer},
};
use alloc::boxed::Box;
use async_trait::async_trait;
use core::fmt;

/// Yields at most `n` leading elements, then stops pulling entirely.
#[derive(Debug)]
pub struct TakeStage<P> {
    prev: P,
    remaining: usize,
}

impl<P> TakeStage<P> {
    /// Creates a new [TakeStage] yielding at most `remaining` elements.
    pub const fn new(prev: P, remaining: usize) -> Self {
        Self { prev, remaining }
    }
}

impl<P: Producer> Producer for TakeStage<P> {
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        match self.prev.pull()? {
            Some(item) => {
                self.remaining -= 1;
                Ok(Some(item))
            }
            None => {
                self.remaining = 0;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<P: SuspendingProducer> SuspendingProducer for TakeStage<P> {
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        match self.prev.pull().await? {
            Some(item) => {
                self.remaining -= 1;
                Ok(Some(item))
            }
            None => {
                self.remaining = 0;
                Ok(None)
            }
        }
    }
}

/// Skips exactly `n` leading elements before passing the rest through.
#[derive(Debug)]
pub struct DropStage<P> {
    prev: P,
    remaining: usize,
}

impl<P> DropStage<P> {
    /// Creates a new [DropStage] skipping `remaining` leading elements.
    pub const fn new(prev: P, remaining: usize) -> Self {
        Self { prev, remaining }
    }
}

impl<P: Producer> Producer for DropStage<P> {
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        while self.remaining > 0 {
            if self.prev.pull()?.is_none() {
                self.remaining = 0;
                return Ok(None);
            }
            self.remaining -= 1;
        }
        self.prev.pull()
    }
}

#[async_trait]
impl<P: SuspendingProducer> SuspendingProducer for DropStage<P> {
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        while self.remaining > 0 {
            if self.prev.pull().await?.is_none() {
                self.remaining = 0;
                return Ok(None);
            }
            self.remaining -= 1;
        }
        self.prev.pull().await
    }
}

/// Yields the leading prefix for which the predicate holds; the first
/// rejection ends the stage without any further pulls.
pub struct TakeWhileStage<P, T> {
    prev: P,
    pred: ArcPred<T>,
    done: bool,
}

impl<P, T> TakeWhileStage<P, T> {
    /// Creates a new [TakeWhileStage] over the previous producer.
    pub fn new(prev: P, pred: ArcPred<T>) -> Self {
        Self { prev, pred, done: false }
    }

    fn admit(&mut self, item: Option<T>) -> Option<T> {
        match item {
            Some(item) if (self.pred)(&item) => Some(item),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl<P, T> Producer for TakeWhileStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        if self.done {
            return Ok(None);
        }
        let pulled = self.prev.pull()?;
        Ok(self.admit(pulled))
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for TakeWhileStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        if self.done {
            return Ok(None);
        }
        let pulled = self.prev.pull().await?;
        Ok(self.admit(pulled))
    }
}

impl<P, T> fmt::Debug for TakeWhileStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TakeWhileStage").field("done", &self.done).finish_non_exhaustive()
    }
}

/// Skips the leading prefix for which the predicate holds, then passes the
/// rest through untested.
pub struct DropWhileStage<P, T> {
    prev: P,
    pred: ArcPred<T>,
    dropping: bool,
}

impl<P, T> DropWhileStage<P, T> {
    /// Creates a new [DropWhileStage] over the previous producer.
    pub fn new(prev: P, pred: ArcPred<T>) -> Self {
        Self { prev, pred, dropping: true }
    }
}

impl<P, T> Producer for DropWhileStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        while self.dropping {
            match self.prev.pull()? {
                Some(item) if (self.pred)(&item) => continue,
                Some(item) => {
                    self.dropping = false;
                    return Ok(Some(item));
                }
                None => {
                    self.dropping = false;
                    return Ok(None);
                }
            }
        }
        self.prev.pull()
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for DropWhileStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        while self.dropping {
            match self.prev.pull().await? {
                Some(item) if (self.pred)(&item) => continue,
                Some(item) => {
                    self.dropping = false;
                    return Ok(Some(item));
                }
                None => {
                    self.dropping = false;
                    return Ok(None);
                }
            }
        }
        self.prev.pull().await
    }
}

impl<P, T> fmt::Debug for DropWhileStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropWhileStage").field("dropping", &self.dropping).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FnProducer, IterProducer};
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;

    fn drain<P: Producer>(mut producer: P) -> Vec<P::Item> {
        let mut out = Vec::new();
        while let Some(item) = producer.pull().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_take_zero_never_pulls() {
        let mut stage = TakeStage::new(
            FnProducer::new(|| panic!("take(0) must not pull the source")),
            0,
        );
        assert_eq!(stage.pull(), Ok(None::<i32>));
    }

    #[test]
    fn test_take_bounds_an_infinite_source() {
        let stage = TakeStage::new(IterProducer::new(0..), 3);
        assert_eq!(drain(stage), vec![0, 1, 2]);
    }

    #[test]
    fn test_drop_skips_exact_prefix() {
        let stage = DropStage::new(IterProducer::new(0..5), 2);
        assert_eq!(drain(stage), vec![2, 3, 4]);
    }

    #[test]
    fn test_take_while_stops_pulling_after_first_rejection() {
        let mut budget = 5;
        let source = FnProducer::new(move || {
            assert!(budget > 0, "pulled past the first rejected element");
            budget -= 1;
            Ok(Some(5 - budget))
        });
        // Elements arrive as 1, 2, 3, ...; reject at 3, leaving budget for no
        // further pull.
        let mut stage = TakeWhileStage::new(source, Arc::new(|n: &i32| *n < 3));
        assert_eq!(stage.pull(), Ok(Some(1)));
        assert_eq!(stage.pull(), Ok(Some(2)));
        assert_eq!(stage.pull(), Ok(None));
        assert_eq!(stage.pull(), Ok(None));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_drop_while_passes_later_matches_through() {
        let stage = DropWhileStage::new(
            IterProducer::new(vec![1, 1, 4, 1, 5].into_iter()),
            Arc::new(|n: &i32| *n == 1),
        );
        assert_eq!(drain(stage), vec![4, 1, 5]);
    }
}
