//! Elementwise and expansive transform stages.

use crate::{
    errors::SeqResult,
    stages::{ArcMapFn, ArcPred},
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, sync::Arc};
use async_trait::async_trait;
use core::fmt;

/// The elementwise mapping stage.
pub struct MapStage<P, T, U> {
    prev: P,
    map_fn: ArcMapFn<T, U>,
}

impl<P, T, U> MapStage<P, T, U> {
    /// Creates a new [MapStage] over the previous producer.
    pub fn new(prev: P, map_fn: ArcMapFn<T, U>) -> Self {
        Self { prev, map_fn }
    }
}

impl<P, T, U> Producer for MapStage<P, T, U>
where
    P: Producer<Item = T>,
{
    type Item = U;

    fn pull(&mut self) -> SeqResult<Option<U>> {
        Ok(self.prev.pull()?.map(|item| (self.map_fn)(item)))
    }
}

#[async_trait]
impl<P, T, U> SuspendingProducer for MapStage<P, T, U>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
    U: Send,
{
    type Item = U;

    async fn pull(&mut self) -> SeqResult<Option<U>> {
        Ok(self.prev.pull().await?.map(|item| (self.map_fn)(item)))
    }
}

impl<P, T, U> fmt::Debug for MapStage<P, T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStage").finish_non_exhaustive()
    }
}

/// The predicate filtering stage.
pub struct FilterStage<P, T> {
    prev: P,
    pred: ArcPred<T>,
}

impl<P, T> FilterStage<P, T> {
    /// Creates a new [FilterStage] over the previous producer.
    pub fn new(prev: P, pred: ArcPred<T>) -> Self {
        Self { prev, pred }
    }
}

impl<P, T> Producer for FilterStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            match self.prev.pull()? {
                Some(item) if (self.pred)(&item) => return Ok(Some(item)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for FilterStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            match self.prev.pull().await? {
                Some(item) if (self.pred)(&item) => return Ok(Some(item)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }
}

impl<P, T> fmt::Debug for FilterStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStage").finish_non_exhaustive()
    }
}

/// The expansive stage: every source element produces a sub-producer that is
/// fully drained, in order, before the next source element is requested.
pub struct FlatMapStage<P, T, C> {
    prev: P,
    expand_fn: ArcMapFn<T, C>,
    current: Option<C>,
}

impl<P, T, C> FlatMapStage<P, T, C> {
    /// Creates a new [FlatMapStage] over the previous producer.
    pub fn new(prev: P, expand_fn: ArcMapFn<T, C>) -> Self {
        Self { prev, expand_fn, current: None }
    }
}

impl<P, T, C> Producer for FlatMapStage<P, T, C>
where
    P: Producer<Item = T>,
    C: Producer,
{
    type Item = C::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(item) = current.pull()? {
                    return Ok(Some(item));
                }
                self.current = None;
            }
            match self.prev.pull()? {
                Some(item) => self.current = Some((self.expand_fn)(item)),
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl<P, T, C> SuspendingProducer for FlatMapStage<P, T, C>
where
    P: SuspendingProducer<Item = T>,
    C: SuspendingProducer,
    T: Send,
{
    type Item = C::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(item) = current.pull().await? {
                    return Ok(Some(item));
                }
                self.current = None;
            }
            match self.prev.pull().await? {
                Some(item) => self.current = Some((self.expand_fn)(item)),
                None => return Ok(None),
            }
        }
    }
}

impl<P, T, C> fmt::Debug for FlatMapStage<P, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMapStage")
            .field("draining", &self.current.is_some())
            .finish_non_exhaustive()
    }
}

/// The monitoring tap: observes every pulled element without altering it.
pub struct InspectStage<P, T> {
    prev: P,
    observer: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<P, T> InspectStage<P, T> {
    /// Creates a new [InspectStage] over the previous producer.
    pub fn new(prev: P, observer: Arc<dyn Fn(&T) + Send + Sync>) -> Self {
        Self { prev, observer }
    }
}

impl<P, T> Producer for InspectStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        let pulled = self.prev.pull()?;
        if let Some(item) = pulled.as_ref() {
            (self.observer)(item);
        }
        Ok(pulled)
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for InspectStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        let pulled = self.prev.pull().await?;
        if let Some(item) = pulled.as_ref() {
            (self.observer)(item);
        }
        Ok(pulled)
    }
}

impl<P, T> fmt::Debug for InspectStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectStage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
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
    fn test_map_stage() {
        let prev = IterProducer::new(vec![1, 2, 3].into_iter());
        let stage = MapStage::new(prev, Arc::new(|n: i32| n * 10));
        assert_eq!(drain(stage), vec![10, 20, 30]);
    }

    #[test]
    fn test_filter_stage_skips_rejected_elements() {
        let prev = IterProducer::new((0..6).collect::<Vec<_>>().into_iter());
        let stage = FilterStage::new(prev, Arc::new(|n: &i32| n % 2 == 0));
        assert_eq!(drain(stage), vec![0, 2, 4]);
    }

    #[test]
    fn test_flat_map_drains_each_expansion_in_order() {
        let prev = IterProducer::new(vec![1, 3].into_iter());
        let stage = FlatMapStage::new(
            prev,
            Arc::new(|n: i32| IterProducer::new(vec![n, n + 1].into_iter())),
        );
        assert_eq!(drain(stage), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_inspect_stage_sees_every_element() {
        let seen = Arc::new(spin::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let prev = IterProducer::new(vec![5, 6].into_iter());
        let stage = InspectStage::new(prev, Arc::new(move |n: &i32| sink.lock().push(*n)));
        assert_eq!(drain(stage), vec![5, 6]);
        assert_eq!(*seen.lock(), vec![5, 6]);
    }
}
