//! Suspending producer adapters.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::boxed::Box;
use async_trait::async_trait;
use core::fmt;
use futures::stream::{BoxStream, StreamExt};

/// Adapts a suspending stream into the canonical suspending producer form.
pub struct StreamProducer<T> {
    inner: BoxStream<'static, T>,
}

impl<T> StreamProducer<T> {
    /// Creates a new [StreamProducer] over the given stream.
    pub fn new(inner: BoxStream<'static, T>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Send> SuspendingProducer for StreamProducer<T> {
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        Ok(self.inner.next().await)
    }
}

impl<T> fmt::Debug for StreamProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamProducer").finish_non_exhaustive()
    }
}

/// Lifts an immediate producer into the suspending form.
///
/// Pulls complete without ever suspending; the wrapper only exists so that
/// immediate sources can participate in suspending pipelines after an
/// explicit lift.
#[derive(Debug)]
pub struct LiftProducer<P> {
    inner: P,
}

impl<P> LiftProducer<P> {
    /// Creates a new [LiftProducer] around the given immediate producer.
    pub const fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P> SuspendingProducer for LiftProducer<P>
where
    P: Producer + Send,
    P::Item: Send,
{
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        self.inner.pull()
    }
}
