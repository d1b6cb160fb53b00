//! Test utilities for driving pipelines and observing their behavior.

use crate::{
    errors::SeqResult,
    pipeline::Pipeline,
    sources::IterProducer,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, format, string::String, sync::Arc, vec::Vec};
use async_trait::async_trait;
use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{layer::Context, Layer};

/// A shared pull counter, observable after a drive completes.
#[derive(Debug, Default, Clone)]
pub struct PullCounter(Arc<AtomicUsize>);

impl PullCounter {
    /// Returns the number of pulls recorded so far.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

/// A producer wrapper that counts every pull made against it, including the
/// pull that observes exhaustion.
#[derive(Debug)]
pub struct CountingProducer<P> {
    prev: P,
    counter: Arc<AtomicUsize>,
}

impl<P> CountingProducer<P> {
    /// Wraps the producer, recording pulls into the given counter.
    pub fn new(prev: P, counter: &PullCounter) -> Self {
        Self { prev, counter: Arc::clone(&counter.0) }
    }
}

impl<P: Producer> Producer for CountingProducer<P> {
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        self.counter.fetch_add(1, Ordering::Relaxed);
        self.prev.pull()
    }
}

#[async_trait]
impl<P: SuspendingProducer> SuspendingProducer for CountingProducer<P> {
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        self.counter.fetch_add(1, Ordering::Relaxed);
        self.prev.pull().await
    }
}

/// A restartable pipeline over `0..limit` that counts every producer pull
/// across all drives.
pub fn counting_pipeline(limit: i32) -> (Pipeline<i32>, PullCounter) {
    let counter = PullCounter::default();
    let probe = counter.clone();
    let pipeline = Pipeline::from_factory(move || {
        Box::new(CountingProducer::new(IterProducer::new(0..limit), &probe))
    });
    (pipeline, counter)
}

/// The storage for the collected traces.
#[derive(Debug, Default, Clone)]
pub struct TraceStorage(pub Arc<Mutex<Vec<(Level, String)>>>);

impl TraceStorage {
    /// Returns the items in the storage that match the specified level.
    pub fn get_by_level(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|(l, message)| (*l == level).then(|| message.clone()))
            .collect()
    }

    /// Locks the storage and returns the items.
    pub fn lock(&self) -> spin::MutexGuard<'_, Vec<(Level, String)>> {
        self.0.lock()
    }

    /// Returns if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

/// A subscriber layer that collects traces and their log levels.
#[derive(Debug, Default)]
pub struct CollectingLayer {
    /// The storage for the collected traces.
    pub storage: TraceStorage,
}

impl CollectingLayer {
    /// Creates a new collecting layer with the specified storage.
    pub const fn new(storage: TraceStorage) -> Self {
        Self { storage }
    }
}

impl<S: Subscriber> Layer<S> for CollectingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let message = format!("{event:?}");

        let mut storage = self.storage.0.lock();
        storage.push((level, message));
    }
}
