//! The suspending pipeline: pulls that may await external readiness.

use crate::{
    errors::{SeqError, SeqResult},
    fold::Folder,
    sources::{IterProducer, LiftProducer, RawSource, Source, StreamProducer, SourceFactory,
        SuspendingSourceFactory},
    stages::{
        ConcatStage, DistinctStage, DropStage, DropWhileStage, FilterStage, FlatMapStage,
        InspectStage, InterleaveRoundStage, MapStage, PatchRule, PatchStage, RepeatStage,
        ScanStage, SlidingStage, SplitStage, TakeStage, TakeWhileStage, ZipAllStage, ZipManyStage,
        ZipPairStage,
    },
    traits::{BoxSuspendingProducer, SuspendingProducer},
};
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{fmt, hash::Hash};
use futures::stream::BoxStream;
use tracing::trace;

/// A lazy sequence of `T` driven by suspending pulls.
///
/// The mirror of [Pipeline] for sources that await readiness at the producer
/// boundary: streams, or immediate pipelines lifted via [Pipeline::suspend].
/// Stages are the same synchronous state machines; only the pull boundary
/// suspends.
///
/// [Pipeline]: crate::pipeline::Pipeline
/// [Pipeline::suspend]: crate::pipeline::Pipeline::suspend
pub struct SuspendingPipeline<T> {
    factory: SuspendingSourceFactory<T>,
    restartable: bool,
}

impl<T: Send + 'static> SuspendingPipeline<T> {
    /// The structurally empty pipeline.
    pub const fn empty() -> Self {
        Self { factory: SuspendingSourceFactory::Empty, restartable: true }
    }

    /// A single-pass pipeline over one stream.
    pub fn from_stream(stream: BoxStream<'static, T>) -> Self {
        Self::once(Box::new(StreamProducer::new(stream)))
    }

    /// A restartable pipeline opening a fresh stream per drive.
    pub fn from_stream_factory(
        make: impl Fn() -> BoxStream<'static, T> + Send + Sync + 'static,
    ) -> Self {
        Self::from_factory(move || Box::new(StreamProducer::new(make())))
    }

    /// A restartable pipeline opening a fresh suspending producer per drive.
    pub fn from_factory(
        make: impl Fn() -> BoxSuspendingProducer<T> + Send + Sync + 'static,
    ) -> Self {
        Self { factory: SuspendingSourceFactory::Restartable(Arc::new(make)), restartable: true }
    }

    /// A single-pass pipeline over one already-built producer.
    pub fn once(producer: BoxSuspendingProducer<T>) -> Self {
        Self { factory: SuspendingSourceFactory::once(producer), restartable: false }
    }

    /// Adopts a raw source with suspending-pull capability. Immediate sources
    /// fail with [SeqError::NotSuspendable]; lifting them is an explicit step
    /// through [Pipeline::suspend].
    ///
    /// [Pipeline::suspend]: crate::pipeline::Pipeline::suspend
    pub fn adopt(raw: RawSource<T>) -> SeqResult<Self> {
        match raw {
            RawSource::Suspending(producer) => Ok(Self::once(producer)),
            RawSource::Items(_) | RawSource::Iter(_) | RawSource::Immediate(_) => {
                Err(SeqError::NotSuspendable)
            }
            stream => match Source::adapt(stream)? {
                Source::Suspending(producer) => Ok(Self::once(producer)),
                Source::Immediate(_) => Err(SeqError::NotSuspendable),
            },
        }
    }

    /// Wraps an immediate factory so every pull completes through a lifted
    /// producer. Used by [Pipeline::suspend].
    ///
    /// [Pipeline::suspend]: crate::pipeline::Pipeline::suspend
    pub(crate) fn lift_from(parent: SourceFactory<T>, restartable: bool) -> Self {
        if parent.is_empty() {
            return Self::empty();
        }
        Self {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                Box::new(LiftProducer::new(parent.open()))
            })),
            restartable,
        }
    }

    /// Returns whether this pipeline is the structural empty.
    pub const fn is_empty(&self) -> bool {
        self.factory.is_empty()
    }

    /// Returns whether every drive reopens the source from its beginning.
    pub const fn is_restartable(&self) -> bool {
        self.restartable
    }

    /// Opens a producer for one drive.
    pub fn open(&self) -> BoxSuspendingProducer<T> {
        self.factory.open()
    }

    /// Wraps the factory with one more stage. Empty parents stay empty.
    fn derive<U: Send + 'static>(
        &self,
        build: impl Fn(BoxSuspendingProducer<T>) -> BoxSuspendingProducer<U> + Send + Sync + 'static,
    ) -> SuspendingPipeline<U> {
        if self.is_empty() {
            return SuspendingPipeline::empty();
        }
        let parent = self.factory.clone();
        SuspendingPipeline {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || build(parent.open()))),
            restartable: self.restartable,
        }
    }

    /// Transforms every element.
    pub fn map<U: Send + 'static>(
        &self,
        f: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> SuspendingPipeline<U> {
        let f: Arc<dyn Fn(T) -> U + Send + Sync> = Arc::new(f);
        self.derive(move |prev| Box::new(MapStage::new(prev, Arc::clone(&f))))
    }

    /// Keeps the elements matching the predicate.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let pred: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(pred);
        self.derive(move |prev| Box::new(FilterStage::new(prev, Arc::clone(&pred))))
    }

    /// Expands every element into a suspending pipeline, draining each
    /// expansion fully and in order.
    pub fn flat_map<U: Send + 'static>(
        &self,
        f: impl Fn(T) -> SuspendingPipeline<U> + Send + Sync + 'static,
    ) -> SuspendingPipeline<U> {
        let expand: Arc<dyn Fn(T) -> BoxSuspendingProducer<U> + Send + Sync> =
            Arc::new(move |item| f(item).open());
        self.derive(move |prev| Box::new(FlatMapStage::new(prev, Arc::clone(&expand))))
    }

    /// Observes every element as it passes, without altering it.
    pub fn inspect(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Self {
        let observer: Arc<dyn Fn(&T) + Send + Sync> = Arc::new(observer);
        self.derive(move |prev| Box::new(InspectStage::new(prev, Arc::clone(&observer))))
    }

    /// Appends the other pipeline after this one.
    pub fn concat(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (first, second) = (self.factory.clone(), other.factory.clone());
        Self {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                Box::new(ConcatStage::new(first.open(), second.open()))
            })),
            restartable: self.restartable && other.restartable,
        }
    }

    /// Keeps at most the first `n` elements; `take(0)` is the structural
    /// empty.
    pub fn take(&self, n: usize) -> Self {
        if n == 0 {
            return Self::empty();
        }
        self.derive(move |prev| Box::new(TakeStage::new(prev, n)))
    }

    /// Skips the first `n` elements.
    pub fn skip(&self, n: usize) -> Self {
        if n == 0 {
            return self.clone();
        }
        self.derive(move |prev| Box::new(DropStage::new(prev, n)))
    }

    /// Keeps the leading prefix matching the predicate.
    pub fn take_while(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let pred: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(pred);
        self.derive(move |prev| Box::new(TakeWhileStage::new(prev, Arc::clone(&pred))))
    }

    /// Skips the leading prefix matching the predicate.
    pub fn skip_while(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let pred: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(pred);
        self.derive(move |prev| Box::new(DropWhileStage::new(prev, Arc::clone(&pred))))
    }

    /// Windows the sequence; see [SlidingStage] for the partial-window rule.
    pub fn sliding(&self, size: usize, step: usize) -> SuspendingPipeline<Vec<T>>
    where
        T: Clone + Sync,
    {
        self.derive(move |prev| Box::new(SlidingStage::new(prev, size, step)))
    }

    /// Buckets the sequence at elements matching the separator predicate.
    pub fn split_where(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> SuspendingPipeline<Vec<T>> {
        let pred: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(pred);
        self.derive(move |prev| Box::new(SplitStage::new(prev, Arc::clone(&pred))))
    }

    /// Applies a substitution rule to the sequence.
    pub fn patch_where(&self, rule: PatchRule<T>) -> Self {
        self.derive(move |prev| Box::new(PatchStage::new(prev, rule.clone())))
    }

    /// Inserts the separator between consecutive elements.
    pub fn intersperse(&self, sep: T) -> Self
    where
        T: Clone + Sync,
    {
        let rule = PatchRule::matching(|_, index| index >= 1)
            .insert(move |_, _| alloc::vec![sep.clone()]);
        self.patch_where(rule)
    }

    /// Replaces every occurrence of `old` with `new`.
    pub fn substitute(&self, old: T, new: T) -> Self
    where
        T: PartialEq + Clone + Sync,
    {
        let rule = PatchRule::matching(move |item: &T, _| *item == old)
            .remove(1)
            .insert(move |_, _| alloc::vec![new.clone()]);
        self.patch_where(rule)
    }

    /// Pairs this pipeline with another, ending at the shorter one. The two
    /// per-step pulls are awaited concurrently.
    pub fn zip<U: Send + 'static>(&self, other: &SuspendingPipeline<U>) -> SuspendingPipeline<(T, U)> {
        if self.is_empty() || other.is_empty() {
            return SuspendingPipeline::empty();
        }
        let (left, right) = (self.factory.clone(), other.factory.clone());
        SuspendingPipeline {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipPairStage::new(left.open(), right.open()))
            })),
            restartable: self.restartable && other.restartable,
        }
    }

    /// Zips N pipelines into position tuples, ending at the shortest input.
    /// Each step awaits all N pulls together.
    pub fn zip_many(inputs: Vec<Self>) -> SuspendingPipeline<Vec<T>> {
        if inputs.is_empty() || inputs.iter().any(Self::is_empty) {
            return SuspendingPipeline::empty();
        }
        let restartable = inputs.iter().all(Self::is_restartable);
        let factories: Vec<SuspendingSourceFactory<T>> =
            inputs.into_iter().map(|p| p.factory).collect();
        SuspendingPipeline {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipManyStage::new(
                    factories.iter().map(SuspendingSourceFactory::open).collect(),
                ))
            })),
            restartable,
        }
    }

    /// Zips N pipelines until all are exhausted; exhausted positions yield
    /// `None` markers.
    pub fn zip_all(inputs: Vec<Self>) -> SuspendingPipeline<Vec<Option<T>>> {
        if inputs.is_empty() || inputs.iter().all(Self::is_empty) {
            return SuspendingPipeline::empty();
        }
        let restartable = inputs.iter().all(Self::is_restartable);
        let factories: Vec<SuspendingSourceFactory<T>> =
            inputs.into_iter().map(|p| p.factory).collect();
        SuspendingPipeline {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipAllStage::new(
                    factories.iter().map(SuspendingSourceFactory::open).collect(),
                ))
            })),
            restartable,
        }
    }

    /// Round-robins N pipelines, stopping with the shortest input's round.
    pub fn interleave(inputs: Vec<Self>) -> Self {
        Self::zip_many(inputs).derive(|prev| {
            Box::new(FlatMapStage::new(
                prev,
                Arc::new(|round: Vec<T>| {
                    LiftProducer::new(IterProducer::new(round.into_iter()))
                }),
            ))
        })
    }

    /// Round-robins N pipelines to full exhaustion, skipping finished inputs.
    pub fn interleave_all(inputs: Vec<Self>) -> Self {
        Self::zip_all(inputs).derive(|prev| {
            Box::new(FlatMapStage::new(
                prev,
                Arc::new(|round: Vec<Option<T>>| {
                    LiftProducer::new(IterProducer::new(round.into_iter().flatten()))
                }),
            ))
        })
    }

    /// Round-robins N pipelines indefinitely, restarting each input when it
    /// exhausts. Fails with [SeqError::NotRestartable] when any input is
    /// single-pass.
    pub fn interleave_round(inputs: Vec<Self>) -> SeqResult<Self> {
        if inputs.iter().any(|input| !input.is_restartable()) {
            return Err(SeqError::NotRestartable);
        }
        if inputs.iter().all(Self::is_empty) {
            return Ok(Self::empty());
        }
        let factories: Vec<SuspendingSourceFactory<T>> =
            inputs.into_iter().map(|p| p.factory).collect();
        Ok(Self {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                let openers: Vec<Box<dyn Fn() -> BoxSuspendingProducer<T> + Send + Sync>> =
                    factories
                        .iter()
                        .map(|factory| {
                            let factory = factory.clone();
                            Box::new(move || factory.open())
                                as Box<dyn Fn() -> BoxSuspendingProducer<T> + Send + Sync>
                        })
                        .collect();
                Box::new(InterleaveRoundStage::new(openers))
            })),
            restartable: true,
        })
    }

    /// Replays this pipeline `times` times, or indefinitely for `None`.
    pub fn repeat(&self, times: Option<usize>) -> SeqResult<Self> {
        if !self.restartable {
            return Err(SeqError::NotRestartable);
        }
        if self.is_empty() || times == Some(0) {
            return Ok(Self::empty());
        }
        let parent = self.factory.clone();
        Ok(Self {
            factory: SuspendingSourceFactory::Restartable(Arc::new(move || {
                let parent = parent.clone();
                Box::new(RepeatStage::new(move || parent.open(), times))
            })),
            restartable: true,
        })
    }

    /// Suppresses repeated element values.
    pub fn distinct(&self) -> Self
    where
        T: Hash + Eq + Clone + Sync,
    {
        self.distinct_by(T::clone)
    }

    /// Suppresses elements whose computed key has been seen before.
    pub fn distinct_by<K>(&self, key_fn: impl Fn(&T) -> K + Send + Sync + 'static) -> Self
    where
        K: Hash + Eq + Send + 'static,
    {
        let key_fn: Arc<dyn Fn(&T) -> K + Send + Sync> = Arc::new(key_fn);
        self.derive(move |prev| Box::new(DistinctStage::new(prev, Arc::clone(&key_fn))))
    }

    /// Yields the running extraction of the folder after every element.
    pub fn scan<S, R>(&self, folder: &Folder<T, S, R>) -> SuspendingPipeline<R>
    where
        S: Clone + Send + Sync + 'static,
        R: Send + 'static,
    {
        let folder = folder.clone();
        self.derive(move |prev| Box::new(ScanStage::new(prev, folder.clone())))
    }

    /// Collects every element into a vector.
    pub async fn collect(&self) -> SeqResult<Vec<T>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut producer = self.open();
        let mut out = Vec::new();
        while let Some(item) = producer.pull().await? {
            out.push(item);
        }
        trace!(target: "pipeline", collected = out.len(), "suspending collect drive complete");
        Ok(out)
    }

    /// Returns the first element, failing with
    /// [SeqError::EmptySequenceUnsupported] when there is none.
    pub async fn first(&self) -> SeqResult<T> {
        if self.is_empty() {
            return Err(SeqError::EmptySequenceUnsupported);
        }
        self.open().pull().await?.ok_or(SeqError::EmptySequenceUnsupported)
    }

    /// Returns the first element, or the default when there is none.
    pub async fn first_or(&self, default: T) -> SeqResult<T> {
        if self.is_empty() {
            return Ok(default);
        }
        Ok(self.open().pull().await?.unwrap_or(default))
    }

    /// Returns the last element, if any.
    pub async fn last(&self) -> SeqResult<Option<T>> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut producer = self.open();
        let mut last = None;
        while let Some(item) = producer.pull().await? {
            last = Some(item);
        }
        Ok(last)
    }

    /// Counts the elements.
    pub async fn count(&self) -> SeqResult<u64> {
        if self.is_empty() {
            return Ok(0);
        }
        let mut producer = self.open();
        let mut n = 0;
        while producer.pull().await?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Drives the folder over this pipeline. The zero-pull guarantees of
    /// [Pipeline::fold] apply unchanged.
    ///
    /// [Pipeline::fold]: crate::pipeline::Pipeline::fold
    pub async fn fold<S: Clone, R>(&self, folder: &Folder<T, S, R>) -> SeqResult<R> {
        let mut state = folder.init_state();
        if folder.escaped(&state) || self.is_empty() {
            return Ok(folder.extract(&state));
        }
        let mut producer = self.open();
        let mut index = 0;
        while let Some(item) = producer.pull().await? {
            state = folder.run_step(state, item, index);
            index += 1;
            if folder.escaped(&state) {
                break;
            }
        }
        trace!(target: "pipeline", steps = index, "suspending fold drive complete");
        Ok(folder.extract(&state))
    }
}

impl<T> Clone for SuspendingPipeline<T> {
    fn clone(&self) -> Self {
        Self { factory: self.factory.clone(), restartable: self.restartable }
    }
}

impl<T> fmt::Debug for SuspendingPipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendingPipeline")
            .field("factory", &self.factory)
            .field("restartable", &self.restartable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fold::catalog, pipeline::Pipeline};
    use alloc::vec;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_stream_source_drives_to_completion() {
        let pipeline = SuspendingPipeline::from_stream_factory(|| {
            futures::stream::iter(vec![1, 2, 3]).boxed()
        });
        assert!(pipeline.is_restartable());
        assert_eq!(pipeline.map(|n| n * 2).collect().await, Ok(vec![2, 4, 6]));
        assert_eq!(pipeline.collect().await, Ok(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_single_stream_is_single_pass() {
        let pipeline =
            SuspendingPipeline::from_stream(futures::stream::iter(vec![1, 2]).boxed());
        assert!(!pipeline.is_restartable());
        assert_eq!(pipeline.collect().await, Ok(vec![1, 2]));
        assert_eq!(pipeline.collect().await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_adopt_rejects_immediate_sources() {
        let result = SuspendingPipeline::adopt(RawSource::Items(vec![1, 2]));
        assert_eq!(result.unwrap_err(), SeqError::NotSuspendable);
    }

    #[tokio::test]
    async fn test_lifting_an_immediate_pipeline() {
        let lifted = Pipeline::from_items(vec![1, 2, 3, 4]).suspend();
        assert!(lifted.is_restartable());
        assert_eq!(lifted.filter(|n| n % 2 == 0).collect().await, Ok(vec![2, 4]));
    }

    #[tokio::test]
    async fn test_suspending_zip_and_interleave() {
        let a = SuspendingPipeline::from_stream_factory(|| {
            futures::stream::iter(vec![1, 2, 3]).boxed()
        });
        let b = SuspendingPipeline::from_stream_factory(|| {
            futures::stream::iter(vec![10, 20]).boxed()
        });
        assert_eq!(a.zip(&b).collect().await, Ok(vec![(1, 10), (2, 20)]));
        assert_eq!(
            SuspendingPipeline::interleave_all(vec![a, b]).collect().await,
            Ok(vec![1, 10, 2, 20, 3])
        );
    }

    #[tokio::test]
    async fn test_suspending_fold_with_escape() {
        let pipeline = Pipeline::from_iter_factory(|| 1u64..).suspend();
        let capped = catalog::sum::<u64>().take_input(3);
        assert_eq!(pipeline.fold(&capped).await, Ok(6));
    }

    #[tokio::test]
    async fn test_suspending_terminals_on_empty() {
        let empty = SuspendingPipeline::<i32>::empty();
        assert_eq!(empty.first().await, Err(SeqError::EmptySequenceUnsupported));
        assert_eq!(empty.first_or(9).await, Ok(9));
        assert_eq!(empty.count().await, Ok(0));
    }

    #[tokio::test]
    async fn test_suspending_sliding_matches_the_immediate_semantics() {
        let pipeline = SuspendingPipeline::from_stream_factory(|| {
            futures::stream::iter(0..8).boxed()
        });
        assert_eq!(
            pipeline.sliding(3, 3).collect().await,
            Ok(vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7]])
        );
    }
}
