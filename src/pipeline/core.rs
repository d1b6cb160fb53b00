//! The immediate pipeline: synchronous pulls end to end.

use crate::{
    errors::{SeqError, SeqResult},
    fold::Folder,
    sources::{IterProducer, RawSource, Source, SourceFactory},
    stages::{
        ConcatStage, DistinctStage, DropStage, DropWhileStage, FilterStage, FlatMapStage,
        InspectStage, InterleaveRoundStage, MapStage, PatchRule, PatchStage, RepeatStage,
        ScanStage, SlidingStage, SplitStage, TakeStage, TakeWhileStage, ZipAllStage, ZipManyStage,
        ZipPairStage,
    },
    traits::{BoxProducer, Producer},
};
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{fmt, hash::Hash};
use tracing::trace;

/// A lazy sequence of `T` driven by synchronous pulls.
///
/// A pipeline is pure description: combinators wrap the producer factory and
/// nothing touches the source until a terminal drive. Cloning shares the
/// description (and, for a single-pass source, the one producer slot).
pub struct Pipeline<T> {
    factory: SourceFactory<T>,
    restartable: bool,
}

impl<T: Send + 'static> Pipeline<T> {
    /// The structurally empty pipeline. Driving it never opens anything.
    pub const fn empty() -> Self {
        Self { factory: SourceFactory::Empty, restartable: true }
    }

    /// A restartable pipeline over an in-memory sequence.
    pub fn from_items(items: Vec<T>) -> Self
    where
        T: Clone + Sync,
    {
        if items.is_empty() {
            return Self::empty();
        }
        Self::from_factory(move || Box::new(IterProducer::new(items.clone().into_iter())))
    }

    /// A restartable pipeline opening a fresh iterator per drive.
    pub fn from_iter_factory<I>(make: impl Fn() -> I + Send + Sync + 'static) -> Self
    where
        I: Iterator<Item = T> + Send + 'static,
    {
        Self::from_factory(move || Box::new(IterProducer::new(make())))
    }

    /// A restartable pipeline opening a fresh producer per drive.
    pub fn from_factory(make: impl Fn() -> BoxProducer<T> + Send + Sync + 'static) -> Self {
        Self { factory: SourceFactory::Restartable(Arc::new(make)), restartable: true }
    }

    /// A single-pass pipeline over one already-built producer. The first
    /// drive consumes it; later drives see an exhausted source.
    pub fn once(producer: BoxProducer<T>) -> Self {
        Self { factory: SourceFactory::once(producer), restartable: false }
    }

    /// Adopts a raw source with immediate-pull capability as a single-pass
    /// pipeline. Suspension-only sources fail with [SeqError::NotIterable];
    /// they belong to [SuspendingPipeline::adopt].
    ///
    /// [SuspendingPipeline::adopt]: crate::pipeline::SuspendingPipeline::adopt
    pub fn adopt(raw: RawSource<T>) -> SeqResult<Self> {
        match raw {
            RawSource::Immediate(producer) => Ok(Self::once(producer)),
            RawSource::Suspending(_) | RawSource::Stream(_) => Err(SeqError::NotIterable),
            other => match Source::adapt(other)? {
                Source::Immediate(producer) => Ok(Self::once(producer)),
                Source::Suspending(_) => Err(SeqError::NotIterable),
            },
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
    pub fn open(&self) -> BoxProducer<T> {
        self.factory.open()
    }

    /// Lifts this pipeline into the suspending mirror.
    pub fn suspend(&self) -> crate::pipeline::SuspendingPipeline<T> {
        crate::pipeline::SuspendingPipeline::lift_from(self.factory.clone(), self.restartable)
    }

    /// Wraps the factory with one more stage. Empty parents stay empty.
    fn derive<U: Send + 'static>(
        &self,
        build: impl Fn(BoxProducer<T>) -> BoxProducer<U> + Send + Sync + 'static,
    ) -> Pipeline<U> {
        if self.is_empty() {
            return Pipeline::empty();
        }
        let parent = self.factory.clone();
        Pipeline {
            factory: SourceFactory::Restartable(Arc::new(move || build(parent.open()))),
            restartable: self.restartable,
        }
    }

    /// Transforms every element.
    pub fn map<U: Send + 'static>(&self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Pipeline<U> {
        let f: Arc<dyn Fn(T) -> U + Send + Sync> = Arc::new(f);
        self.derive(move |prev| Box::new(MapStage::new(prev, Arc::clone(&f))))
    }

    /// Keeps the elements matching the predicate.
    pub fn filter(&self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        let pred: Arc<dyn Fn(&T) -> bool + Send + Sync> = Arc::new(pred);
        self.derive(move |prev| Box::new(FilterStage::new(prev, Arc::clone(&pred))))
    }

    /// Expands every element into a pipeline, draining each expansion fully
    /// and in order.
    pub fn flat_map<U: Send + 'static>(
        &self,
        f: impl Fn(T) -> Pipeline<U> + Send + Sync + 'static,
    ) -> Pipeline<U> {
        let expand: Arc<dyn Fn(T) -> BoxProducer<U> + Send + Sync> =
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
            factory: SourceFactory::Restartable(Arc::new(move || {
                Box::new(ConcatStage::new(first.open(), second.open()))
            })),
            restartable: self.restartable && other.restartable,
        }
    }

    /// Keeps at most the first `n` elements. `take(0)` is the structural
    /// empty and never opens the source.
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

    /// Keeps the leading prefix matching the predicate; the first rejection
    /// ends the drive without further pulls.
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
    pub fn sliding(&self, size: usize, step: usize) -> Pipeline<Vec<T>>
    where
        T: Clone + Sync,
    {
        self.derive(move |prev| Box::new(SlidingStage::new(prev, size, step)))
    }

    /// Buckets the sequence at elements matching the separator predicate.
    pub fn split_where(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Pipeline<Vec<T>> {
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

    /// Pairs this pipeline with another, ending at the shorter one.
    pub fn zip<U: Send + 'static>(&self, other: &Pipeline<U>) -> Pipeline<(T, U)> {
        if self.is_empty() || other.is_empty() {
            return Pipeline::empty();
        }
        let (left, right) = (self.factory.clone(), other.factory.clone());
        Pipeline {
            factory: SourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipPairStage::new(left.open(), right.open()))
            })),
            restartable: self.restartable && other.restartable,
        }
    }

    /// Zips N pipelines into position tuples, ending at the shortest input.
    pub fn zip_many(inputs: Vec<Self>) -> Pipeline<Vec<T>> {
        if inputs.is_empty() || inputs.iter().any(Self::is_empty) {
            return Pipeline::empty();
        }
        let restartable = inputs.iter().all(Self::is_restartable);
        let factories: Vec<SourceFactory<T>> = inputs.into_iter().map(|p| p.factory).collect();
        Pipeline {
            factory: SourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipManyStage::new(factories.iter().map(SourceFactory::open).collect()))
            })),
            restartable,
        }
    }

    /// Zips N pipelines until all are exhausted; exhausted positions yield
    /// `None` markers.
    pub fn zip_all(inputs: Vec<Self>) -> Pipeline<Vec<Option<T>>> {
        if inputs.is_empty() || inputs.iter().all(Self::is_empty) {
            return Pipeline::empty();
        }
        let restartable = inputs.iter().all(Self::is_restartable);
        let factories: Vec<SourceFactory<T>> = inputs.into_iter().map(|p| p.factory).collect();
        Pipeline {
            factory: SourceFactory::Restartable(Arc::new(move || {
                Box::new(ZipAllStage::new(factories.iter().map(SourceFactory::open).collect()))
            })),
            restartable,
        }
    }

    /// Round-robins N pipelines, stopping with the shortest input's round.
    pub fn interleave(inputs: Vec<Self>) -> Self {
        Self::zip_many(inputs).derive(|prev| {
            Box::new(FlatMapStage::new(
                prev,
                Arc::new(|round: Vec<T>| IterProducer::new(round.into_iter())),
            ))
        })
    }

    /// Round-robins N pipelines to full exhaustion, skipping finished inputs.
    pub fn interleave_all(inputs: Vec<Self>) -> Self {
        Self::zip_all(inputs).derive(|prev| {
            Box::new(FlatMapStage::new(
                prev,
                Arc::new(|round: Vec<Option<T>>| IterProducer::new(round.into_iter().flatten())),
            ))
        })
    }

    /// Round-robins N pipelines indefinitely, restarting each input from its
    /// beginning when it exhausts. Fails with [SeqError::NotRestartable] when
    /// any input is single-pass.
    pub fn interleave_round(inputs: Vec<Self>) -> SeqResult<Self> {
        if inputs.iter().any(|input| !input.is_restartable()) {
            return Err(SeqError::NotRestartable);
        }
        if inputs.iter().all(Self::is_empty) {
            return Ok(Self::empty());
        }
        let factories: Vec<SourceFactory<T>> = inputs.into_iter().map(|p| p.factory).collect();
        Ok(Self {
            factory: SourceFactory::Restartable(Arc::new(move || {
                let openers: Vec<Box<dyn Fn() -> BoxProducer<T> + Send + Sync>> = factories
                    .iter()
                    .map(|factory| {
                        let factory = factory.clone();
                        Box::new(move || factory.open())
                            as Box<dyn Fn() -> BoxProducer<T> + Send + Sync>
                    })
                    .collect();
                Box::new(InterleaveRoundStage::new(openers))
            })),
            restartable: true,
        })
    }

    /// Replays this pipeline `times` times, or indefinitely for `None`.
    /// Fails with [SeqError::NotRestartable] on a single-pass source.
    pub fn repeat(&self, times: Option<usize>) -> SeqResult<Self> {
        if !self.restartable {
            return Err(SeqError::NotRestartable);
        }
        if self.is_empty() || times == Some(0) {
            return Ok(Self::empty());
        }
        let parent = self.factory.clone();
        Ok(Self {
            factory: SourceFactory::Restartable(Arc::new(move || {
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

    /// Yields the running extraction of the folder after every element, as
    /// its own pipeline. Ends when the folder escapes.
    pub fn scan<S, R>(&self, folder: &Folder<T, S, R>) -> Pipeline<R>
    where
        S: Clone + Send + Sync + 'static,
        R: Send + 'static,
    {
        let folder = folder.clone();
        self.derive(move |prev| Box::new(ScanStage::new(prev, folder.clone())))
    }

    /// Collects every element into a vector.
    pub fn collect(&self) -> SeqResult<Vec<T>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut producer = self.open();
        let mut out = Vec::new();
        while let Some(item) = producer.pull()? {
            out.push(item);
        }
        trace!(target: "pipeline", collected = out.len(), "collect drive complete");
        Ok(out)
    }

    /// Returns the first element, failing with
    /// [SeqError::EmptySequenceUnsupported] when there is none.
    pub fn first(&self) -> SeqResult<T> {
        if self.is_empty() {
            return Err(SeqError::EmptySequenceUnsupported);
        }
        self.open().pull()?.ok_or(SeqError::EmptySequenceUnsupported)
    }

    /// Returns the first element, or the default when there is none.
    pub fn first_or(&self, default: T) -> SeqResult<T> {
        if self.is_empty() {
            return Ok(default);
        }
        Ok(self.open().pull()?.unwrap_or(default))
    }

    /// Returns the last element, if any.
    pub fn last(&self) -> SeqResult<Option<T>> {
        if self.is_empty() {
            return Ok(None);
        }
        let mut producer = self.open();
        let mut last = None;
        while let Some(item) = producer.pull()? {
            last = Some(item);
        }
        Ok(last)
    }

    /// Counts the elements.
    pub fn count(&self) -> SeqResult<u64> {
        if self.is_empty() {
            return Ok(0);
        }
        let mut producer = self.open();
        let mut n = 0;
        while producer.pull()?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Drives the folder over this pipeline.
    ///
    /// When the folder escapes on its initial state, the extraction is
    /// returned without opening the source at all; otherwise the escape is
    /// re-checked after every step and the drive stops pulling the moment it
    /// holds.
    pub fn fold<S: Clone, R>(&self, folder: &Folder<T, S, R>) -> SeqResult<R> {
        let mut state = folder.init_state();
        if folder.escaped(&state) || self.is_empty() {
            return Ok(folder.extract(&state));
        }
        let mut producer = self.open();
        let mut index = 0;
        while let Some(item) = producer.pull()? {
            state = folder.run_step(state, item, index);
            index += 1;
            if folder.escaped(&state) {
                break;
            }
        }
        trace!(target: "pipeline", steps = index, "fold drive complete");
        Ok(folder.extract(&state))
    }
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self { factory: self.factory.clone(), restartable: self.restartable }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("factory", &self.factory)
            .field("restartable", &self.restartable)
            .finish()
    }
}
