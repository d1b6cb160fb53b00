//! Producer slots backing pipelines: structurally empty, restartable through
//! a factory, or a single-pass producer wrapped exactly once.

use crate::{
    sources::{IterProducer, LiftProducer},
    traits::{BoxProducer, BoxSuspendingProducer},
};
use alloc::{boxed::Box, sync::Arc};
use core::fmt;
use spin::Mutex;

/// The producer slot behind an immediate pipeline.
pub(crate) enum SourceFactory<T> {
    /// The structurally empty source. Opening it never touches anything.
    Empty,
    /// A factory of fresh producers; every open starts from the beginning.
    Restartable(Arc<dyn Fn() -> BoxProducer<T> + Send + Sync>),
    /// A single-pass producer wrapped once. After the slot is taken the
    /// pipeline exhausts permanently.
    Once(Arc<Mutex<Option<BoxProducer<T>>>>),
}

impl<T: Send + 'static> SourceFactory<T> {
    pub(crate) fn once(producer: BoxProducer<T>) -> Self {
        Self::Once(Arc::new(Mutex::new(Some(producer))))
    }

    pub(crate) fn open(&self) -> BoxProducer<T> {
        match self {
            Self::Empty => Box::new(IterProducer::new(core::iter::empty())),
            Self::Restartable(factory) => factory(),
            Self::Once(slot) => slot
                .lock()
                .take()
                .unwrap_or_else(|| Box::new(IterProducer::new(core::iter::empty()))),
        }
    }

    pub(crate) const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<T> Clone for SourceFactory<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Restartable(factory) => Self::Restartable(Arc::clone(factory)),
            // Clones share the slot: the producer is still consumed once.
            Self::Once(slot) => Self::Once(Arc::clone(slot)),
        }
    }
}

impl<T> fmt::Debug for SourceFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Empty => "Empty",
            Self::Restartable(_) => "Restartable",
            Self::Once(_) => "Once",
        };
        f.debug_tuple(kind).finish()
    }
}

/// The producer slot behind a suspending pipeline.
pub(crate) enum SuspendingSourceFactory<T> {
    /// The structurally empty source.
    Empty,
    /// A factory of fresh suspending producers.
    Restartable(Arc<dyn Fn() -> BoxSuspendingProducer<T> + Send + Sync>),
    /// A single-pass suspending producer wrapped once.
    Once(Arc<Mutex<Option<BoxSuspendingProducer<T>>>>),
}

impl<T: Send + 'static> SuspendingSourceFactory<T> {
    pub(crate) fn once(producer: BoxSuspendingProducer<T>) -> Self {
        Self::Once(Arc::new(Mutex::new(Some(producer))))
    }

    pub(crate) fn open(&self) -> BoxSuspendingProducer<T> {
        match self {
            Self::Empty => Box::new(LiftProducer::new(IterProducer::new(core::iter::empty()))),
            Self::Restartable(factory) => factory(),
            Self::Once(slot) => slot.lock().take().unwrap_or_else(|| {
                Box::new(LiftProducer::new(IterProducer::new(core::iter::empty())))
            }),
        }
    }

    pub(crate) const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<T> Clone for SuspendingSourceFactory<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Restartable(factory) => Self::Restartable(Arc::clone(factory)),
            Self::Once(slot) => Self::Once(Arc::clone(slot)),
        }
    }
}

impl<T> fmt::Debug for SuspendingSourceFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Empty => "Empty",
            Self::Restartable(_) => "Restartable",
            Self::Once(_) => "Once",
        };
        f.debug_tuple(kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Producer;
    use alloc::vec;

    #[test]
    fn test_once_slot_exhausts_permanently() {
        let factory =
            SourceFactory::once(Box::new(IterProducer::new(vec![1, 2].into_iter())));
        let mut first = factory.open();
        assert_eq!(first.pull(), Ok(Some(1)));
        // The slot was taken; a second open sees a permanently exhausted source.
        let mut second = factory.open();
        assert_eq!(second.pull(), Ok(None));
    }

    #[test]
    fn test_restartable_factory_reopens_from_start() {
        let factory: SourceFactory<i32> = SourceFactory::Restartable(Arc::new(|| {
            Box::new(IterProducer::new(vec![1, 2].into_iter()))
        }));
        assert_eq!(factory.open().pull(), Ok(Some(1)));
        assert_eq!(factory.open().pull(), Ok(Some(1)));
    }
}
