//! The intake probe that normalizes raw sources into canonical producers.

use crate::{
    errors::{SeqError, SeqResult},
    sources::{IterProducer, StreamProducer},
    traits::{BoxProducer, BoxSuspendingProducer},
};
use alloc::{boxed::Box, vec::Vec};
use core::fmt;
use futures::stream::BoxStream;
use tracing::warn;

/// The closed set of source kinds accepted by the adapter.
///
/// Capability detection is a single match over this tag, performed once at
/// adaptation time and never re-probed per pull.
pub enum RawSource<T> {
    /// A finite in-memory sequence.
    Items(Vec<T>),
    /// An external generator with synchronous pull semantics.
    Iter(Box<dyn Iterator<Item = T> + Send>),
    /// An already-canonical immediate producer.
    Immediate(BoxProducer<T>),
    /// An already-canonical suspending producer.
    Suspending(BoxSuspendingProducer<T>),
    /// A stream with suspension-based pull semantics.
    Stream(BoxStream<'static, T>),
}

impl<T> RawSource<T> {
    /// Returns whether this source kind supports synchronous pulls.
    pub const fn has_immediate_pull(&self) -> bool {
        matches!(self, Self::Items(_) | Self::Iter(_) | Self::Immediate(_))
    }

    /// Returns whether this source kind supports suspending pulls.
    pub const fn has_suspending_pull(&self) -> bool {
        matches!(self, Self::Suspending(_) | Self::Stream(_))
    }

    /// Returns whether this source is already in a canonical producer form.
    pub const fn is_canonical(&self) -> bool {
        matches!(self, Self::Immediate(_) | Self::Suspending(_))
    }
}

impl<T> fmt::Debug for RawSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Items(items) => return f.debug_tuple("Items").field(&items.len()).finish(),
            Self::Iter(_) => "Iter",
            Self::Immediate(_) => "Immediate",
            Self::Suspending(_) => "Suspending",
            Self::Stream(_) => "Stream",
        };
        f.debug_tuple(kind).finish()
    }
}

/// A canonical producer, tagged by drive mode.
///
/// The tag is assigned exactly once, by [Source::adapt]; downstream code
/// matches on it structurally instead of probing capabilities again.
pub enum Source<T> {
    /// A producer that completes every pull synchronously.
    Immediate(BoxProducer<T>),
    /// A producer whose pulls may suspend.
    Suspending(BoxSuspendingProducer<T>),
}

impl<T: Send + 'static> Source<T> {
    /// Adapts a raw source into its canonical form.
    ///
    /// Already-canonical producers are detected and rejected with
    /// [SeqError::RedundantWrap]: adaptation must never stack a second
    /// wrapper on a producer that has been through the probe before.
    pub fn adapt(raw: RawSource<T>) -> SeqResult<Self> {
        match raw {
            RawSource::Items(items) => {
                Ok(Self::Immediate(Box::new(IterProducer::new(items.into_iter()))))
            }
            RawSource::Iter(iter) => Ok(Self::Immediate(Box::new(IterProducer::new(iter)))),
            RawSource::Stream(stream) => Ok(Self::Suspending(Box::new(StreamProducer::new(stream)))),
            RawSource::Immediate(_) | RawSource::Suspending(_) => {
                warn!(target: "adapter", "rejected re-adaptation of a canonical producer");
                Err(SeqError::RedundantWrap)
            }
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Immediate(_) => f.debug_tuple("Immediate").finish(),
            Self::Suspending(_) => f.debug_tuple("Suspending").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Producer;
    use alloc::vec;
    use futures::StreamExt;

    #[test]
    fn test_adapt_items_is_immediate() {
        let source = Source::adapt(RawSource::Items(vec![1, 2, 3])).unwrap();
        let Source::Immediate(mut producer) = source else {
            panic!("expected an immediate source");
        };
        assert_eq!(producer.pull(), Ok(Some(1)));
    }

    #[test]
    fn test_adapt_stream_is_suspending() {
        let stream = futures::stream::iter(vec![1]).boxed();
        let source = Source::adapt(RawSource::Stream(stream)).unwrap();
        assert!(matches!(source, Source::Suspending(_)));
    }

    #[test]
    fn test_adapt_rejects_canonical_producer() {
        let canonical = Source::adapt(RawSource::Items(vec![1])).unwrap();
        let Source::Immediate(producer) = canonical else {
            panic!("expected an immediate source");
        };
        let result = Source::adapt(RawSource::Immediate(producer));
        assert_eq!(result.unwrap_err(), SeqError::RedundantWrap);
    }

    #[test]
    fn test_capability_flags() {
        assert!(RawSource::Items(vec![1]).has_immediate_pull());
        let stream = futures::stream::iter(vec![1]).boxed();
        let raw = RawSource::Stream(stream);
        assert!(raw.has_suspending_pull());
        assert!(!raw.has_immediate_pull());
    }
}
