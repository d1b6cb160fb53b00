//! The separator-driven bucketing stage.

use crate::{
    errors::SeqResult,
    stages::ArcPred,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, vec::Vec};
use async_trait::async_trait;
use core::fmt;

/// Accumulates elements into buckets, emitting the bucket built so far at
/// every element matching the separator predicate.
///
/// The separator itself is consumed. A trailing empty bucket is emitted only
/// when the source ended directly after a separator; a wholly empty source
/// emits nothing.
pub struct SplitStage<P, T> {
    prev: P,
    pred: ArcPred<T>,
    last_was_split: bool,
    done: bool,
}

impl<P, T> SplitStage<P, T> {
    /// Creates a new [SplitStage] over the previous producer.
    pub fn new(prev: P, pred: ArcPred<T>) -> Self {
        Self { prev, pred, last_was_split: false, done: false }
    }

    /// Ends the stage at source exhaustion.
    fn finish(&mut self, bucket: Vec<T>) -> Option<Vec<T>> {
        self.done = true;
        if !bucket.is_empty() {
            return Some(bucket);
        }
        if self.last_was_split {
            return Some(Vec::new());
        }
        None
    }
}

impl<P, T> Producer for SplitStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = Vec<T>;

    fn pull(&mut self) -> SeqResult<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        let mut bucket = Vec::new();
        loop {
            match self.prev.pull()? {
                Some(item) if (self.pred)(&item) => {
                    self.last_was_split = true;
                    return Ok(Some(bucket));
                }
                Some(item) => {
                    self.last_was_split = false;
                    bucket.push(item);
                }
                None => return Ok(self.finish(bucket)),
            }
        }
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for SplitStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = Vec<T>;

    async fn pull(&mut self) -> SeqResult<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        let mut bucket = Vec::new();
        loop {
            match self.prev.pull().await? {
                Some(item) if (self.pred)(&item) => {
                    self.last_was_split = true;
                    return Ok(Some(bucket));
                }
                Some(item) => {
                    self.last_was_split = false;
                    bucket.push(item);
                }
                None => return Ok(self.finish(bucket)),
            }
        }
    }
}

impl<P, T> fmt::Debug for SplitStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitStage")
            .field("last_was_split", &self.last_was_split)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::sync::Arc;
    use alloc::vec;

    fn buckets(items: Vec<i32>) -> Vec<Vec<i32>> {
        let mut stage =
            SplitStage::new(IterProducer::new(items.into_iter()), Arc::new(|n: &i32| *n == 0));
        let mut out = Vec::new();
        while let Some(bucket) = stage.pull().unwrap() {
            out.push(bucket);
        }
        out
    }

    #[test]
    fn test_separators_bound_buckets() {
        assert_eq!(buckets(vec![1, 2, 0, 3]), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_adjacent_separators_emit_empty_buckets() {
        assert_eq!(buckets(vec![1, 0, 0, 2]), vec![vec![1], vec![], vec![2]]);
    }

    #[test]
    fn test_trailing_separator_emits_trailing_empty_bucket() {
        assert_eq!(buckets(vec![1, 0]), vec![vec![1], vec![]]);
    }

    #[test]
    fn test_lone_separator_emits_two_empty_buckets() {
        assert_eq!(buckets(vec![0]), vec![vec![], vec![]]);
    }

    #[test]
    fn test_empty_source_emits_nothing() {
        assert_eq!(buckets(vec![]), Vec::<Vec<i32>>::new());
    }
}
