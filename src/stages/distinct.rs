//! The key-based de-duplication stage.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, sync::Arc};
use async_trait::async_trait;
use core::{fmt, hash::Hash};
use hashbrown::HashSet;

/// Suppresses elements whose computed key has been seen before.
///
/// The seen-key set grows for the lifetime of one drive and is never pruned;
/// over an unbounded source this is an unbounded memory cost.
pub struct DistinctStage<P, T, K> {
    prev: P,
    key_fn: Arc<dyn Fn(&T) -> K + Send + Sync>,
    seen: HashSet<K>,
}

impl<P, T, K> DistinctStage<P, T, K> {
    /// Creates a new [DistinctStage] over the previous producer.
    pub fn new(prev: P, key_fn: Arc<dyn Fn(&T) -> K + Send + Sync>) -> Self {
        Self { prev, key_fn, seen: HashSet::new() }
    }
}

impl<P, T, K> Producer for DistinctStage<P, T, K>
where
    P: Producer<Item = T>,
    K: Hash + Eq,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            match self.prev.pull()? {
                Some(item) => {
                    if self.seen.insert((self.key_fn)(&item)) {
                        return Ok(Some(item));
                    }
                }
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl<P, T, K> SuspendingProducer for DistinctStage<P, T, K>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
    K: Hash + Eq + Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            match self.prev.pull().await? {
                Some(item) => {
                    if self.seen.insert((self.key_fn)(&item)) {
                        return Ok(Some(item));
                    }
                }
                None => return Ok(None),
            }
        }
    }
}

impl<P, T, K> fmt::Debug for DistinctStage<P, T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistinctStage").field("seen", &self.seen.len()).finish_non_exhaustive()
    }
}
