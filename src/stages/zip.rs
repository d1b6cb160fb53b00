//! Lock-step combination stages over multiple producers.
//!
//! On the suspending side, each step fires the pulls for every still-active
//! input concurrently and waits for all of them, so independent latencies are
//! not serialized; the emitted tuple order stays fixed regardless of
//! resolution order.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, vec::Vec};
use async_trait::async_trait;
use core::fmt;
use futures::future::{join, join_all};

/// Zips two producers into pairs, ending when either is exhausted.
#[derive(Debug)]
pub struct ZipPairStage<A, B> {
    left: A,
    right: B,
    done: bool,
}

impl<A, B> ZipPairStage<A, B> {
    /// Creates a new [ZipPairStage] over the two producers.
    pub const fn new(left: A, right: B) -> Self {
        Self { left, right, done: false }
    }
}

impl<A: Producer, B: Producer> Producer for ZipPairStage<A, B> {
    type Item = (A::Item, B::Item);

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        // One pull from each input per step, even when the first is exhausted.
        let left = self.left.pull()?;
        let right = self.right.pull()?;
        match (left, right) {
            (Some(left), Some(right)) => Ok(Some((left, right))),
            _ => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<A: SuspendingProducer, B: SuspendingProducer> SuspendingProducer for ZipPairStage<A, B> {
    type Item = (A::Item, B::Item);

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        let (left, right) = join(self.left.pull(), self.right.pull()).await;
        match (left?, right?) {
            (Some(left), Some(right)) => Ok(Some((left, right))),
            _ => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// Zips N same-typed producers, ending as soon as any one is exhausted.
#[derive(Debug)]
pub struct ZipManyStage<P> {
    inputs: Vec<P>,
    done: bool,
}

impl<P> ZipManyStage<P> {
    /// Creates a new [ZipManyStage] over the given producers.
    pub const fn new(inputs: Vec<P>) -> Self {
        Self { inputs, done: false }
    }
}

impl<P: Producer> Producer for ZipManyStage<P> {
    type Item = Vec<P::Item>;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done || self.inputs.is_empty() {
            return Ok(None);
        }
        let mut tuple = Vec::with_capacity(self.inputs.len());
        for input in &mut self.inputs {
            match input.pull()? {
                Some(item) => tuple.push(item),
                None => self.done = true,
            }
        }
        if self.done {
            return Ok(None);
        }
        Ok(Some(tuple))
    }
}

#[async_trait]
impl<P: SuspendingProducer> SuspendingProducer for ZipManyStage<P> {
    type Item = Vec<P::Item>;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done || self.inputs.is_empty() {
            return Ok(None);
        }
        let pulls = join_all(self.inputs.iter_mut().map(|input| input.pull())).await;
        let mut tuple = Vec::with_capacity(pulls.len());
        for pulled in pulls {
            match pulled? {
                Some(item) => tuple.push(item),
                None => self.done = true,
            }
        }
        if self.done {
            return Ok(None);
        }
        Ok(Some(tuple))
    }
}

/// Zips N same-typed producers until all are exhausted, marking exhausted
/// positions with `None` in still-active steps.
pub struct ZipAllStage<P> {
    inputs: Vec<P>,
    finished: Vec<bool>,
}

impl<P> ZipAllStage<P> {
    /// Creates a new [ZipAllStage] over the given producers.
    pub fn new(inputs: Vec<P>) -> Self {
        let finished = alloc::vec![false; inputs.len()];
        Self { inputs, finished }
    }
}

impl<P: Producer> Producer for ZipAllStage<P> {
    type Item = Vec<Option<P::Item>>;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.inputs.is_empty() || self.finished.iter().all(|done| *done) {
            return Ok(None);
        }
        let mut tuple = Vec::with_capacity(self.inputs.len());
        for (i, input) in self.inputs.iter_mut().enumerate() {
            if self.finished[i] {
                tuple.push(None);
                continue;
            }
            match input.pull()? {
                Some(item) => tuple.push(Some(item)),
                None => {
                    self.finished[i] = true;
                    tuple.push(None);
                }
            }
        }
        // The step where the last survivors all ran out carries no values.
        if tuple.iter().all(Option::is_none) {
            return Ok(None);
        }
        Ok(Some(tuple))
    }
}

#[async_trait]
impl<P: SuspendingProducer> SuspendingProducer for ZipAllStage<P> {
    type Item = Vec<Option<P::Item>>;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.inputs.is_empty() || self.finished.iter().all(|done| *done) {
            return Ok(None);
        }
        let finished = &self.finished;
        let pulls = join_all(self.inputs.iter_mut().enumerate().map(|(i, input)| {
            let skip = finished[i];
            async move {
                if skip {
                    Ok(None)
                } else {
                    input.pull().await
                }
            }
        }))
        .await;
        let mut tuple = Vec::with_capacity(pulls.len());
        for (i, pulled) in pulls.into_iter().enumerate() {
            match pulled? {
                Some(item) => tuple.push(Some(item)),
                None => {
                    if !self.finished[i] {
                        self.finished[i] = true;
                    }
                    tuple.push(None);
                }
            }
        }
        if tuple.iter().all(Option::is_none) {
            return Ok(None);
        }
        Ok(Some(tuple))
    }
}

impl<P> fmt::Debug for ZipAllStage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipAllStage")
            .field("inputs", &self.inputs.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::vec;

    #[test]
    fn test_zip_pair_stops_at_shorter_input() {
        let mut stage = ZipPairStage::new(IterProducer::new(0..4), IterProducer::new(10..12));
        assert_eq!(stage.pull(), Ok(Some((0, 10))));
        assert_eq!(stage.pull(), Ok(Some((1, 11))));
        assert_eq!(stage.pull(), Ok(None));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_zip_many_yields_fixed_order_tuples() {
        let mut stage = ZipManyStage::new(vec![
            IterProducer::new(0..3),
            IterProducer::new(10..13),
            IterProducer::new(20..23),
        ]);
        assert_eq!(stage.pull(), Ok(Some(vec![0, 10, 20])));
        assert_eq!(stage.pull(), Ok(Some(vec![1, 11, 21])));
        assert_eq!(stage.pull(), Ok(Some(vec![2, 12, 22])));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_zip_all_substitutes_absent_markers() {
        let mut stage = ZipAllStage::new(vec![IterProducer::new(0..4), IterProducer::new(10..12)]);
        assert_eq!(stage.pull(), Ok(Some(vec![Some(0), Some(10)])));
        assert_eq!(stage.pull(), Ok(Some(vec![Some(1), Some(11)])));
        assert_eq!(stage.pull(), Ok(Some(vec![Some(2), None])));
        assert_eq!(stage.pull(), Ok(Some(vec![Some(3), None])));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[tokio::test]
    async fn test_suspending_zip_pair_pulls_concurrently() {
        use crate::sources::LiftProducer;
        let mut stage = ZipPairStage::new(
            LiftProducer::new(IterProducer::new(0..2)),
            LiftProducer::new(IterProducer::new(10..14)),
        );
        assert_eq!(SuspendingProducer::pull(&mut stage).await, Ok(Some((0, 10))));
        assert_eq!(SuspendingProducer::pull(&mut stage).await, Ok(Some((1, 11))));
        assert_eq!(SuspendingProducer::pull(&mut stage).await, Ok(None));
    }
}
