//! Sequential composition stages: appending one producer after another and
//! replaying a restartable source for a bounded or unbounded cycle count.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::boxed::Box;
use async_trait::async_trait;
use core::fmt;

/// Drains the first producer, then the second.
#[derive(Debug)]
pub struct ConcatStage<A, B> {
    first: Option<A>,
    second: B,
}

impl<A, B> ConcatStage<A, B> {
    /// Creates a new [ConcatStage] over the two producers.
    pub const fn new(first: A, second: B) -> Self {
        Self { first: Some(first), second }
    }
}

impl<A, B> Producer for ConcatStage<A, B>
where
    A: Producer,
    B: Producer<Item = A::Item>,
{
    type Item = A::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if let Some(first) = self.first.as_mut() {
            if let Some(item) = first.pull()? {
                return Ok(Some(item));
            }
            self.first = None;
        }
        self.second.pull()
    }
}

#[async_trait]
impl<A, B> SuspendingProducer for ConcatStage<A, B>
where
    A: SuspendingProducer,
    B: SuspendingProducer<Item = A::Item>,
{
    type Item = A::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if let Some(first) = self.first.as_mut() {
            if let Some(item) = first.pull().await? {
                return Ok(Some(item));
            }
            self.first = None;
        }
        self.second.pull().await
    }
}

/// Replays a restartable source for `times` cycles, or indefinitely when no
/// bound is given.
///
/// A cycle that opens onto an already-exhausted source ends the stage, so an
/// unbounded repeat of an empty source terminates instead of spinning.
pub struct RepeatStage<P, F> {
    open: F,
    current: Option<P>,
    remaining: Option<usize>,
    done: bool,
}

impl<P, F> RepeatStage<P, F>
where
    F: Fn() -> P,
{
    /// Creates a new [RepeatStage]. `times` of `None` repeats without bound.
    pub fn new(open: F, times: Option<usize>) -> Self {
        Self { open, current: None, remaining: times, done: false }
    }

    /// Opens the next cycle, consuming one unit of the budget. Returns false
    /// when the budget is spent.
    fn next_cycle(&mut self) -> bool {
        match self.remaining.as_mut() {
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                self.current = Some((self.open)());
                true
            }
            None => {
                self.current = Some((self.open)());
                true
            }
        }
    }
}

impl<P, F> Producer for RepeatStage<P, F>
where
    P: Producer,
    F: Fn() -> P,
{
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let fresh = if self.current.is_none() {
                if !self.next_cycle() {
                    self.done = true;
                    return Ok(None);
                }
                true
            } else {
                false
            };
            match self.current.as_mut().map(Producer::pull).transpose()?.flatten() {
                Some(item) => return Ok(Some(item)),
                None if fresh => {
                    // The source restarted empty. Stop instead of cycling
                    // forever over nothing.
                    self.done = true;
                    return Ok(None);
                }
                None => self.current = None,
            }
        }
    }
}

#[async_trait]
impl<P, F> SuspendingProducer for RepeatStage<P, F>
where
    P: SuspendingProducer,
    F: Fn() -> P + Send,
{
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let fresh = if self.current.is_none() {
                if !self.next_cycle() {
                    self.done = true;
                    return Ok(None);
                }
                true
            } else {
                false
            };
            let pulled = match self.current.as_mut() {
                Some(current) => current.pull().await?,
                None => None,
            };
            match pulled {
                Some(item) => return Ok(Some(item)),
                None if fresh => {
                    self.done = true;
                    return Ok(None);
                }
                None => self.current = None,
            }
        }
    }
}

impl<P, F> fmt::Debug for RepeatStage<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatStage")
            .field("remaining", &self.remaining)
            .field("active_cycle", &self.current.is_some())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::vec;
    use alloc::vec::Vec;

    fn drain<P: Producer>(mut stage: P) -> Vec<P::Item> {
        let mut out = Vec::new();
        while let Some(item) = stage.pull().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_concat_appends_second_after_first() {
        let stage = ConcatStage::new(IterProducer::new(0..2), IterProducer::new(10..12));
        assert_eq!(drain(stage), vec![0, 1, 10, 11]);
    }

    #[test]
    fn test_concat_with_empty_first_passes_through() {
        let stage = ConcatStage::new(IterProducer::new(0..0), IterProducer::new(5..7));
        assert_eq!(drain(stage), vec![5, 6]);
    }

    #[test]
    fn test_repeat_replays_bounded_cycles() {
        let stage = RepeatStage::new(|| IterProducer::new(0..3), Some(2));
        assert_eq!(drain(stage), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_repeat_zero_times_is_empty() {
        let mut stage = RepeatStage::new(|| IterProducer::new(0..3), Some(0));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_unbounded_repeat_of_empty_source_terminates() {
        let mut stage = RepeatStage::new(|| IterProducer::new(0..0), None);
        assert_eq!(stage.pull(), Ok(None));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_unbounded_repeat_keeps_cycling() {
        let mut stage = RepeatStage::new(|| IterProducer::new(0..2), None);
        let mut out = Vec::new();
        for _ in 0..6 {
            out.push(stage.pull().unwrap().unwrap());
        }
        assert_eq!(out, vec![0, 1, 0, 1, 0, 1]);
    }
}
