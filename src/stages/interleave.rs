//! The restarting round-robin merge stage.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, vec::Vec};
use async_trait::async_trait;
use core::fmt;
use tracing::debug;

/// Round-robins over N restartable inputs, reopening each input from its
/// beginning whenever it exhausts.
///
/// An input that reopens onto an empty source is retired permanently; the
/// stage ends once every input has been retired. Over non-empty inputs the
/// stage is unbounded.
pub struct InterleaveRoundStage<P, F> {
    openers: Vec<F>,
    live: Vec<Option<P>>,
    cursor: usize,
}

impl<P, F> InterleaveRoundStage<P, F>
where
    F: Fn() -> P,
{
    /// Creates a new [InterleaveRoundStage] over the given input openers.
    pub fn new(openers: Vec<F>) -> Self {
        let live = openers.iter().map(|open| Some(open())).collect();
        Self { openers, live, cursor: 0 }
    }

    fn retire(&mut self, slot: usize) {
        self.live[slot] = None;
        debug!(target: "interleave", slot, "retired input that restarted empty");
    }
}

impl<P, F> Producer for InterleaveRoundStage<P, F>
where
    P: Producer,
    F: Fn() -> P,
{
    type Item = P::Item;

    fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        let slots = self.live.len();
        let mut checked = 0;
        while checked < slots {
            let slot = self.cursor;
            self.cursor = (self.cursor + 1) % slots;
            checked += 1;
            let Some(input) = self.live[slot].as_mut() else {
                continue;
            };
            if let Some(item) = input.pull()? {
                return Ok(Some(item));
            }
            // Exhausted mid-round: reopen from the start and try once more.
            let mut reopened = (self.openers[slot])();
            match reopened.pull()? {
                Some(item) => {
                    self.live[slot] = Some(reopened);
                    return Ok(Some(item));
                }
                None => self.retire(slot),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<P, F> SuspendingProducer for InterleaveRoundStage<P, F>
where
    P: SuspendingProducer,
    F: Fn() -> P + Send,
{
    type Item = P::Item;

    async fn pull(&mut self) -> SeqResult<Option<Self::Item>> {
        let slots = self.live.len();
        let mut checked = 0;
        while checked < slots {
            let slot = self.cursor;
            self.cursor = (self.cursor + 1) % slots;
            checked += 1;
            let Some(input) = self.live[slot].as_mut() else {
                continue;
            };
            if let Some(item) = input.pull().await? {
                return Ok(Some(item));
            }
            let mut reopened = (self.openers[slot])();
            match reopened.pull().await? {
                Some(item) => {
                    self.live[slot] = Some(reopened);
                    return Ok(Some(item));
                }
                None => self.retire(slot),
            }
        }
        Ok(None)
    }
}

impl<P, F> fmt::Debug for InterleaveRoundStage<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterleaveRoundStage")
            .field("inputs", &self.openers.len())
            .field("live", &self.live.iter().filter(|slot| slot.is_some()).count())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::vec;
    use alloc::vec::Vec;

    type Opener = fn() -> IterProducer<core::ops::Range<i32>>;

    #[test]
    fn test_round_robin_restarts_shorter_inputs() {
        let openers: Vec<Opener> = vec![|| IterProducer::new(0..2), || IterProducer::new(10..11)];
        let mut stage = InterleaveRoundStage::new(openers);
        let mut out = Vec::new();
        for _ in 0..8 {
            out.push(stage.pull().unwrap().unwrap());
        }
        // The one-element input restarts every round.
        assert_eq!(out, vec![0, 10, 1, 10, 0, 10, 1, 10]);
    }

    #[test]
    fn test_empty_inputs_are_retired() {
        let openers: Vec<Opener> = vec![|| IterProducer::new(0..0), || IterProducer::new(0..0)];
        let mut stage = InterleaveRoundStage::new(openers);
        assert_eq!(stage.pull(), Ok(None));
        assert_eq!(stage.pull(), Ok(None));
    }

    #[test]
    fn test_no_inputs_is_empty() {
        let mut stage = InterleaveRoundStage::<_, Opener>::new(Vec::new());
        assert_eq!(stage.pull(), Ok(None));
    }
}
