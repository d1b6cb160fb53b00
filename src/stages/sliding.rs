//! The fixed-size windowing stage.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, collections::VecDeque, vec::Vec};
use async_trait::async_trait;
use core::fmt;

/// Yields fixed-size windows over the source, each shifted by `step` from the
/// previous one.
///
/// The final partial window is yielded only when it holds more than
/// `size - step` elements, i.e. when it contains at least one element that
/// was not part of the prior window.
pub struct SlidingStage<P, T> {
    prev: P,
    size: usize,
    step: usize,
    buf: VecDeque<T>,
    skip: usize,
    done: bool,
}

impl<P, T: Clone> SlidingStage<P, T> {
    /// Creates a new [SlidingStage]. `size` and `step` must be non-zero.
    pub fn new(prev: P, size: usize, step: usize) -> Self {
        assert!(size > 0, "sliding window size must be non-zero");
        assert!(step > 0, "sliding window step must be non-zero");
        Self { prev, size, step, buf: VecDeque::new(), skip: 0, done: false }
    }

    /// Ends the stage at source exhaustion, deciding whether the buffered
    /// tail qualifies as a final partial window.
    fn drain_partial(&mut self) -> Option<Vec<T>> {
        self.done = true;
        if !self.buf.is_empty() && self.buf.len() > self.size.saturating_sub(self.step) {
            Some(self.buf.drain(..).collect())
        } else {
            None
        }
    }

    /// Emits the full buffered window and advances the buffer by `step`.
    fn emit_full(&mut self) -> Vec<T> {
        let window: Vec<T> = self.buf.iter().cloned().collect();
        if self.step >= self.size {
            self.buf.clear();
            self.skip = self.step - self.size;
        } else {
            self.buf.drain(..self.step);
        }
        window
    }
}

impl<P, T> Producer for SlidingStage<P, T>
where
    P: Producer<Item = T>,
    T: Clone,
{
    type Item = Vec<T>;

    fn pull(&mut self) -> SeqResult<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        while self.skip > 0 {
            if self.prev.pull()?.is_none() {
                self.done = true;
                return Ok(None);
            }
            self.skip -= 1;
        }
        while self.buf.len() < self.size {
            match self.prev.pull()? {
                Some(item) => self.buf.push_back(item),
                None => return Ok(self.drain_partial()),
            }
        }
        Ok(Some(self.emit_full()))
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for SlidingStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Clone + Send,
{
    type Item = Vec<T>;

    async fn pull(&mut self) -> SeqResult<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        while self.skip > 0 {
            if self.prev.pull().await?.is_none() {
                self.done = true;
                return Ok(None);
            }
            self.skip -= 1;
        }
        while self.buf.len() < self.size {
            match self.prev.pull().await? {
                Some(item) => self.buf.push_back(item),
                None => return Ok(self.drain_partial()),
            }
        }
        Ok(Some(self.emit_full()))
    }
}

impl<P, T> fmt::Debug for SlidingStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingStage")
            .field("size", &self.size)
            .field("step", &self.step)
            .field("buffered", &self.buf.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::vec;

    fn windows(len: i32, size: usize, step: usize) -> Vec<Vec<i32>> {
        let mut stage = SlidingStage::new(IterProducer::new(0..len), size, step);
        let mut out = Vec::new();
        while let Some(window) = stage.pull().unwrap() {
            out.push(window);
        }
        out
    }

    #[test]
    fn test_disjoint_windows_keep_qualifying_tail() {
        assert_eq!(windows(8, 3, 3), vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7]]);
    }

    #[test]
    fn test_overlapping_windows_suppress_stale_tail() {
        // The would-be trailing [6, 7] holds no element outside the prior
        // window, so it is not emitted.
        assert_eq!(
            windows(8, 3, 1),
            vec![
                vec![0, 1, 2],
                vec![1, 2, 3],
                vec![2, 3, 4],
                vec![3, 4, 5],
                vec![4, 5, 6],
                vec![5, 6, 7]
            ]
        );
    }

    #[test]
    fn test_gapped_windows_skip_between_emissions() {
        assert_eq!(windows(9, 2, 4), vec![vec![0, 1], vec![4, 5], vec![8]]);
    }

    #[test]
    fn test_short_source_yields_single_partial() {
        assert_eq!(windows(2, 3, 3), vec![vec![0, 1]]);
    }

    #[test]
    fn test_empty_source_yields_nothing() {
        assert_eq!(windows(0, 3, 1), Vec::<Vec<i32>>::new());
    }
}
