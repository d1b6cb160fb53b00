//! The running-fold view stage.

use crate::{
    errors::SeqResult,
    fold::Folder,
    traits::{Producer, SuspendingProducer},
};
use alloc::boxed::Box;
use async_trait::async_trait;
use core::fmt;

/// Threads a [Folder] over the source and yields the running extraction after
/// every step.
///
/// The stage ends when the source is exhausted or when the folder escapes; the
/// extraction of the escaping step is still yielded.
pub struct ScanStage<P, T, S, R> {
    prev: P,
    folder: Folder<T, S, R>,
    state: S,
    index: u64,
    done: bool,
}

impl<P, T, S: Clone, R> ScanStage<P, T, S, R> {
    /// Creates a new [ScanStage] over the previous producer.
    pub fn new(prev: P, folder: Folder<T, S, R>) -> Self {
        let state = folder.init_state();
        let done = folder.escaped(&state);
        Self { prev, folder, state, index: 0, done }
    }

    fn advance(&mut self, item: T) -> R {
        let state = core::mem::replace(&mut self.state, self.folder.init_state());
        self.state = self.folder.run_step(state, item, self.index);
        self.index += 1;
        if self.folder.escaped(&self.state) {
            self.done = true;
        }
        self.folder.extract(&self.state)
    }
}

impl<P, T, S, R> Producer for ScanStage<P, T, S, R>
where
    P: Producer<Item = T>,
    S: Clone,
{
    type Item = R;

    fn pull(&mut self) -> SeqResult<Option<R>> {
        if self.done {
            return Ok(None);
        }
        match self.prev.pull()? {
            Some(item) => Ok(Some(self.advance(item))),
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<P, T, S, R> SuspendingProducer for ScanStage<P, T, S, R>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
    S: Clone + Send,
    R: Send,
{
    type Item = R;

    async fn pull(&mut self) -> SeqResult<Option<R>> {
        if self.done {
            return Ok(None);
        }
        match self.prev.pull().await? {
            Some(item) => Ok(Some(self.advance(item))),
            None => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

impl<P, T, S, R> fmt::Debug for ScanStage<P, T, S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanStage")
            .field("index", &self.index)
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

    #[test]
    fn test_scan_yields_running_sums() {
        let folder = Folder::new(0i64, |acc, n: i64, _| acc + n);
        let mut stage = ScanStage::new(IterProducer::new(vec![1, 2, 3].into_iter()), folder);
        let mut out = Vec::new();
        while let Some(total) = stage.pull().unwrap() {
            out.push(total);
        }
        assert_eq!(out, vec![1, 3, 6]);
    }

    #[test]
    fn test_scan_stops_pulling_after_escape() {
        let folder =
            Folder::new(0i64, |acc, n: i64, _| acc + n).with_escape(|total: &i64| *total >= 3);
        let mut stage = ScanStage::new(IterProducer::new(1..), folder);
        assert_eq!(stage.pull(), Ok(Some(1)));
        assert_eq!(stage.pull(), Ok(Some(3)));
        // The escaping step was yielded; nothing further is pulled.
        assert_eq!(stage.pull(), Ok(None));
    }
}
