//! The core reducer value.

use alloc::sync::Arc;
use core::fmt;

/// An incremental reduction from a sequence of `T` to a result `R` through an
/// internal state `S`.
///
/// A [Folder] is pure configuration: the initial state is cloned at the start
/// of every drive, so one folder value can be handed to any number of drives,
/// combined with other folders, or wrapped by input combinators, without
/// interference.
///
/// The step function receives the running state, the next element, and the
/// element's 0-based position. The optional escape predicate is consulted on
/// the initial state and again after every step; the moment it holds, the
/// drive stops pulling. The optional monitor callback observes every step
/// synchronously with the element index and the running extraction.
pub struct Folder<T, S, R> {
    pub(crate) init: S,
    pub(crate) step: Arc<dyn Fn(S, T, u64) -> S + Send + Sync>,
    pub(crate) extract: Arc<dyn Fn(&S) -> R + Send + Sync>,
    pub(crate) escape: Option<Arc<dyn Fn(&S) -> bool + Send + Sync>>,
    pub(crate) monitor: Option<Arc<dyn Fn(u64, &R) + Send + Sync>>,
}

impl<T, S: Clone + 'static> Folder<T, S, S> {
    /// Creates a folder whose result is its accumulator.
    pub fn new(init: S, step: impl Fn(S, T, u64) -> S + Send + Sync + 'static) -> Self {
        Self {
            init,
            step: Arc::new(step),
            extract: Arc::new(S::clone),
            escape: None,
            monitor: None,
        }
    }
}

impl<T, S, R> Folder<T, S, R> {
    /// Creates a folder with a distinct extraction from state to result.
    pub fn with_extract(
        init: S,
        step: impl Fn(S, T, u64) -> S + Send + Sync + 'static,
        extract: impl Fn(&S) -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            init,
            step: Arc::new(step),
            extract: Arc::new(extract),
            escape: None,
            monitor: None,
        }
    }

    /// Attaches the early-termination predicate.
    pub fn with_escape(mut self, escape: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        self.escape = Some(Arc::new(escape));
        self
    }

    /// Attaches a per-step observer of the element index and the running
    /// extraction.
    pub fn with_monitor(mut self, monitor: impl Fn(u64, &R) + Send + Sync + 'static) -> Self {
        self.monitor = Some(Arc::new(monitor));
        self
    }

    /// Clones the initial state for a fresh drive.
    pub(crate) fn init_state(&self) -> S
    where
        S: Clone,
    {
        self.init.clone()
    }

    /// Advances the state by one element, firing the monitor if attached.
    pub(crate) fn run_step(&self, state: S, item: T, index: u64) -> S {
        let next = (self.step)(state, item, index);
        if let Some(monitor) = &self.monitor {
            monitor(index, &(self.extract)(&next));
        }
        next
    }

    pub(crate) fn escaped(&self, state: &S) -> bool {
        self.escape.as_ref().is_some_and(|escape| escape(state))
    }

    pub(crate) fn extract(&self, state: &S) -> R {
        (self.extract)(state)
    }
}

impl<T, S: Clone, R> Clone for Folder<T, S, R> {
    fn clone(&self) -> Self {
        Self {
            init: self.init.clone(),
            step: Arc::clone(&self.step),
            extract: Arc::clone(&self.extract),
            escape: self.escape.clone(),
            monitor: self.monitor.clone(),
        }
    }
}

impl<T, S: fmt::Debug, R> fmt::Debug for Folder<T, S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("init", &self.init)
            .field("escapes", &self.escape.is_some())
            .field("monitored", &self.monitor.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicU64, Ordering};

    fn drive<T, S: Clone, R>(folder: &Folder<T, S, R>, items: Vec<T>) -> R {
        let mut state = folder.init_state();
        for (i, item) in items.into_iter().enumerate() {
            if folder.escaped(&state) {
                break;
            }
            state = folder.run_step(state, item, i as u64);
        }
        folder.extract(&state)
    }

    #[test]
    fn test_accumulator_folder_clones_state_as_result() {
        let sum = Folder::new(0u64, |acc, n: u64, _| acc + n);
        assert_eq!(drive(&sum, alloc::vec![1, 2, 3, 4]), 10);
    }

    #[test]
    fn test_step_sees_element_positions() {
        let indexed = Folder::new(Vec::new(), |mut acc: Vec<u64>, _: char, i| {
            acc.push(i);
            acc
        });
        assert_eq!(drive(&indexed, alloc::vec!['a', 'b', 'c']), alloc::vec![0, 1, 2]);
    }

    #[test]
    fn test_escape_halts_the_drive() {
        let bounded =
            Folder::new(0u64, |acc, n: u64, _| acc + n).with_escape(|total| *total >= 3);
        assert_eq!(drive(&bounded, alloc::vec![1, 2, 50, 50]), 3);
    }

    #[test]
    fn test_monitor_observes_every_step() {
        static STEPS: AtomicU64 = AtomicU64::new(0);
        let sum = Folder::new(0u64, |acc, n: u64, _| acc + n)
            .with_monitor(|_, running| {
                STEPS.fetch_add(*running, Ordering::Relaxed);
            });
        assert_eq!(drive(&sum, alloc::vec![1, 2, 3]), 6);
        // Running extractions 1, 3, 6.
        assert_eq!(STEPS.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_reuse_starts_from_a_fresh_state() {
        let sum = Folder::new(0u64, |acc, n: u64, _| acc + n);
        assert_eq!(drive(&sum, alloc::vec![1, 2]), 3);
        assert_eq!(drive(&sum, alloc::vec![1, 2]), 3);
    }
}
