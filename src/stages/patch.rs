//! The windowed substitution primitive: predicate-triggered remove-and-insert
//! splicing over a sequence.

use crate::{
    errors::SeqResult,
    traits::{Producer, SuspendingProducer},
};
use alloc::{boxed::Box, collections::VecDeque, sync::Arc, vec::Vec};
use async_trait::async_trait;
use core::fmt;

/// Describes one substitution rule for [PatchStage] and
/// [Folder::patch_where_input].
///
/// When the predicate matches an element (and the application budget is not
/// exhausted), the rule removes `remove_count` elements starting with the
/// triggering element and splices in the insertion function's output, keyed
/// off the trigger and its input index, before normal passthrough resumes.
///
/// [Folder::patch_where_input]: crate::fold::Folder::patch_where_input
pub struct PatchRule<T> {
    pred: Arc<dyn Fn(&T, u64) -> bool + Send + Sync>,
    remove_count: usize,
    insert_fn: Option<Arc<dyn Fn(&T, u64) -> Vec<T> + Send + Sync>>,
    max_applications: Option<u64>,
}

impl<T> PatchRule<T> {
    /// Creates a rule triggering on elements matching `pred`, which receives
    /// the element and its 0-based input position.
    pub fn matching(pred: impl Fn(&T, u64) -> bool + Send + Sync + 'static) -> Self {
        Self { pred: Arc::new(pred), remove_count: 0, insert_fn: None, max_applications: None }
    }

    /// Removes `count` elements per application, the trigger included.
    pub fn remove(mut self, count: usize) -> Self {
        self.remove_count = count;
        self
    }

    /// Splices in the elements produced from the trigger and its index.
    pub fn insert(mut self, insert_fn: impl Fn(&T, u64) -> Vec<T> + Send + Sync + 'static) -> Self {
        self.insert_fn = Some(Arc::new(insert_fn));
        self
    }

    /// Bounds how many times the rule fires; zero degenerates to passthrough.
    pub const fn limit(mut self, max_applications: u64) -> Self {
        self.max_applications = Some(max_applications);
        self
    }

    pub(crate) fn fires(&self, item: &T, index: u64, applied: u64) -> bool {
        if let Some(max) = self.max_applications {
            if applied >= max {
                return false;
            }
        }
        (self.pred)(item, index)
    }

    pub(crate) fn insertions(&self, item: &T, index: u64) -> Vec<T> {
        self.insert_fn.as_ref().map(|f| f(item, index)).unwrap_or_default()
    }

    pub(crate) const fn remove_count(&self) -> usize {
        self.remove_count
    }
}

impl<T> Clone for PatchRule<T> {
    fn clone(&self) -> Self {
        Self {
            pred: Arc::clone(&self.pred),
            remove_count: self.remove_count,
            insert_fn: self.insert_fn.clone(),
            max_applications: self.max_applications,
        }
    }
}

impl<T> fmt::Debug for PatchRule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRule")
            .field("remove_count", &self.remove_count)
            .field("inserts", &self.insert_fn.is_some())
            .field("max_applications", &self.max_applications)
            .finish_non_exhaustive()
    }
}

/// Applies a [PatchRule] to the source sequence.
pub struct PatchStage<P, T> {
    prev: P,
    rule: PatchRule<T>,
    pending: VecDeque<T>,
    skip: usize,
    applied: u64,
    index: u64,
}

impl<P, T> PatchStage<P, T> {
    /// Creates a new [PatchStage] over the previous producer.
    pub fn new(prev: P, rule: PatchRule<T>) -> Self {
        Self { prev, rule, pending: VecDeque::new(), skip: 0, applied: 0, index: 0 }
    }

    /// Feeds one pulled element through the rule. Returns the element when it
    /// passes through unchanged; insertions and retained triggers are queued
    /// on `pending` instead.
    fn admit(&mut self, item: T) -> Option<T> {
        let index = self.index;
        self.index += 1;
        if self.skip > 0 {
            self.skip -= 1;
            return None;
        }
        if self.rule.fires(&item, index, self.applied) {
            self.applied += 1;
            self.pending.extend(self.rule.insertions(&item, index));
            match self.rule.remove_count() {
                // Nothing is removed: the trigger follows its insertions.
                0 => self.pending.push_back(item),
                n => self.skip = n - 1,
            }
            return None;
        }
        Some(item)
    }
}

impl<P, T> Producer for PatchStage<P, T>
where
    P: Producer<Item = T>,
{
    type Item = T;

    fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            if let Some(queued) = self.pending.pop_front() {
                return Ok(Some(queued));
            }
            match self.prev.pull()? {
                Some(item) => {
                    if let Some(passthrough) = self.admit(item) {
                        return Ok(Some(passthrough));
                    }
                }
                None => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl<P, T> SuspendingProducer for PatchStage<P, T>
where
    P: SuspendingProducer<Item = T>,
    T: Send,
{
    type Item = T;

    async fn pull(&mut self) -> SeqResult<Option<T>> {
        loop {
            if let Some(queued) = self.pending.pop_front() {
                return Ok(Some(queued));
            }
            match self.prev.pull().await? {
                Some(item) => {
                    if let Some(passthrough) = self.admit(item) {
                        return Ok(Some(passthrough));
                    }
                }
                None => return Ok(None),
            }
        }
    }
}

impl<P, T> fmt::Debug for PatchStage<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchStage")
            .field("rule", &self.rule)
            .field("pending", &self.pending.len())
            .field("skip", &self.skip)
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::IterProducer;
    use alloc::vec;

    fn apply(items: Vec<i32>, rule: PatchRule<i32>) -> Vec<i32> {
        let mut stage = PatchStage::new(IterProducer::new(items.into_iter()), rule);
        let mut out = Vec::new();
        while let Some(item) = stage.pull().unwrap() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_remove_one_and_insert_two_at_each_even_trigger() {
        let rule = PatchRule::matching(|n: &i32, _| n % 2 == 0)
            .remove(1)
            .insert(|_, _| vec![100, 200]);
        assert_eq!(apply(vec![0, 1, 5, 2], rule), vec![100, 200, 1, 5, 100, 200]);
    }

    #[test]
    fn test_zero_removal_keeps_trigger_after_insertions() {
        let rule = PatchRule::matching(|n: &i32, _| *n == 3).insert(|_, _| vec![-1]);
        assert_eq!(apply(vec![1, 3, 5], rule), vec![1, -1, 3, 5]);
    }

    #[test]
    fn test_removal_window_spans_subsequent_elements() {
        let rule = PatchRule::matching(|n: &i32, _| *n == 2).remove(3);
        assert_eq!(apply(vec![1, 2, 3, 4, 5], rule), vec![1, 5]);
    }

    #[test]
    fn test_application_budget_bounds_firing() {
        let rule =
            PatchRule::matching(|n: &i32, _| n % 2 == 0).remove(1).limit(1);
        assert_eq!(apply(vec![0, 1, 2, 3, 4], rule), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_budget_is_passthrough() {
        let rule = PatchRule::matching(|_: &i32, _| true).remove(1).limit(0);
        assert_eq!(apply(vec![1, 2, 3], rule), vec![1, 2, 3]);
    }

    #[test]
    fn test_insertion_sees_trigger_index() {
        let rule =
            PatchRule::matching(|n: &i32, _| *n < 0).remove(1).insert(|_, index| vec![index as i32]);
        assert_eq!(apply(vec![7, -1, 9, -1], rule), vec![7, 1, 9, 3]);
    }
}
