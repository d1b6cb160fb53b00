//! Input-side and result-side combinators over [Folder].
//!
//! Every combinator takes the receiver by reference and returns a new folder;
//! the receiver is never mutated. Combinators that reshape the input carry a
//! virtual element counter so the wrapped folder always observes contiguous
//! 0-based positions for the elements it actually receives.

use crate::{fold::Folder, stages::PatchRule};
use alloc::{sync::Arc, vec::Vec};
use core::hash::Hash;
use hashbrown::HashSet;

/// The splice bookkeeping threaded through [Folder::patch_where_input].
///
/// Opaque state; it only exists so patched folders can be named.
#[derive(Clone, Debug, Default)]
pub struct PatchCursor {
    skip: usize,
    applied: u64,
    index: u64,
    fed: u64,
}

impl<T, S, R> Folder<T, S, R>
where
    T: 'static,
    S: Clone + Send + Sync + 'static,
    R: 'static,
{
    /// Post-processes the extracted result.
    pub fn map_result<R2>(&self, f: impl Fn(R) -> R2 + Send + Sync + 'static) -> Folder<T, S, R2> {
        let stepper = self.clone();
        let extractor = self.clone();
        Folder {
            init: self.init.clone(),
            step: Arc::new(move |state, item, index| stepper.run_step(state, item, index)),
            extract: Arc::new(move |state| f(extractor.extract(state))),
            escape: self.escape.clone(),
            monitor: None,
        }
    }

    /// Pre-processes every element before it reaches this folder.
    pub fn map_input<U: 'static>(
        &self,
        f: impl Fn(U) -> T + Send + Sync + 'static,
    ) -> Folder<U, S, R> {
        let stepper = self.clone();
        Folder {
            init: self.init.clone(),
            step: Arc::new(move |state, item, index| stepper.run_step(state, f(item), index)),
            extract: Arc::clone(&self.extract),
            escape: self.escape.clone(),
            monitor: None,
        }
    }

    /// Feeds this folder only the elements matching the predicate.
    pub fn filter_input(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Folder<T, (S, u64), R> {
        let stepper = self.clone();
        Folder {
            init: (self.init.clone(), 0),
            step: Arc::new(move |(state, fed), item, _| {
                if pred(&item) {
                    (stepper.run_step(state, item, fed), fed + 1)
                } else {
                    (state, fed)
                }
            }),
            extract: self.project_extract(),
            escape: self.project_escape(),
            monitor: None,
        }
    }

    /// Feeds this folder at most `n` elements, then escapes.
    pub fn take_input(&self, n: u64) -> Folder<T, (S, u64), R> {
        let stepper = self.clone();
        let escaper = self.clone();
        Folder {
            init: (self.init.clone(), 0),
            step: Arc::new(move |(state, fed), item, _| {
                if fed < n {
                    (stepper.run_step(state, item, fed), fed + 1)
                } else {
                    (state, fed)
                }
            }),
            extract: self.project_extract(),
            escape: Some(Arc::new(move |state: &(S, u64)| {
                state.1 >= n || escaper.escaped(&state.0)
            })),
            monitor: None,
        }
    }

    /// Withholds the first `n` elements from this folder.
    pub fn drop_input(&self, n: u64) -> Folder<T, (S, u64), R> {
        let stepper = self.clone();
        Folder {
            init: (self.init.clone(), 0),
            step: Arc::new(move |(state, seen), item, _| {
                if seen < n {
                    (state, seen + 1)
                } else {
                    (stepper.run_step(state, item, seen - n), seen + 1)
                }
            }),
            extract: self.project_extract(),
            escape: self.project_escape(),
            monitor: None,
        }
    }

    /// Feeds this folder the `n`-element slice starting at `from`.
    ///
    /// The take wrapper sits inside the drop wrapper, so its budget counts
    /// only elements that survive the prefix drop.
    pub fn slice_input(&self, from: u64, n: u64) -> Folder<T, ((S, u64), u64), R> {
        self.take_input(n).drop_input(from)
    }

    /// Feeds this folder elements until the predicate first rejects, then
    /// escapes. The extraction remains callable after the rejection.
    pub fn take_while_input(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Folder<T, (S, u64, bool), R> {
        let stepper = self.clone();
        let escaper = self.clone();
        Folder {
            init: (self.init.clone(), 0, false),
            step: Arc::new(move |(state, fed, stopped), item, _| {
                if stopped {
                    (state, fed, true)
                } else if pred(&item) {
                    (stepper.run_step(state, item, fed), fed + 1, false)
                } else {
                    (state, fed, true)
                }
            }),
            extract: {
                let extractor = self.clone();
                Arc::new(move |state: &(S, u64, bool)| extractor.extract(&state.0))
            },
            escape: Some(Arc::new(move |state: &(S, u64, bool)| {
                state.2 || escaper.escaped(&state.0)
            })),
            monitor: None,
        }
    }

    /// Withholds the leading run of elements matching the predicate.
    pub fn drop_while_input(
        &self,
        pred: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Folder<T, (S, u64, bool), R> {
        let stepper = self.clone();
        let escaper = self.clone();
        Folder {
            init: (self.init.clone(), 0, true),
            step: Arc::new(move |(state, fed, dropping), item, _| {
                if dropping && pred(&item) {
                    (state, fed, true)
                } else {
                    (stepper.run_step(state, item, fed), fed + 1, false)
                }
            }),
            extract: {
                let extractor = self.clone();
                Arc::new(move |state: &(S, u64, bool)| extractor.extract(&state.0))
            },
            escape: self
                .escape
                .is_some()
                .then(|| -> Arc<dyn Fn(&(S, u64, bool)) -> bool + Send + Sync> {
                    Arc::new(move |state| escaper.escaped(&state.0))
                }),
            monitor: None,
        }
    }

    /// Feeds this folder only the first element seen for each computed key.
    pub fn distinct_by_input<K>(
        &self,
        key_fn: impl Fn(&T) -> K + Send + Sync + 'static,
    ) -> Folder<T, (S, HashSet<K>, u64), R>
    where
        K: Hash + Eq + Clone + Send + Sync + 'static,
    {
        let stepper = self.clone();
        let escaper = self.clone();
        Folder {
            init: (self.init.clone(), HashSet::new(), 0),
            step: Arc::new(move |(state, mut seen, fed), item, _| {
                if seen.insert(key_fn(&item)) {
                    (stepper.run_step(state, item, fed), seen, fed + 1)
                } else {
                    (state, seen, fed)
                }
            }),
            extract: {
                let extractor = self.clone();
                Arc::new(move |state: &(S, HashSet<K>, u64)| extractor.extract(&state.0))
            },
            escape: self
                .escape
                .is_some()
                .then(|| -> Arc<dyn Fn(&(S, HashSet<K>, u64)) -> bool + Send + Sync> {
                    Arc::new(move |state| escaper.escaped(&state.0))
                }),
            monitor: None,
        }
    }

    /// Suppresses elements equal to their immediate predecessor.
    pub fn filter_changed_input(&self) -> Folder<T, (S, Option<T>, u64), R>
    where
        T: Clone + PartialEq + Send + Sync,
    {
        let stepper = self.clone();
        let escaper = self.clone();
        Folder {
            init: (self.init.clone(), None, 0),
            step: Arc::new(move |(state, last, fed), item, _| {
                if last.as_ref() == Some(&item) {
                    (state, last, fed)
                } else {
                    let state = stepper.run_step(state, item.clone(), fed);
                    (state, Some(item), fed + 1)
                }
            }),
            extract: {
                let extractor = self.clone();
                Arc::new(move |state: &(S, Option<T>, u64)| extractor.extract(&state.0))
            },
            escape: self
                .escape
                .is_some()
                .then(|| -> Arc<dyn Fn(&(S, Option<T>, u64)) -> bool + Send + Sync> {
                    Arc::new(move |state| escaper.escaped(&state.0))
                }),
            monitor: None,
        }
    }

    /// Applies the substitution rule to the input before it reaches this
    /// folder. Shares [PatchRule] with the pipeline's patching stage.
    pub fn patch_where_input(&self, rule: PatchRule<T>) -> Folder<T, (S, PatchCursor), R> {
        let stepper = self.clone();
        Folder {
            init: (self.init.clone(), PatchCursor::default()),
            step: Arc::new(move |(mut state, mut cursor), item, _| {
                let index = cursor.index;
                cursor.index += 1;
                if cursor.skip > 0 {
                    cursor.skip -= 1;
                    return (state, cursor);
                }
                if rule.fires(&item, index, cursor.applied) {
                    cursor.applied += 1;
                    for inserted in rule.insertions(&item, index) {
                        if stepper.escaped(&state) {
                            return (state, cursor);
                        }
                        state = stepper.run_step(state, inserted, cursor.fed);
                        cursor.fed += 1;
                    }
                    match rule.remove_count() {
                        0 => {
                            if !stepper.escaped(&state) {
                                state = stepper.run_step(state, item, cursor.fed);
                                cursor.fed += 1;
                            }
                        }
                        n => cursor.skip = n - 1,
                    }
                } else {
                    state = stepper.run_step(state, item, cursor.fed);
                    cursor.fed += 1;
                }
                (state, cursor)
            }),
            extract: {
                let extractor = self.clone();
                Arc::new(move |state: &(S, PatchCursor)| extractor.extract(&state.0))
            },
            escape: {
                let escaper = self.clone();
                self.escape
                    .is_some()
                    .then(|| -> Arc<dyn Fn(&(S, PatchCursor)) -> bool + Send + Sync> {
                        Arc::new(move |state| escaper.escaped(&state.0))
                    })
            },
            monitor: None,
        }
    }

    /// Folds the given elements into the initial state, so every drive sees
    /// them before the real sequence. Positions of real elements continue
    /// after the prepended run.
    pub fn prepend_input(&self, items: Vec<T>) -> Folder<T, S, R> {
        let mut init = self.init.clone();
        let mut offset = 0u64;
        for item in items {
            if self.escaped(&init) {
                break;
            }
            init = self.run_step(init, item, offset);
            offset += 1;
        }
        let stepper = self.clone();
        Folder {
            init,
            step: Arc::new(move |state, item, index| {
                stepper.run_step(state, item, index + offset)
            }),
            extract: Arc::clone(&self.extract),
            escape: self.escape.clone(),
            monitor: None,
        }
    }

    /// Folds the given elements after the real sequence, inside the
    /// extraction. An escaped state is extracted as-is, without the appended
    /// run.
    pub fn append_input(&self, items: Vec<T>) -> Folder<T, (S, u64), R>
    where
        T: Clone + Send + Sync,
    {
        let stepper = self.clone();
        let extractor = self.clone();
        Folder {
            init: (self.init.clone(), 0),
            step: Arc::new(move |(state, fed), item, _| {
                (stepper.run_step(state, item, fed), fed + 1)
            }),
            extract: Arc::new(move |state: &(S, u64)| {
                if extractor.escaped(&state.0) {
                    return extractor.extract(&state.0);
                }
                let mut appended = state.0.clone();
                let mut index = state.1;
                for item in items.iter().cloned() {
                    if extractor.escaped(&appended) {
                        break;
                    }
                    appended = extractor.run_step(appended, item, index);
                    index += 1;
                }
                extractor.extract(&appended)
            }),
            escape: self.project_escape(),
            monitor: None,
        }
    }

    /// Projects this folder's extraction through a `(S, u64)` wrapper state.
    fn project_extract(&self) -> Arc<dyn Fn(&(S, u64)) -> R + Send + Sync> {
        let extractor = self.clone();
        Arc::new(move |state: &(S, u64)| extractor.extract(&state.0))
    }

    /// Projects this folder's escape through a `(S, u64)` wrapper state.
    fn project_escape(&self) -> Option<Arc<dyn Fn(&(S, u64)) -> bool + Send + Sync>> {
        let escaper = self.clone();
        self.escape
            .is_some()
            .then(|| -> Arc<dyn Fn(&(S, u64)) -> bool + Send + Sync> {
                Arc::new(move |state| escaper.escaped(&state.0))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::catalog;
    use alloc::vec;
    use alloc::vec::Vec;

    fn drive<T, S: Clone, R>(folder: &Folder<T, S, R>, items: Vec<T>) -> R {
        let mut state = folder.init_state();
        let mut index = 0;
        for item in items {
            if folder.escaped(&state) {
                break;
            }
            state = folder.run_step(state, item, index);
            index += 1;
        }
        folder.extract(&state)
    }

    #[test]
    fn test_map_result_composes_with_map_input() {
        let mean_len = catalog::average::<u32>()
            .map_input(|word: &str| word.len() as u32)
            .map_result(|mean| mean.round() as u32);
        assert_eq!(drive(&mean_len, vec!["a", "bcd", "ef"]), 2);
    }

    #[test]
    fn test_stacked_map_results_compose() {
        let chained = catalog::sum::<u64>().map_result(|r| r + 1).map_result(|r| r * 2);
        let direct = catalog::sum::<u64>().map_result(|r| (r + 1) * 2);
        assert_eq!(drive(&chained, vec![1, 2, 3]), drive(&direct, vec![1, 2, 3]));
        assert_eq!(drive(&chained, vec![1, 2, 3]), 14);
    }

    #[test]
    fn test_filter_input_renumbers_for_the_inner_folder() {
        let positions = Folder::new(Vec::new(), |mut acc: Vec<u64>, _: i32, index| {
            acc.push(index);
            acc
        });
        let evens_only = positions.filter_input(|n: &i32| n % 2 == 0);
        // The inner folder sees contiguous positions, not the source's.
        assert_eq!(drive(&evens_only, vec![1, 2, 3, 4]), vec![0, 1]);
    }

    #[test]
    fn test_take_input_escapes_after_the_budget() {
        let bounded = catalog::sum::<u64>().take_input(2);
        let mut state = bounded.init_state();
        let mut pulled = 0;
        for n in 1..=100u64 {
            if bounded.escaped(&state) {
                break;
            }
            state = bounded.run_step(state, n, pulled);
            pulled += 1;
        }
        assert_eq!(bounded.extract(&state), 3);
        assert_eq!(pulled, 2);
    }

    #[test]
    fn test_drop_input_skips_the_prefix() {
        let tail = catalog::to_vec::<i32>().drop_input(2);
        assert_eq!(drive(&tail, vec![1, 2, 3, 4]), vec![3, 4]);
    }

    #[test]
    fn test_slice_input_feeds_the_middle_window() {
        let middle = catalog::to_vec::<i32>().slice_input(1, 2);
        assert_eq!(drive(&middle, vec![1, 2, 3, 4, 5]), vec![2, 3]);
        // Dropped prefix elements do not consume the window budget.
        let later = catalog::to_vec::<i32>().slice_input(3, 2);
        assert_eq!(drive(&later, vec![1, 2, 3, 4, 5, 6]), vec![4, 5]);
    }

    #[test]
    fn test_take_while_input_stops_feeding_at_first_rejection() {
        let prefix = catalog::to_vec::<i32>().take_while_input(|n| *n < 3);
        // Elements after the rejection never reach the inner folder, even a
        // later one that would match again.
        assert_eq!(drive(&prefix, vec![1, 2, 9, 1]), vec![1, 2]);
    }

    #[test]
    fn test_drop_while_input_opens_at_first_rejection() {
        let suffix = catalog::to_vec::<i32>().drop_while_input(|n| *n < 3);
        assert_eq!(drive(&suffix, vec![1, 2, 9, 1]), vec![9, 1]);
    }

    #[test]
    fn test_distinct_by_input_feeds_first_occurrences() {
        let firsts = catalog::to_vec::<i32>().distinct_by_input(|n| n % 10);
        assert_eq!(drive(&firsts, vec![10, 21, 30, 11, 42]), vec![10, 21, 42]);
    }

    #[test]
    fn test_filter_changed_input_collapses_runs() {
        let changes = catalog::to_vec::<i32>().filter_changed_input();
        assert_eq!(drive(&changes, vec![1, 1, 2, 2, 2, 1]), vec![1, 2, 1]);
    }

    #[test]
    fn test_patch_where_input_splices_like_the_stage() {
        let rule = PatchRule::matching(|n: &i32, _| n % 2 == 0)
            .remove(1)
            .insert(|_, _| vec![100, 200]);
        let patched = catalog::to_vec::<i32>().patch_where_input(rule);
        assert_eq!(drive(&patched, vec![0, 1, 5, 2]), vec![100, 200, 1, 5, 100, 200]);
    }

    #[test]
    fn test_prepend_input_keeps_position_continuity() {
        let positions =
            Folder::new(Vec::new(), |mut acc: Vec<u64>, _: i32, index| {
                acc.push(index);
                acc
            });
        let with_header = positions.prepend_input(vec![7, 8]);
        assert_eq!(drive(&with_header, vec![1]), vec![0, 1, 2]);
    }

    #[test]
    fn test_append_input_folds_after_the_sequence() {
        let total = catalog::sum::<u64>().append_input(vec![10, 20]);
        assert_eq!(drive(&total, vec![1, 2]), 33);
    }

    #[test]
    fn test_append_input_is_skipped_once_escaped() {
        let capped = catalog::sum::<u64>()
            .with_escape(|total| *total >= 3)
            .append_input(vec![100]);
        assert_eq!(drive(&capped, vec![1, 2, 4]), 3);
    }
}
