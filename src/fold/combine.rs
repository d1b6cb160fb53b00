//! Fan-out composition: running several folders over one input pass.

use crate::fold::Folder;
use alloc::sync::Arc;

/// Runs two folders over the same elements in a single pass, pairing their
/// results.
///
/// Each element is cloned into both branches. A branch whose own escape has
/// already fired receives no further elements; the combined folder escapes
/// only when both branches escape, so it carries an escape predicate only
/// when both inputs do.
pub fn combine<T, S1, S2, R1, R2>(
    a: &Folder<T, S1, R1>,
    b: &Folder<T, S2, R2>,
) -> Folder<T, (S1, S2), (R1, R2)>
where
    T: Clone + 'static,
    S1: Clone + Send + Sync + 'static,
    S2: Clone + Send + Sync + 'static,
    R1: 'static,
    R2: 'static,
{
    let (left, right) = (a.clone(), b.clone());
    let (left_out, right_out) = (a.clone(), b.clone());
    let escape = (a.escape.is_some() && b.escape.is_some()).then(|| {
        let (left, right) = (a.clone(), b.clone());
        Arc::new(move |state: &(S1, S2)| left.escaped(&state.0) && right.escaped(&state.1))
            as Arc<dyn Fn(&(S1, S2)) -> bool + Send + Sync>
    });
    Folder {
        init: (a.init.clone(), b.init.clone()),
        step: Arc::new(move |(s1, s2), item: T, index| {
            let s1 = if left.escaped(&s1) { s1 } else { left.run_step(s1, item.clone(), index) };
            let s2 = if right.escaped(&s2) { s2 } else { right.run_step(s2, item, index) };
            (s1, s2)
        }),
        extract: Arc::new(move |state: &(S1, S2)| {
            (left_out.extract(&state.0), right_out.extract(&state.1))
        }),
        escape,
        monitor: None,
    }
}

/// [combine] with the paired results merged through `f`.
pub fn combine_with<T, S1, S2, R1, R2, R>(
    f: impl Fn(R1, R2) -> R + Send + Sync + 'static,
    a: &Folder<T, S1, R1>,
    b: &Folder<T, S2, R2>,
) -> Folder<T, (S1, S2), R>
where
    T: Clone + 'static,
    S1: Clone + Send + Sync + 'static,
    S2: Clone + Send + Sync + 'static,
    R1: 'static,
    R2: 'static,
{
    combine(a, b).map_result(move |(r1, r2)| f(r1, r2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::catalog;
    use alloc::vec;
    use alloc::vec::Vec;

    fn drive<T, S: Clone, R>(folder: &Folder<T, S, R>, items: Vec<T>) -> (R, u64) {
        let mut state = folder.init_state();
        let mut fed = 0;
        for item in items {
            if folder.escaped(&state) {
                break;
            }
            state = folder.run_step(state, item, fed);
            fed += 1;
        }
        (folder.extract(&state), fed)
    }

    #[test]
    fn test_combine_pairs_results_over_one_pass() {
        let both = combine(&catalog::sum::<u64>(), &catalog::count());
        assert_eq!(drive(&both, vec![1, 2, 3, 4]).0, (10, 4));
    }

    #[test]
    fn test_escaped_branch_is_starved() {
        let both = combine(&catalog::first::<i32>(), &catalog::to_vec::<i32>());
        let ((head, all), _) = drive(&both, vec![7, 8, 9]);
        // The first-element branch escaped after one element and kept it.
        assert_eq!(head, Some(7));
        assert_eq!(all, vec![7, 8, 9]);
    }

    #[test]
    fn test_joint_escape_is_the_conjunction() {
        let both = combine(&catalog::first::<i32>(), &catalog::elem_at::<i32>(2));
        let ((head, third), fed) = drive(&both, vec![9, 8, 7, 6, 5]);
        assert_eq!(head, Some(9));
        assert_eq!(third, Some(7));
        // The drive stopped once the later branch was satisfied.
        assert_eq!(fed, 3);
    }

    #[test]
    fn test_combine_with_merges_results() {
        let mean = combine_with(
            |total: u64, n: u64| total as f64 / n as f64,
            &catalog::sum::<u64>(),
            &catalog::count(),
        );
        assert_eq!(drive(&mean, vec![1, 2, 3, 4]).0, 2.5);
    }
}
