//! Named reducers built on the [Folder] algebra.
//!
//! Everything here is a plain application of the core constructors; the
//! catalog exists so the common reductions compose by name.

use crate::fold::Folder;
use alloc::vec::Vec;
use core::{hash::Hash, ops::Add};
use hashbrown::HashMap;

/// Sums the elements, starting from the type's default.
pub fn sum<T>() -> Folder<T, T, T>
where
    T: Add<Output = T> + Default + Clone + 'static,
{
    Folder::new(T::default(), |acc, item, _| acc + item)
}

/// Counts the elements.
pub fn count<T>() -> Folder<T, u64, u64> {
    Folder::new(0, |acc, _, _| acc + 1)
}

/// Averages the elements; an empty sequence averages to zero.
pub fn average<T: Into<f64>>() -> Folder<T, (f64, u64), f64> {
    Folder::with_extract(
        (0.0, 0),
        |(total, n), item: T, _| (total + item.into(), n + 1),
        |(total, n)| if *n == 0 { 0.0 } else { total / *n as f64 },
    )
}

/// Keeps the smallest element seen.
pub fn min<T: Ord + Clone + 'static>() -> Folder<T, Option<T>, Option<T>> {
    Folder::new(None, |acc: Option<T>, item, _| match acc {
        Some(best) if best <= item => Some(best),
        _ => Some(item),
    })
}

/// Keeps the largest element seen.
pub fn max<T: Ord + Clone + 'static>() -> Folder<T, Option<T>, Option<T>> {
    Folder::new(None, |acc: Option<T>, item, _| match acc {
        Some(best) if best >= item => Some(best),
        _ => Some(item),
    })
}

/// Captures the first element and escapes.
pub fn first<T: Clone + 'static>() -> Folder<T, Option<T>, Option<T>> {
    Folder::new(None, |acc: Option<T>, item, _| acc.or(Some(item)))
        .with_escape(|captured| captured.is_some())
}

/// Keeps the most recent element.
pub fn last<T: Clone + 'static>() -> Folder<T, Option<T>, Option<T>> {
    Folder::new(None, |_, item, _| Some(item))
}

/// Captures the element at position `n` and escapes once captured.
pub fn elem_at<T: Clone + 'static>(n: u64) -> Folder<T, Option<T>, Option<T>> {
    Folder::new(None, move |acc: Option<T>, item, index| {
        if index == n {
            Some(item)
        } else {
            acc
        }
    })
    .with_escape(|captured| captured.is_some())
}

/// True as soon as any element matches; escapes on the first match.
pub fn any<T>(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Folder<T, bool, bool> {
    Folder::new(false, move |found, item, _| found || pred(&item)).with_escape(|found| *found)
}

/// True while every element matches; escapes on the first mismatch.
pub fn all<T>(pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Folder<T, bool, bool> {
    Folder::new(true, move |ok, item, _| ok && pred(&item)).with_escape(|ok| !*ok)
}

/// Collects the elements in order.
pub fn to_vec<T: Clone + 'static>() -> Folder<T, Vec<T>, Vec<T>> {
    Folder::new(Vec::new(), |mut acc: Vec<T>, item, _| {
        acc.push(item);
        acc
    })
}

/// Counts occurrences per element value.
pub fn histogram<T>() -> Folder<T, HashMap<T, u64>, HashMap<T, u64>>
where
    T: Hash + Eq + Clone + 'static,
{
    Folder::new(HashMap::new(), |mut acc: HashMap<T, u64>, item, _| {
        *acc.entry(item).or_insert(0) += 1;
        acc
    })
}

/// Buckets the elements by computed key, preserving order within a bucket.
pub fn group_by<T, K>(
    key_fn: impl Fn(&T) -> K + Send + Sync + 'static,
) -> Folder<T, HashMap<K, Vec<T>>, HashMap<K, Vec<T>>>
where
    T: Clone + 'static,
    K: Hash + Eq + Clone + 'static,
{
    Folder::new(HashMap::new(), move |mut acc: HashMap<K, Vec<T>>, item, _| {
        acc.entry(key_fn(&item)).or_default().push(item);
        acc
    })
}
