//! Macros for n-ary folder fan-out.

/// Combines two or more folders into one single-pass fan-out, right-nesting
/// the pairs: `combine!(a, b, c)` yields results shaped `(Ra, (Rb, Rc))`.
#[macro_export]
macro_rules! combine {
    ($a:expr, $b:expr $(,)?) => {
        $crate::fold::combine(&$a, &$b)
    };
    ($a:expr, $($rest:expr),+ $(,)?) => {
        $crate::fold::combine(&$a, &$crate::combine!($($rest),+))
    };
}
