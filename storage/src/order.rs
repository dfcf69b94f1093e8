//! Total orders as zero-sized types.

use std::cmp::Ordering;

/// A total order over `T`, named as a type so containers can be
/// parameterized by it without carrying an instance.
///
/// This is distinct from `Ord` on purpose: the same record type is sorted
/// several different ways in a pipeline (lexicographic, by target, by
/// unordered endpoints, reversed), and each ordering is its own type.
///
/// Implementations must supply `min_value`/`max_value` sentinels, values
/// ordered weakly below respectively above every value that can occur in a
/// stream. They bound merge scans and seed "previous element" state.
pub trait SortOrder<T> {
    /// Compares two values under this order.
    fn cmp(a: &T, b: &T) -> Ordering;

    /// A value no real element sorts below.
    fn min_value() -> T;

    /// A value no real element sorts above.
    fn max_value() -> T;

    /// `true` iff `a` sorts strictly before `b`.
    #[inline]
    fn less(a: &T, b: &T) -> bool {
        Self::cmp(a, b) == Ordering::Less
    }
}

/// The natural order of an integer-like type.
pub struct Natural;

macro_rules! implement_natural {
    ($($t:ty,)*) => (
        $(
            impl SortOrder<$t> for Natural {
                #[inline] fn cmp(a: &$t, b: &$t) -> Ordering { a.cmp(b) }
                fn min_value() -> $t { <$t>::MIN }
                fn max_value() -> $t { <$t>::MAX }
            }
        )*
    )
}

implement_natural!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,);
