//! Stack growth for the recursive passes.
//!
//! The parser, resolver and evaluator all recurse once per level of
//! nesting in the source.  Each recursive entry point runs through
//! [`ensure_sufficient_stack`], which moves onto a freshly allocated
//! segment when the current one is nearly exhausted.  Depth limits in the
//! parser and interpreter turn runaway programs into ordinary errors long
//! before memory becomes a concern.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_GROWTH: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_GROWTH, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { 1 + depth(n - 1) })
    }

    #[test]
    fn deep_recursion_does_not_overflow() {
        assert_eq!(depth(200_000), 200_000);
    }
}
