//! Stack growth for deep recursion in the Rev evaluator.
//!
//! Expression evaluation, graph-node recomputation, dependency stamping and
//! cycle detection all recurse over user-built structures whose depth is not
//! bounded by the host: a chain of ten thousand `x[i] := x[i-1] + 1`
//! statements produces a ten-thousand-deep recomputation. Every such walk
//! goes through [`ensure_sufficient_stack`].
//!
//! On native targets the stack is grown on demand with `stacker`; on WASM the
//! closure is called directly.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// ```text
/// fn value(&self) -> EvalResult {
///     ensure_sufficient_stack(|| self.recompute())
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack; call through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_chain_does_not_overflow() {
        fn chain(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { chain(n - 1) + 1 })
        }

        assert_eq!(chain(100_000), 100_000);
    }

    #[test]
    fn passes_results_through() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
