//! On-demand stack growth for the recursive parser and evaluator.
//!
//! Script recursion and deeply nested expressions turn into Rust recursion.
//! Every recursive entry point runs through [`ensure_sufficient_stack`], which
//! switches to a freshly allocated segment when the current one runs low.
//! Nesting is bounded by the interpreter's call limit, whatever the size of
//! the host thread's stack.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if fewer than [`RED_ZONE`] bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(n: usize) -> usize {
        ensure_sufficient_stack(|| {
            // Keep a sizeable frame alive across the recursive call.
            let pad = [n as u8; 512];
            if n == 0 {
                0
            } else {
                1 + depth(n - 1) + usize::from(pad[0] == 255)
            }
        })
    }

    #[test]
    fn deep_recursion_on_a_small_thread() {
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| depth(50_000))
            .unwrap();

        assert!(handle.join().unwrap() >= 50_000);
    }
}
