//! Abstract memory budget interfaces.
//!
//! The concrete implementation lives in `hmerge-mem`. Only the traits live here
//! so the IO layer can account buffered rows without depending on the allocator.

/// Accounted bytes held by a buffer. Releases its bytes on drop.
pub trait BudgetGuard: Send {
    /// Number of bytes currently accounted for by this guard.
    fn bytes(&self) -> usize;

    /// Debug tag for tracing.
    fn tag(&self) -> &'static str {
        "guard"
    }

    /// Grow or shrink the accounted bytes. Shrinking always succeeds; growing
    /// returns `false` when the budget cannot cover the difference.
    fn try_resize(&mut self, new_bytes: usize) -> bool;
}

/// A handle representing a memory-cap enforcer.
///
/// Buffers call `try_acquire` before holding rows. On `None` they must flush
/// what they hold instead of growing.
pub trait MemoryBudget: Send + Sync + 'static {
    type Guard: BudgetGuard;

    /// Attempt to acquire `bytes` from the live budget. Returns a guard on success.
    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    /// Total configured capacity (bytes).
    fn capacity_bytes(&self) -> usize;

    /// Approximate currently used bytes (advisory).
    fn used_bytes(&self) -> usize;
}
