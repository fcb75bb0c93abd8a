//! State owned by the time-base interrupt.

use core::cell::UnsafeCell;

use crate::atomic_cell::AtomicCell;

/// Multi-word state that only one context mutates.
///
/// Other contexts never borrow the value; they post requests through
/// [`AtomicCell`]s that the owner applies on its next run. The busy flag
/// turns an overlapping second entry into a skipped run instead of a second
/// `&mut`, so no interrupt masking is needed.
pub(crate) struct TickLocal<T> {
    busy: AtomicCell<bool>,
    value: UnsafeCell<T>,
}

// SAFETY: `value` is only reached through `with`, which hands out at most one
// `&mut T` at a time. The busy flag's AcqRel swap and Release store order each
// access after the previous one.
unsafe impl<T: Send> Sync for TickLocal<T> {}

impl<T> TickLocal<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            busy: AtomicCell::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Run `f` with exclusive access. Returns `None` without calling `f` if
    /// another context is already inside.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if self.busy.replace(true) {
            return None;
        }

        // SAFETY: the swap above saw `false`, so no other `&mut T` exists
        // until the flag is cleared below.
        let result = f(unsafe { &mut *self.value.get() });

        self.busy.write(false);
        Some(result)
    }
}
