//! Reference count flavours stored in the buffer header.
//!
//! [`LocalRefCount`] is the default and keeps handles confined to one thread.
//! [`AtomicRefCount`] enables sharing handles across threads at the cost of
//! atomic read-modify-write operations on every retain and release.

use std::cell::Cell;
use std::sync::atomic::{self, AtomicUsize, Ordering};

/// Counts above this value abort the process, mirroring `std::sync::Arc`.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Reference counter embedded at offset 0 of every buffer block.
///
/// # Safety
///
/// Implementors must report exactly one `true` from [`RefCount::decrement`]
/// over the lifetime of a counter that started at [`RefCount::one`] and was
/// incremented and decremented in matching pairs, and must establish
/// happens-before from every prior decrement to the final one when the
/// counter is shared between threads.
pub unsafe trait RefCount {
    /// Whether handles using this counter may be shared across threads.
    const THREAD_SAFE: bool;

    /// Creates a counter for a freshly allocated block.
    fn one() -> Self;

    /// Current number of owners.
    fn get(&self) -> usize;

    /// Registers one more owner.
    fn increment(&self);

    /// Drops one owner, returning `true` when it was the last one.
    fn decrement(&self) -> bool;

    /// Whether the caller's handle is the only owner.
    #[inline]
    fn is_unique(&self) -> bool {
        self.get() == 1
    }
}

/// Non-atomic counter for single-threaded use.
#[derive(Debug)]
pub struct LocalRefCount(Cell<usize>);

unsafe impl RefCount for LocalRefCount {
    const THREAD_SAFE: bool = false;

    #[inline]
    fn one() -> Self {
        LocalRefCount(Cell::new(1))
    }

    #[inline]
    fn get(&self) -> usize {
        self.0.get()
    }

    #[inline]
    fn increment(&self) {
        let n = self.0.get() + 1;
        if n > MAX_REFCOUNT {
            std::process::abort();
        }
        self.0.set(n);
    }

    #[inline]
    fn decrement(&self) -> bool {
        let n = self.0.get() - 1;
        self.0.set(n);
        n == 0
    }
}

/// Atomic counter for handles shared between threads.
#[derive(Debug)]
pub struct AtomicRefCount(AtomicUsize);

unsafe impl RefCount for AtomicRefCount {
    const THREAD_SAFE: bool = true;

    #[inline]
    fn one() -> Self {
        AtomicRefCount(AtomicUsize::new(1))
    }

    #[inline]
    fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn increment(&self) {
        // A new owner can only be created from an existing one, so no
        // synchronization is needed here.
        let old = self.0.fetch_add(1, Ordering::Relaxed);
        if old > MAX_REFCOUNT {
            std::process::abort();
        }
    }

    #[inline]
    fn decrement(&self) -> bool {
        if self.0.fetch_sub(1, Ordering::Release) != 1 {
            return false;
        }
        atomic::fence(Ordering::Acquire);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<C: RefCount>() {
        let c = C::one();
        assert_eq!(c.get(), 1);
        assert!(c.is_unique());
        c.increment();
        c.increment();
        assert_eq!(c.get(), 3);
        assert!(!c.is_unique());
        assert!(!c.decrement());
        assert!(!c.decrement());
        assert!(c.decrement());
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn test_local_ref_count() {
        exercise::<LocalRefCount>();
        assert!(!LocalRefCount::THREAD_SAFE);
    }

    #[test]
    fn test_atomic_ref_count() {
        exercise::<AtomicRefCount>();
        assert!(AtomicRefCount::THREAD_SAFE);
    }

    #[test]
    fn test_atomic_ref_count_concurrent_pairs() {
        let c = std::sync::Arc::new(AtomicRefCount::one());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment();
                        assert!(!c.decrement());
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(c.get(), 1);
    }
}
