//! Read-only views over a live buffer: element enumeration, header snapshot
//! and the payload memory region.

use std::iter::FusedIterator;

/// Lazy enumeration of `(index, element)` pairs over a buffer's initialized
/// elements, in ascending index order.
///
/// The element count is captured when the sequence is created.
#[derive(Clone)]
pub struct Introspect<'a, T> {
    elements: &'a [T],
    front: usize,
    back: usize,
}

impl<'a, T> Introspect<'a, T> {
    pub(crate) fn new(elements: &'a [T]) -> Introspect<'a, T> {
        Introspect {
            elements,
            front: 0,
            back: elements.len(),
        }
    }
}

impl<'a, T> Iterator for Introspect<'a, T> {
    type Item = (usize, &'a T);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let index = self.front;
            self.front += 1;
            Some((index, &self.elements[index]))
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T> DoubleEndedIterator for Introspect<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some((self.back, &self.elements[self.back]))
        } else {
            None
        }
    }
}

impl<T> ExactSizeIterator for Introspect<'_, T> {}

impl<T> FusedIterator for Introspect<'_, T> {}

/// Point-in-time copy of a block's header fields and layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSnapshot {
    pub reference_count: usize,
    pub count: usize,
    pub capacity: usize,
    /// Raw capacity word: `capacity << 1 | flags`.
    pub capacity_and_flags: usize,
    pub thread_safe_ref_count: bool,
    /// Offset of the first element from the start of the block, in bytes.
    pub payload_offset: usize,
    pub element_size: usize,
    pub element_align: usize,
    /// Total size of the block (header, padding and element slots).
    pub allocation_size: usize,
}

/// Describes the element payload region of a block.
#[derive(Debug, Clone)]
pub struct MemoryAllocation {
    /// Pointer to the first element slot.
    pub ptr: *const u8,
    /// Bytes occupied by initialized elements.
    pub len: usize,
    /// Bytes reserved for all element slots.
    pub capacity: usize,
    /// Formal alignment of the element slots.
    pub alignment: usize,
}
