//! Block layout: a fixed header followed by the inline element array.
//!
//! ```text
//! +-----------+-------+--------------------+---------+------------------+
//! | ref_count | count | capacity_and_flags | padding | elements[cap]    |
//! +-----------+-------+--------------------+---------+------------------+
//! 0                                        payload_offset
//! ```
//!
//! The capacity word stores `capacity << 1 | flags`, so the largest
//! representable capacity is [`MAX_CAPACITY`].

use std::alloc::Layout;

use arrayscope_common::{Result, error::Error};

use crate::{align::align_up, refcount::RefCount};

/// Set in the header when the block carries an atomic reference count.
pub const FLAG_THREAD_SAFE_REF_COUNT: usize = 0b1;

const FLAG_BITS: u32 = 1;
const FLAG_MASK: usize = (1 << FLAG_BITS) - 1;

/// Largest capacity that fits into the header's capacity word.
pub const MAX_CAPACITY: usize = usize::MAX >> FLAG_BITS;

#[repr(C)]
pub(crate) struct Header<C> {
    pub(crate) ref_count: C,
    /// Number of initialized elements. Written only through a unique handle.
    pub(crate) count: usize,
    pub(crate) capacity_and_flags: usize,
}

impl<C: RefCount> Header<C> {
    pub(crate) fn new(capacity: usize) -> Header<C> {
        let flags = if C::THREAD_SAFE {
            FLAG_THREAD_SAFE_REF_COUNT
        } else {
            0
        };
        Header {
            ref_count: C::one(),
            count: 0,
            capacity_and_flags: encode_capacity(capacity, flags),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity_and_flags >> FLAG_BITS
    }

    #[inline]
    pub(crate) fn flags(&self) -> usize {
        self.capacity_and_flags & FLAG_MASK
    }
}

#[inline]
fn encode_capacity(capacity: usize, flags: usize) -> usize {
    debug_assert!(capacity <= MAX_CAPACITY);
    (capacity << FLAG_BITS) | (flags & FLAG_MASK)
}

/// Byte offset of the first element from the start of the block.
#[inline]
pub fn payload_offset<T, C>() -> usize {
    align_up(size_of::<Header<C>>(), align_of::<T>())
}

/// Alignment of the whole block.
#[inline]
pub(crate) fn block_align<T, C>() -> usize {
    align_of::<Header<C>>().max(align_of::<T>())
}

/// Computes the allocation layout for a block holding `capacity` elements.
///
/// Fails with an allocation error when the capacity does not fit the header
/// word or the byte size exceeds `isize::MAX`.
pub fn block_layout<T, C>(capacity: usize) -> Result<Layout> {
    let error = || Error::allocation(capacity, size_of::<T>());
    if capacity > MAX_CAPACITY {
        return Err(error());
    }
    let payload = size_of::<T>().checked_mul(capacity).ok_or_else(error)?;
    let size = payload_offset::<T, C>()
        .checked_add(payload)
        .ok_or_else(error)?;
    Layout::from_size_align(size, block_align::<T, C>()).map_err(|_| error())
}

/// Recomputes the layout of a block that was successfully allocated.
///
/// # Safety
///
/// `capacity` must be the capacity of a block produced by [`block_layout`].
#[inline]
pub(crate) unsafe fn block_layout_unchecked<T, C>(capacity: usize) -> Layout {
    let size = payload_offset::<T, C>() + size_of::<T>() * capacity;
    unsafe { Layout::from_size_align_unchecked(size, block_align::<T, C>()) }
}
