use std::{alloc, fmt, marker::PhantomData, ptr, ptr::NonNull};

use arrayscope_common::{Result, error::Error};

use crate::{
    align::is_aligned_ptr,
    introspect::{HeaderSnapshot, Introspect, MemoryAllocation},
    layout::{
        FLAG_THREAD_SAFE_REF_COUNT, Header, block_layout, block_layout_unchecked, payload_offset,
    },
    options::{BufferOptions, GrowthPolicy},
    refcount::{AtomicRefCount, LocalRefCount, RefCount},
};

/// A growable, reference-counted, contiguous element buffer.
///
/// Each handle points to one heap block made of a [`Header`](crate::layout)
/// (reference count, element count, capacity word) followed by the inline
/// element slots. Handles created with [`retain`](Self::retain) or `clone`
/// alias the same block and share its reference count. The block is freed,
/// and its initialized elements dropped, when the last handle is released.
///
/// A handle is either *live* or *released*. After [`release`](Self::release)
/// every operation on that handle fails with `UseAfterFree`; dropping a live
/// handle releases it.
///
/// Appending writes in place only when the handle is the sole owner of its
/// block. A full block grows to the next capacity of the [`GrowthPolicy`];
/// a shared block is first copied into a private one (copy-on-write), so
/// other handles never observe the mutation.
///
/// The reference count flavour `C` selects single-threaded
/// ([`LocalRefCount`], the default) or thread-safe ([`AtomicRefCount`],
/// see [`SharedArrayBuffer`]) ownership.
pub struct GrowableArrayBuffer<T, C: RefCount = LocalRefCount> {
    block: Option<NonNull<Header<C>>>,
    growth: GrowthPolicy,
    _marker: PhantomData<T>,
}

/// A buffer whose handles may be sent and shared across threads.
pub type SharedArrayBuffer<T> = GrowableArrayBuffer<T, AtomicRefCount>;

unsafe impl<T: Send + Sync> Send for GrowableArrayBuffer<T, AtomicRefCount> {}

unsafe impl<T: Send + Sync> Sync for GrowableArrayBuffer<T, AtomicRefCount> {}

impl<T, C: RefCount> GrowableArrayBuffer<T, C> {
    /// Creates an empty buffer with a header-only block.
    pub fn new() -> Result<Self> {
        Self::with_capacity(0)
    }

    /// Creates an empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_options(BufferOptions::new().with_initial_capacity(capacity))
    }

    /// Creates an empty buffer from validated options.
    pub fn with_options(options: BufferOptions) -> Result<Self> {
        options.validate()?;
        let block = Self::allocate(options.initial_capacity)?;
        Ok(Self::from_block(block, options.growth))
    }

    /// Number of initialized elements.
    #[inline]
    pub fn count(&self) -> Result<usize> {
        Ok(self.header("count")?.count)
    }

    /// Number of element slots in the current block.
    #[inline]
    pub fn capacity(&self) -> Result<usize> {
        Ok(self.header("capacity")?.capacity())
    }

    /// Number of live handles sharing the current block.
    #[inline]
    pub fn reference_count(&self) -> Result<usize> {
        Ok(self.header("reference_count")?.ref_count.get())
    }

    /// Whether the buffer holds no initialized elements.
    #[inline]
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.header("is_empty")?.count == 0)
    }

    /// Whether this handle is the only owner of its block.
    #[inline]
    pub fn is_unique(&self) -> Result<bool> {
        Ok(self.header("is_unique")?.ref_count.is_unique())
    }

    /// Whether this handle has been released.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.block.is_none()
    }

    /// Whether both handles are live and point to the same block.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        matches!((self.block, other.block), (Some(a), Some(b)) if a == b)
    }

    /// Returns the element at `index`.
    pub fn get(&self, index: usize) -> Result<&T> {
        let elements = self.slice("get")?;
        elements
            .get(index)
            .ok_or_else(|| Error::index_out_of_range(index, elements.len()))
    }

    /// Returns the initialized elements as a slice.
    pub fn as_slice(&self) -> Result<&[T]> {
        self.slice("as_slice")
    }

    /// Enumerates `(index, element)` pairs over the initialized elements.
    ///
    /// Each call starts a fresh sequence.
    pub fn introspect(&self) -> Result<Introspect<'_, T>> {
        Ok(Introspect::new(self.slice("introspect")?))
    }

    /// Captures the header fields together with the block layout.
    pub fn header_snapshot(&self) -> Result<HeaderSnapshot> {
        let header = self.header("header_snapshot")?;
        let capacity = header.capacity();
        let layout = unsafe { block_layout_unchecked::<T, C>(capacity) };
        Ok(HeaderSnapshot {
            reference_count: header.ref_count.get(),
            count: header.count,
            capacity,
            capacity_and_flags: header.capacity_and_flags,
            thread_safe_ref_count: header.flags() & FLAG_THREAD_SAFE_REF_COUNT != 0,
            payload_offset: payload_offset::<T, C>(),
            element_size: size_of::<T>(),
            element_align: align_of::<T>(),
            allocation_size: layout.size(),
        })
    }

    /// Describes the element payload region of the current block.
    pub fn memory(&self) -> Result<MemoryAllocation> {
        let block = self.live("memory")?;
        let header = unsafe { block.as_ref() };
        Ok(MemoryAllocation {
            ptr: Self::elements(block) as *const u8,
            len: header.count * size_of::<T>(),
            capacity: header.capacity() * size_of::<T>(),
            alignment: align_of::<T>(),
        })
    }

    /// Creates a new handle to the same block, incrementing its reference
    /// count.
    pub fn retain(&self) -> Result<Self> {
        let block = self.live("retain")?;
        let header = unsafe { block.as_ref() };
        header.ref_count.increment();
        tracing::trace!(?block, ref_count = header.ref_count.get(), "retain block");
        Ok(Self::from_block(block, self.growth))
    }

    /// Gives up this handle's ownership of the block.
    ///
    /// When this was the last handle, the initialized elements are dropped
    /// and the block is deallocated. The handle is left released.
    pub fn release(&mut self) -> Result<()> {
        let block = self.block.take().ok_or_else(|| {
            tracing::debug!(operation = "release", "use of a released handle");
            Error::use_after_free("release")
        })?;
        unsafe { Self::release_block(block) };
        Ok(())
    }

    fn from_block(block: NonNull<Header<C>>, growth: GrowthPolicy) -> Self {
        GrowableArrayBuffer {
            block: Some(block),
            growth,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn live(&self, operation: &'static str) -> Result<NonNull<Header<C>>> {
        self.block.ok_or_else(|| {
            tracing::debug!(operation, "use of a released handle");
            Error::use_after_free(operation)
        })
    }

    #[inline]
    fn header(&self, operation: &'static str) -> Result<&Header<C>> {
        let block = self.live(operation)?;
        Ok(unsafe { block.as_ref() })
    }

    #[inline]
    fn slice(&self, operation: &'static str) -> Result<&[T]> {
        let block = self.live(operation)?;
        let count = unsafe { block.as_ref() }.count;
        Ok(unsafe { std::slice::from_raw_parts(Self::elements(block), count) })
    }

    #[inline]
    fn elements(block: NonNull<Header<C>>) -> *mut T {
        unsafe {
            block
                .as_ptr()
                .cast::<u8>()
                .add(payload_offset::<T, C>())
                .cast::<T>()
        }
    }

    fn allocate(capacity: usize) -> Result<NonNull<Header<C>>> {
        let layout = block_layout::<T, C>(capacity)?;
        let raw = unsafe { alloc::alloc(layout) }.cast::<Header<C>>();
        let block = NonNull::new(raw).ok_or_else(|| {
            tracing::debug!(bytes = layout.size(), "allocator returned null");
            Error::allocation(capacity, size_of::<T>())
        })?;
        unsafe { block.as_ptr().write(Header::new(capacity)) };
        debug_assert!(is_aligned_ptr(Self::elements(block), align_of::<T>()));
        tracing::trace!(?block, capacity, bytes = layout.size(), "allocate block");
        Ok(block)
    }

    /// # Safety
    ///
    /// `block` must be a live block owned by the caller's (now forgotten)
    /// handle.
    unsafe fn release_block(block: NonNull<Header<C>>) {
        let last = unsafe { block.as_ref() }.ref_count.decrement();
        if last {
            unsafe { Self::free_block(block) };
        }
    }

    /// # Safety
    ///
    /// `block` must have a reference count of zero and no other handles.
    unsafe fn free_block(block: NonNull<Header<C>>) {
        let (count, capacity) = {
            let header = unsafe { block.as_ref() };
            (header.count, header.capacity())
        };
        if std::mem::needs_drop::<T>() {
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    Self::elements(block),
                    count,
                ))
            };
        }
        unsafe {
            ptr::drop_in_place(block.as_ptr());
            alloc::dealloc(
                block.as_ptr().cast::<u8>(),
                block_layout_unchecked::<T, C>(capacity),
            );
        }
        tracing::trace!(?block, count, capacity, "free block");
    }
}

impl<T: Clone, C: RefCount> GrowableArrayBuffer<T, C> {
    /// Creates a buffer holding clones of `values`, with capacity equal to
    /// their number.
    pub fn from_slice(values: &[T]) -> Result<Self> {
        let mut buffer = Self::with_capacity(values.len())?;
        buffer.try_extend(values.iter().cloned())?;
        Ok(buffer)
    }

    /// Appends `value` after the last initialized element.
    ///
    /// Grows the block when it is full and copies it when it is shared.
    pub fn append(&mut self, value: T) -> Result<()> {
        let block = self.live("append")?;
        let (count, capacity, unique) = {
            let header = unsafe { block.as_ref() };
            (header.count, header.capacity(), header.ref_count.is_unique())
        };

        let block = if count == capacity {
            let new_capacity = self
                .growth
                .next_capacity(capacity)
                .ok_or_else(|| Error::allocation(capacity, size_of::<T>()))?;
            tracing::trace!(?block, capacity, new_capacity, "grow block");
            self.migrate(block, new_capacity, unique)?
        } else if !unique {
            tracing::trace!(?block, capacity, "copy shared block before append");
            self.migrate(block, capacity, unique)?
        } else {
            block
        };

        unsafe {
            Self::elements(block).add(count).write(value);
            (*block.as_ptr()).count = count + 1;
        }
        Ok(())
    }

    /// Appends every item of `iter` in order, stopping at the first error.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.append(value)?;
        }
        Ok(())
    }

    /// Moves this handle to a fresh block of `new_capacity` slots holding the
    /// current elements, and releases the old block.
    ///
    /// A uniquely owned block has its elements moved; a shared one has them
    /// cloned.
    fn migrate(
        &mut self,
        old: NonNull<Header<C>>,
        new_capacity: usize,
        unique: bool,
    ) -> Result<NonNull<Header<C>>> {
        let new = Self::allocate(new_capacity)?;
        // Owns the new block until the swap below, so a panicking clone
        // drops what was copied so far.
        let fresh = Self::from_block(new, self.growth);
        let count = unsafe { old.as_ref() }.count;
        let src = Self::elements(old);
        let dst = Self::elements(new);
        if unique {
            unsafe {
                ptr::copy_nonoverlapping(src, dst, count);
                (*new.as_ptr()).count = count;
                (*old.as_ptr()).count = 0;
            }
        } else {
            for i in 0..count {
                unsafe {
                    dst.add(i).write((*src.add(i)).clone());
                    (*new.as_ptr()).count = i + 1;
                }
            }
        }
        drop(std::mem::replace(self, fresh));
        Ok(new)
    }
}

impl<T, C: RefCount> Clone for GrowableArrayBuffer<T, C> {
    /// Retains the block; cloning a released handle yields a released handle.
    fn clone(&self) -> Self {
        match self.retain() {
            Ok(handle) => handle,
            Err(_) => GrowableArrayBuffer {
                block: None,
                growth: self.growth,
                _marker: PhantomData,
            },
        }
    }
}

impl<T, C: RefCount> Drop for GrowableArrayBuffer<T, C> {
    fn drop(&mut self) {
        if let Some(block) = self.block.take() {
            unsafe { Self::release_block(block) };
        }
    }
}

impl<T: fmt::Debug, C: RefCount> fmt::Debug for GrowableArrayBuffer<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.block {
            Some(block) => {
                let header = unsafe { block.as_ref() };
                f.debug_struct("GrowableArrayBuffer")
                    .field("values", &self.slice("fmt").unwrap_or(&[]))
                    .field("count", &header.count)
                    .field("cap", &header.capacity())
                    .field("ref_count", &header.ref_count.get())
                    .finish_non_exhaustive()
            }
            None => f.write_str("GrowableArrayBuffer(<released>)"),
        }
    }
}
