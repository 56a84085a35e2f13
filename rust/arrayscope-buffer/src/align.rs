/// Aligns a number up to the next multiple of the specified alignment.
///
/// If the input is already aligned, it is returned unchanged.
///
/// # Examples
///
/// ```
/// use arrayscope_buffer::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(24, 16), 32);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is 0 or not a power of 2.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// ```
/// use arrayscope_buffer::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if a pointer is aligned to the specified alignment boundary.
#[inline]
pub fn is_aligned_ptr<T>(ptr: *const T, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}
