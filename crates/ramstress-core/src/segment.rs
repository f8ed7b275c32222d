//! Page-aligned, exclusively owned memory segments.

use crate::{Error, Result};
use std::alloc::{self, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Standard memory page size (4KB).
pub const PAGE_SIZE: usize = 4096;

/// A contiguous, fixed-size byte buffer aligned to [`PAGE_SIZE`].
///
/// Allocated once through the global allocator and never resized. Owned by
/// exactly one worker; it is `Send` so it can be handed to that worker's
/// thread, but it is neither `Clone` nor shared.
pub struct Segment {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: Segment uniquely owns its allocation; access goes through &/&mut.
unsafe impl Send for Segment {}
// SAFETY: shared access is read-only through Deref<Target = [u8]>.
unsafe impl Sync for Segment {}

impl Segment {
    /// Allocate `len` zeroed bytes on a page boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero length and
    /// [`Error::AllocationFailed`] when the allocator is exhausted.
    pub fn zeroed(len: usize) -> Result<Self> {
        let layout = Self::layout(len)?;
        // SAFETY: layout has a non-zero size (checked in `layout`).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(Error::AllocationFailed { requested: len })?;
        Ok(Self { ptr, len })
    }

    fn layout(len: usize) -> Result<Layout> {
        if len == 0 {
            return Err(Error::InvalidConfig("segment length must be non-zero".to_string()));
        }
        Layout::from_size_align(len, PAGE_SIZE)
            .map_err(|e| Error::InvalidConfig(format!("bad segment layout for {len} bytes: {e}")))
    }

    /// Capacity in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; zero-length segments cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Contents as a byte slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for len initialised bytes for the life of self.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Contents as a mutable byte slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for len bytes and &mut self guarantees uniqueness.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Deref for Segment {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for Segment {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        // Constructed only through `zeroed`, so the layout is valid.
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: ptr came from alloc_zeroed with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("addr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
