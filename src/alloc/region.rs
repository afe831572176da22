//! A fixed-size memory region with bump allocation.
//!
//! The store normally hands its containers a persistent-memory arena. This
//! region behaves the same way from the containers' point of view: every
//! allocation comes out of one pre-reserved block, and once the block is
//! spent further requests fail instead of falling back to the heap.
//!
//! Releasing the most recent allocation rewinds the bump pointer, and the
//! whole region is rewound as soon as nothing inside it is live.

use core::{cell::Cell, ptr::NonNull};

use allocator_api2::alloc::{AllocError, Allocator};
use rust_alloc::alloc::{Layout, LayoutError, alloc, dealloc};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub enum RegionAllocError {
    Layout(LayoutError),
    OutOfMemory,
    AlignmentNotPossible,
}

impl From<LayoutError> for RegionAllocError {
    fn from(value: LayoutError) -> Self {
        Self::Layout(value)
    }
}

impl core::fmt::Display for RegionAllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Layout(err) => write!(f, "invalid region layout: {err}"),
            Self::OutOfMemory => f.write_str("region has no room for the request"),
            Self::AlignmentNotPossible => {
                f.write_str("requested alignment exceeds the region alignment")
            }
        }
    }
}

impl core::error::Error for RegionAllocError {}

/// A bump allocator over a single block of memory.
///
/// Single-threaded only, the bookkeeping lives in `Cell`s so allocation works
/// through `&self` as the [`Allocator`] trait requires.
#[derive(Debug)]
pub struct RegionAllocator {
    layout: Layout,
    buffer: NonNull<u8>,
    // offset of the first free byte
    bump: Cell<usize>,
    live: Cell<usize>,
}

impl RegionAllocator {
    /// Reserve a region of `region_size` bytes aligned to `max_align`.
    ///
    /// No allocation served from the region can ask for a stricter alignment
    /// than `max_align`.
    pub fn try_init(region_size: usize, max_align: usize) -> Result<Self, RegionAllocError> {
        if region_size == 0 {
            return Err(RegionAllocError::OutOfMemory);
        }
        let layout = Layout::from_size_align(region_size, max_align)?;
        // SAFETY: `layout` has a non-zero size.
        let data = unsafe { alloc(layout) };
        let Some(buffer) = NonNull::new(data) else {
            return Err(RegionAllocError::OutOfMemory);
        };

        Ok(Self {
            layout,
            buffer,
            bump: Cell::new(0),
            live: Cell::new(0),
        })
    }

    /// Total size of the region in bytes.
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Bytes between the start of the region and the bump pointer, padding
    /// included.
    pub fn used(&self) -> usize {
        self.bump.get()
    }

    pub fn remaining(&self) -> usize {
        self.layout.size() - self.bump.get()
    }

    /// Number of allocations handed out and not yet released.
    pub fn live_allocations(&self) -> usize {
        self.live.get()
    }

    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let start = self.buffer.as_ptr() as usize;
        let target = ptr.as_ptr() as usize;
        target >= start && target < start + self.layout.size()
    }

    fn try_alloc_bytes(&self, layout: Layout) -> Result<NonNull<[u8]>, RegionAllocError> {
        let size = layout.size();
        let align = layout.align();

        if align > self.layout.align() {
            return Err(RegionAllocError::AlignmentNotPossible);
        }

        // SAFETY: the bump offset never exceeds the region size.
        let current = unsafe { self.buffer.add(self.bump.get()) };

        let padding = current.align_offset(align);
        if padding == usize::MAX {
            return Err(RegionAllocError::AlignmentNotPossible);
        }

        let offset = self.bump.get() + padding;
        match offset.checked_add(size) {
            Some(end) if end <= self.layout.size() => self.bump.set(end),
            _ => return Err(RegionAllocError::OutOfMemory),
        }

        // SAFETY: `offset + size` is within the region, so the pointer is in
        // bounds and derived from a non-null buffer.
        let ptr = unsafe { self.buffer.add(offset) };
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }
}

impl Drop for RegionAllocator {
    fn drop(&mut self) {
        // SAFETY: `buffer` was allocated in `try_init` with `layout`.
        unsafe { dealloc(self.buffer.as_ptr(), self.layout) };
    }
}

// SAFETY: every block returned lies inside the region, is aligned to the
// requested layout and stays valid until released or the region is dropped.
// The region cannot be dropped while a borrow handed to a container is alive.
unsafe impl Allocator for RegionAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            // SAFETY: `layout.align()` is never zero.
            let dangling = unsafe { NonNull::new_unchecked(layout.align() as *mut u8) };
            return Ok(NonNull::slice_from_raw_parts(dangling, 0));
        }

        let block = self.try_alloc_bytes(layout).map_err(|_| AllocError)?;
        self.live.set(self.live.get() + 1);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        if !self.owns(ptr) {
            debug_assert!(
                false,
                "deallocate called with pointer {ptr:p} outside of the region"
            );
            return;
        }

        let live = self.live.get().saturating_sub(1);
        self.live.set(live);

        if live == 0 {
            self.bump.set(0);
            return;
        }

        // rewind if this was the last allocation in the region
        let offset = ptr.as_ptr() as usize - self.buffer.as_ptr() as usize;
        if offset + layout.size() == self.bump.get() {
            self.bump.set(offset);
        }
    }
}
