//! A growable, contiguous array that allocates through an injected allocator.
//!
//! Growth doubles the capacity (starting from one slot), so a run of `n`
//! pushes costs `O(log n)` reallocations. Every growth is all-or-nothing: the
//! new buffer is requested before anything is touched, and a refused request
//! leaves the array exactly as it was.
//!
//! The array is move-only. Dropping it drops the live elements and releases
//! the buffer to the allocator that produced it. A deep copy is available
//! through [`DynArray::try_clone`].

use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ops::{Index, IndexMut};
use core::ptr::{self, NonNull};
use core::slice;

use allocator_api2::alloc::{Allocator, Global, Layout};


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayError {
    /// The allocator refused to hand out a buffer.
    OutOfMemory,
    /// The requested capacity, or its size in bytes, overflows.
    CapacityOverflow,
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("allocator could not satisfy the request"),
            Self::CapacityOverflow => f.write_str("capacity overflow"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
        }
    }
}

impl core::error::Error for ArrayError {}

/// A buffer taken out of a [`DynArray`] by [`DynArray::detach`].
///
/// Whoever holds it is responsible for the `len` live elements and for
/// releasing the `capacity`-slot buffer, usually by handing it back with
/// [`DynArray::from_raw_parts_in`].
#[derive(Debug)]
pub struct RawParts<T> {
    pub ptr: NonNull<T>,
    pub len: usize,
    pub capacity: usize,
}

pub struct DynArray<T, A: Allocator = Global> {
    // `None` exactly when `capacity == 0`
    buffer: Option<NonNull<T>>,
    capacity: usize,
    len: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

impl<T> DynArray<T, Global> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, ArrayError> {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T, A: Allocator> DynArray<T, A> {
    /// An empty array. Nothing is allocated until the first push.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buffer: None,
            capacity: 0,
            len: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// An empty array holding exactly `capacity` slots.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self, ArrayError> {
        let mut array = Self::new_in(alloc);
        if capacity > 0 {
            array.grow_to(capacity)?;
        }
        Ok(array)
    }

    /// Rebuild an array around a buffer previously taken with [`detach`].
    ///
    /// # Safety
    ///
    /// - `parts` must come from [`detach`] on an array using an allocator
    ///   equivalent to `alloc`.
    /// - The first `parts.len` elements must still be initialized.
    ///
    /// [`detach`]: DynArray::detach
    pub unsafe fn from_raw_parts_in(parts: RawParts<T>, alloc: A) -> Self {
        Self {
            buffer: (parts.capacity > 0).then_some(parts.ptr),
            capacity: parts.capacity,
            len: parts.len,
            alloc,
            _marker: PhantomData,
        }
    }

    /// Reset to the empty state without releasing anything.
    ///
    /// The old buffer and its live elements are handed back to the caller,
    /// `None` if there was no buffer.
    pub fn detach(&mut self) -> Option<RawParts<T>> {
        let ptr = self.buffer.take()?;
        let parts = RawParts {
            ptr,
            len: self.len,
            capacity: self.capacity,
        };
        self.len = 0;
        self.capacity = 0;
        Some(parts)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn as_slice(&self) -> &[T] {
        match self.buffer {
            // SAFETY: `[0, len)` is initialized and `len <= capacity`.
            Some(buffer) => unsafe { slice::from_raw_parts(buffer.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self.buffer {
            // SAFETY: `[0, len)` is initialized and `len <= capacity`, and we
            // hold the array mutably.
            Some(buffer) => unsafe { slice::from_raw_parts_mut(buffer.as_ptr(), self.len) },
            None => &mut [],
        }
    }

    pub fn get(&self, index: usize) -> Result<&T, ArrayError> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(ArrayError::IndexOutOfRange { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(ArrayError::IndexOutOfRange { index, len })
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Append `value`, doubling the capacity first if the array is full.
    pub fn push(&mut self, value: T) -> Result<(), ArrayError> {
        if self.len == self.capacity {
            self.grow_to(next_capacity(self.capacity)?)?;
        }
        // SAFETY: `len < capacity`, so the slot is reserve space inside the buffer.
        unsafe { self.buffer_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was live and is now outside `[0, len)`, so it is
        // read exactly once.
        Some(unsafe { self.buffer_ptr().add(self.len).read() })
    }

    /// Drop every live element. The buffer is kept.
    pub fn clear(&mut self) {
        let live: *mut [T] = self.as_mut_slice();
        // a panicking destructor must not leave dropped elements in range
        self.len = 0;
        // SAFETY: the elements were initialized and are no longer reachable.
        unsafe { ptr::drop_in_place(live) };
    }

    /// Make room for at least `additional` more elements.
    ///
    /// Capacity keeps doubling until the request fits, so reserving follows
    /// the same growth pattern as pushing one element at a time.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ArrayError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(ArrayError::CapacityOverflow)?;
        if required <= self.capacity {
            return Ok(());
        }

        let mut new_capacity = self.capacity;
        while new_capacity < required {
            new_capacity = next_capacity(new_capacity)?;
        }
        self.grow_to(new_capacity)
    }

    /// Copy `values` onto the end of the array. Either all of them land or
    /// none do.
    pub fn try_extend_from_slice(&mut self, values: &[T]) -> Result<(), ArrayError>
    where
        T: Copy,
    {
        if values.is_empty() {
            return Ok(());
        }
        self.try_reserve(values.len())?;
        // SAFETY: the reservation guarantees `values.len()` free slots after
        // `len`, and `values` cannot overlap a buffer we hold mutably.
        unsafe {
            ptr::copy_nonoverlapping(
                values.as_ptr(),
                self.buffer_ptr().add(self.len),
                values.len(),
            );
        }
        self.len += values.len();
        Ok(())
    }

    /// Deep copy into a fresh buffer from a clone of the allocator.
    pub fn try_clone(&self) -> Result<Self, ArrayError>
    where
        T: Clone,
        A: Clone,
    {
        let mut copy = Self::with_capacity_in(self.len, self.alloc.clone())?;
        for value in self.iter() {
            copy.push(value.clone())?;
        }
        Ok(copy)
    }

    // the uninitialized slots `[len, capacity)`
    pub(crate) fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
        let spare = self.capacity - self.len;
        if spare == 0 {
            return &mut [];
        }
        // SAFETY: `[len, capacity)` lies inside the buffer and `MaybeUninit`
        // makes no claim about its contents.
        unsafe {
            slice::from_raw_parts_mut(
                self.buffer_ptr().add(self.len).cast::<MaybeUninit<T>>(),
                spare,
            )
        }
    }

    /// The first `end` slots of the buffer, reaching past `len`.
    ///
    /// # Safety
    ///
    /// `end <= capacity` and every slot in `[0, end)` must be initialized.
    pub(crate) unsafe fn slots(&self, end: usize) -> &[T] {
        debug_assert!(end <= self.capacity);
        // SAFETY: upheld by the caller.
        unsafe { slice::from_raw_parts(self.buffer_ptr(), end) }
    }

    fn buffer_ptr(&self) -> *mut T {
        self.buffer.unwrap_or(NonNull::dangling()).as_ptr()
    }

    // replace the buffer with one of `new_capacity` slots, moving the live
    // elements over. nothing changes if the allocator refuses.
    fn grow_to(&mut self, new_capacity: usize) -> Result<(), ArrayError> {
        debug_assert!(new_capacity > self.capacity);

        if mem::size_of::<T>() == 0 {
            self.buffer = Some(NonNull::dangling());
            self.capacity = new_capacity;
            return Ok(());
        }

        let new_layout =
            Layout::array::<T>(new_capacity).map_err(|_| ArrayError::CapacityOverflow)?;
        let block = self
            .alloc
            .allocate(new_layout)
            .map_err(|_| ArrayError::OutOfMemory)?;
        let new_buffer = block.cast::<T>();

        if let Some(old_buffer) = self.buffer {
            // SAFETY: both buffers hold at least `len` slots and are distinct
            // allocations. The old buffer was allocated with `capacity` slots.
            unsafe {
                ptr::copy_nonoverlapping(old_buffer.as_ptr(), new_buffer.as_ptr(), self.len);
                self.alloc
                    .deallocate(old_buffer.cast(), buffer_layout::<T>(self.capacity));
            }
        }

        self.buffer = Some(new_buffer);
        self.capacity = new_capacity;
        Ok(())
    }
}

fn next_capacity(capacity: usize) -> Result<usize, ArrayError> {
    capacity
        .checked_mul(2)
        .map(|doubled| doubled.max(1))
        .ok_or(ArrayError::CapacityOverflow)
}

/// Layout of a buffer of `capacity` slots of `T`.
///
/// # Safety
///
/// `Layout::array::<T>(capacity)` must have succeeded before, which holds for
/// the capacity of any buffer the array allocated.
unsafe fn buffer_layout<T>(capacity: usize) -> Layout {
    // SAFETY: upheld by the caller.
    unsafe {
        Layout::from_size_align_unchecked(mem::size_of::<T>() * capacity, mem::align_of::<T>())
    }
}

impl<T, A: Allocator> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.clear();
        if let Some(buffer) = self.buffer.take() {
            if mem::size_of::<T>() != 0 {
                // SAFETY: the buffer was allocated by `alloc` with `capacity` slots.
                unsafe {
                    self.alloc
                        .deallocate(buffer.cast(), buffer_layout::<T>(self.capacity))
                };
            }
        }
    }
}

impl<T, A: Allocator + Default> Default for DynArray<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B> PartialEq<DynArray<U, B>> for DynArray<T, A>
where
    T: PartialEq<U>,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &DynArray<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: Allocator> Eq for DynArray<T, A> {}

impl<T, A: Allocator> Index<usize> for DynArray<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T, A: Allocator> IndexMut<usize> for DynArray<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
