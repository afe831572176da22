//! A growable byte string stored in a [`DynArray<u8>`].
//!
//! Content is a plain run of bytes with an explicit length. No encoding is
//! assumed, and comparisons always go over exactly `len` bytes.
//!
//! Whenever a buffer exists the byte right after the content is a zero
//! terminator, so [`ByteString::as_c_str`] can always be handed to code that
//! expects a C string. Constructing from `n` bytes therefore reserves `n + 1`
//! slots. The terminator is not part of the content: it never counts towards
//! [`ByteString::len`] and never takes part in comparisons.

use core::borrow::Borrow;
use core::ffi::CStr;
use core::fmt;
use core::hash::{Hash, Hasher};

use allocator_api2::alloc::{Allocator, Global};
use rust_alloc::vec::Vec;

use crate::array::{ArrayError, DynArray};


pub struct ByteString<A: Allocator = Global> {
    bytes: DynArray<u8, A>,
}

impl ByteString<Global> {
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArrayError> {
        Self::from_bytes_in(bytes, Global)
    }
}

impl<A: Allocator> ByteString<A> {
    /// An empty string. Nothing is allocated until content is added.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            bytes: DynArray::new_in(alloc),
        }
    }

    /// Copy `bytes` into a buffer sized for them plus the terminator.
    pub fn from_bytes_in(bytes: &[u8], alloc: A) -> Result<Self, ArrayError> {
        if bytes.is_empty() {
            return Ok(Self::new_in(alloc));
        }
        let capacity = bytes
            .len()
            .checked_add(1)
            .ok_or(ArrayError::CapacityOverflow)?;
        let mut string = Self {
            bytes: DynArray::with_capacity_in(capacity, alloc)?,
        };
        string.bytes.try_extend_from_slice(bytes)?;
        string.write_terminator();
        Ok(string)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Slots held by the buffer, terminator included.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn allocator(&self) -> &A {
        self.bytes.allocator()
    }

    /// Exactly the `len` content bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// The content as a C string.
    ///
    /// The view ends at the first zero byte. If the content itself contains
    /// a zero byte the view is shorter than [`len`](Self::len); use
    /// [`as_bytes`](Self::as_bytes) whenever the full content matters.
    pub fn as_c_str(&self) -> &CStr {
        if self.bytes.capacity() == 0 {
            return c"";
        }
        // SAFETY: with a buffer present the terminator at `len` is always
        // written, so `[0, len]` is initialized and inside the buffer.
        let with_terminator = unsafe { self.bytes.slots(self.bytes.len() + 1) };
        CStr::from_bytes_until_nul(with_terminator).unwrap_or_default()
    }

    /// An independently owned copy of the content.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Deep copy into a fresh buffer from a clone of the allocator.
    pub fn try_clone(&self) -> Result<Self, ArrayError>
    where
        A: Clone,
    {
        Self::from_bytes_in(self.as_bytes(), self.allocator().clone())
    }

    pub fn push(&mut self, byte: u8) -> Result<(), ArrayError> {
        self.push_bytes(&[byte])
    }

    /// Append `bytes`. Nothing is appended if the buffer cannot grow.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), ArrayError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let additional = bytes
            .len()
            .checked_add(1)
            .ok_or(ArrayError::CapacityOverflow)?;
        self.bytes.try_reserve(additional)?;
        self.bytes.try_extend_from_slice(bytes)?;
        self.write_terminator();
        Ok(())
    }

    /// Append the bytes of `c_str` up to, not including, its terminator.
    pub fn push_c_str(&mut self, c_str: &CStr) -> Result<(), ArrayError> {
        self.push_bytes(c_str.to_bytes())
    }

    /// Drop the content, keeping the buffer.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.write_terminator();
    }

    // keeps `as_c_str` valid, only a no-op while there is no buffer
    fn write_terminator(&mut self) {
        if let Some(slot) = self.bytes.spare_capacity_mut().first_mut() {
            slot.write(0);
        }
    }
}

impl<A: Allocator + Default> Default for ByteString<A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<A: Allocator> fmt::Debug for ByteString<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())
    }
}

impl<A: Allocator, B: Allocator> PartialEq<ByteString<B>> for ByteString<A> {
    fn eq(&self, other: &ByteString<B>) -> bool {
        self.len() == other.len() && self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> Eq for ByteString<A> {}

impl<A: Allocator> PartialEq<[u8]> for ByteString<A> {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<A: Allocator> PartialEq<&[u8]> for ByteString<A> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl<A: Allocator> PartialEq<str> for ByteString<A> {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> PartialEq<&str> for ByteString<A> {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<A: Allocator> PartialEq<CStr> for ByteString<A> {
    fn eq(&self, other: &CStr) -> bool {
        self.as_bytes() == other.to_bytes()
    }
}

// hashes like `[u8]` so `Borrow<[u8]>` lookups work in maps
impl<A: Allocator> Hash for ByteString<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl<A: Allocator> Borrow<[u8]> for ByteString<A> {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}
