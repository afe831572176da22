//! A short byte string stored inline, for bounded names and labels.
//!
//! [`FixedString`] holds at most [`FixedString::MAX_LEN`] bytes in a
//! 32-byte array and never allocates. Longer input is silently truncated to
//! its first 31 bytes: construction cannot fail, and callers that care can
//! check [`FixedString::fits`] first.

use core::ffi::CStr;
use core::fmt;

use rust_alloc::vec::Vec;


const INLINE_CAPACITY: usize = 32;

#[derive(Clone, Copy)]
pub struct FixedString {
    // `data[len..]` is all zeros, so `data[len]` is the terminator
    data: [u8; INLINE_CAPACITY],
    len: u8,
}

impl FixedString {
    /// Size of the inline buffer, terminator slot included.
    pub const CAPACITY: usize = INLINE_CAPACITY;
    pub const MAX_LEN: usize = Self::CAPACITY - 1;

    pub const fn new() -> Self {
        Self {
            data: [0; Self::CAPACITY],
            len: 0,
        }
    }

    /// Copy at most [`MAX_LEN`](Self::MAX_LEN) bytes of `bytes`, dropping the
    /// rest.
    pub const fn from_bytes(bytes: &[u8]) -> Self {
        let len = if bytes.len() < Self::MAX_LEN {
            bytes.len()
        } else {
            Self::MAX_LEN
        };

        let mut data = [0; Self::CAPACITY];
        let mut i = 0;
        while i < len {
            data[i] = bytes[i];
            i += 1;
        }

        Self {
            data,
            len: len as u8,
        }
    }

    /// Whether `bytes` is stored without truncation.
    pub const fn fits(bytes: &[u8]) -> bool {
        bytes.len() <= Self::MAX_LEN
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// The content as a C string, ending at the first zero byte.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.data[..=self.len()]).unwrap_or_default()
    }

    /// An independently owned copy of the content.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Default for FixedString {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for FixedString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&str> for FixedString {
    fn from(value: &str) -> Self {
        Self::from_bytes(value.as_bytes())
    }
}

impl fmt::Debug for FixedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.as_bytes().escape_ascii())
    }
}

impl PartialEq for FixedString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for FixedString {}

impl PartialEq<[u8]> for FixedString {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for FixedString {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

impl PartialEq<str> for FixedString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for FixedString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<CStr> for FixedString {
    fn eq(&self, other: &CStr) -> bool {
        self.as_bytes() == other.to_bytes()
    }
}
