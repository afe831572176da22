//! Container primitives for a persistent-memory key-value store.
//!
//! Everything here allocates through an injected [`Allocator`] rather than the
//! process heap, so the store can place its keys and values inside its own
//! memory region:
//!
//! - [`DynArray`]: a growable, contiguous array.
//! - [`ByteString`]: a growable byte string built on a `DynArray<u8>`.
//! - [`FixedString`]: a 31-byte inline string that never allocates.
//!
//! [`Allocator`]: allocator_api2::alloc::Allocator

#![no_std]

extern crate alloc as rust_alloc;

pub mod alloc;
pub mod array;
pub mod fixed;
pub mod string;

pub use array::{ArrayError, DynArray};
pub use fixed::FixedString;
pub use string::ByteString;
