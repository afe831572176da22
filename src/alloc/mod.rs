//! The allocation interface consumed by the containers, plus two allocators
//! the store can hand them.
//!
//! Containers are generic over [`Allocator`]; [`Global`] is the default when
//! nothing else is injected.

pub mod region;
pub mod tracking;

pub use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};
pub use region::{RegionAllocError, RegionAllocator};
pub use tracking::TrackingAllocator;
