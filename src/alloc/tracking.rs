// `TrackingAllocator<A>` forwards to an inner allocator and keeps a record of
// every live block (ptr address -> size).
//
// it is how the store checks that containers hand back what they take, and it
// can be configured to refuse requests after a number of allocations or past a
// byte budget so failure paths can be driven on purpose.
//
// single-threaded only, the bookkeeping sits behind `Cell`/`RefCell`

use core::cell::{Cell, RefCell};
use core::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};
use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;


/// [`Allocator`] wrapper recording live allocations and injecting failures.
pub struct TrackingAllocator<A: Allocator = Global> {
    inner: A,
    records: RefCell<HashMap<usize, usize, FxBuildHasher>>,
    // successful allocations since construction
    allocations: Cell<usize>,
    allocation_limit: Option<usize>,
    byte_limit: Option<usize>,
}

impl TrackingAllocator<Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl Default for TrackingAllocator<Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> TrackingAllocator<A> {
    pub fn new_in(inner: A) -> Self {
        Self {
            inner,
            records: RefCell::new(HashMap::with_hasher(FxBuildHasher)),
            allocations: Cell::new(0),
            allocation_limit: None,
            byte_limit: None,
        }
    }

    /// Refuse every request once `limit` allocations have succeeded.
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.allocation_limit = Some(limit);
        self
    }

    /// Refuse any request that would take the live byte total above `limit`.
    pub fn with_byte_limit(mut self, limit: usize) -> Self {
        self.byte_limit = Some(limit);
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// number of blocks handed out and not yet released
    pub fn outstanding_allocs(&self) -> usize {
        self.records.borrow().len()
    }

    /// total bytes currently tracked across all live allocations
    ///
    /// this is O(n) over live allocations
    pub fn total_allocated_bytes(&self) -> usize {
        self.records.borrow().values().sum()
    }

    /// number of successful allocations since construction, released or not
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    fn admits(&self, layout: Layout) -> bool {
        if let Some(limit) = self.allocation_limit {
            if self.allocations.get() >= limit {
                return false;
            }
        }
        if let Some(limit) = self.byte_limit {
            if self.total_allocated_bytes() + layout.size() > limit {
                return false;
            }
        }
        true
    }
}

// SAFETY: blocks come straight from `inner`, which upholds the `Allocator`
// contract. We only add bookkeeping around the calls.
unsafe impl<A: Allocator> Allocator for TrackingAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        // zsts are forwarded but never recorded
        if layout.size() == 0 {
            return self.inner.allocate(layout);
        }

        if !self.admits(layout) {
            return Err(AllocError);
        }

        let block = self.inner.allocate(layout)?;
        let addr = block.as_ptr() as *const u8 as usize;
        self.records.borrow_mut().insert(addr, layout.size());
        self.allocations.set(self.allocations.get() + 1);

        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            let key = ptr.as_ptr() as usize;
            match self.records.borrow_mut().remove(&key) {
                Some(size) => debug_assert_eq!(
                    size,
                    layout.size(),
                    "deallocate called for {ptr:p} with a different layout size"
                ),
                None => debug_assert!(false, "deallocate called with unknown pointer {ptr:p}"),
            }
        }

        // SAFETY: `ptr` was allocated by `inner` with `layout`.
        unsafe { self.inner.deallocate(ptr, layout) };
    }
}
