use allocator_api2::alloc::{Allocator, Layout};

use super::{RegionAllocError, RegionAllocator};

#[test]
fn allocations_come_from_the_region() {
    let region = RegionAllocator::try_init(256, 16).unwrap();

    let layout = Layout::from_size_align(32, 8).unwrap();
    let a = region.allocate(layout).unwrap();
    let b = region.allocate(layout).unwrap();

    assert!(region.owns(a.cast()));
    assert!(region.owns(b.cast()));
    assert_eq!(region.live_allocations(), 2);
    assert_eq!(region.used(), 64);
    assert_eq!(region.remaining(), 192);

    unsafe {
        region.deallocate(b.cast(), layout);
        region.deallocate(a.cast(), layout);
    }
    assert_eq!(region.live_allocations(), 0);
}

#[test]
fn exhausted_region_refuses_requests() {
    let region = RegionAllocator::try_init(64, 8).unwrap();

    let layout = Layout::from_size_align(48, 8).unwrap();
    let block = region.allocate(layout).expect("first request fits");
    assert!(
        region.allocate(layout).is_err(),
        "second request must not fit in the remaining 16 bytes"
    );

    unsafe { region.deallocate(block.cast(), layout) };
}

#[test]
fn releasing_last_allocation_rewinds() {
    let region = RegionAllocator::try_init(128, 8).unwrap();

    let small = Layout::from_size_align(16, 8).unwrap();
    let large = Layout::from_size_align(64, 8).unwrap();

    let a = region.allocate(small).unwrap();
    let b = region.allocate(large).unwrap();
    assert_eq!(region.used(), 80);

    unsafe { region.deallocate(b.cast(), large) };
    assert_eq!(region.used(), 16, "bump pointer must rewind past `b`");

    // reuses the space `b` occupied
    let c = region.allocate(large).unwrap();
    assert_eq!(c.cast::<u8>(), b.cast::<u8>());

    unsafe {
        region.deallocate(c.cast(), large);
        region.deallocate(a.cast(), small);
    }
}

#[test]
fn releasing_everything_resets_the_region() {
    let region = RegionAllocator::try_init(128, 8).unwrap();
    let layout = Layout::from_size_align(16, 8).unwrap();

    let a = region.allocate(layout).unwrap();
    let b = region.allocate(layout).unwrap();

    // `a` is not the last allocation, nothing to rewind yet
    unsafe { region.deallocate(a.cast(), layout) };
    assert_eq!(region.used(), 32);

    unsafe { region.deallocate(b.cast(), layout) };
    assert_eq!(region.used(), 0);
    assert_eq!(region.remaining(), region.capacity());
}

#[test]
fn alignment_is_respected() {
    let region = RegionAllocator::try_init(512, 16).unwrap();

    // misalign the bump pointer first
    let byte = Layout::from_size_align(1, 1).unwrap();
    let _ = region.allocate(byte).unwrap();

    for align_shift in 0..=4 {
        let align = 1usize << align_shift;
        let layout = Layout::from_size_align(8, align).unwrap();
        let block = region.allocate(layout).unwrap();
        let addr = block.as_ptr() as *const u8 as usize;
        assert_eq!(addr % align, 0, "not aligned to {align}");
    }
}

#[test]
fn alignment_above_region_alignment_is_refused() {
    let region = RegionAllocator::try_init(256, 8).unwrap();
    let layout = Layout::from_size_align(16, 32).unwrap();
    assert!(region.allocate(layout).is_err());
}

#[test]
fn zero_sized_requests_do_not_use_the_region() {
    let region = RegionAllocator::try_init(64, 8).unwrap();
    let layout = Layout::new::<()>();
    let block = region.allocate(layout).unwrap();
    assert_eq!(block.len(), 0);
    assert_eq!(region.used(), 0);
    assert_eq!(region.live_allocations(), 0);
    unsafe { region.deallocate(block.cast(), layout) };
}

#[test]
fn invalid_region_configuration() {
    assert!(matches!(
        RegionAllocator::try_init(0, 8),
        Err(RegionAllocError::OutOfMemory)
    ));
    assert!(matches!(
        RegionAllocator::try_init(64, 3),
        Err(RegionAllocError::Layout(_))
    ));
}
