use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pmkv_containers::alloc::RegionAllocator;
use pmkv_containers::{ByteString, DynArray, FixedString};

const PUSHES: u64 = 4_096;

fn array_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_push");

    group.bench_function("dyn_array_global", |b| {
        b.iter(|| {
            let mut array = DynArray::new();
            for i in 0..PUSHES {
                array.push(black_box(i)).unwrap();
            }
            black_box(array.len())
        })
    });

    group.bench_function("dyn_array_region", |b| {
        // 1 + 2 + ... + 4096 slots of u64 are carved out before any rewind
        let region = RegionAllocator::try_init(8 * 8_192, 16).unwrap();
        b.iter(|| {
            let mut array = DynArray::new_in(&region);
            for i in 0..PUSHES {
                array.push(black_box(i)).unwrap();
            }
            black_box(array.len())
        })
    });

    group.bench_function("std_vec", |b| {
        b.iter(|| {
            let mut vec = Vec::new();
            for i in 0..PUSHES {
                vec.push(black_box(i));
            }
            black_box(vec.len())
        })
    });

    group.finish();
}

fn string_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_append");

    group.bench_function("byte_string_push_bytes", |b| {
        b.iter(|| {
            let mut string = ByteString::new();
            for _ in 0..256 {
                string.push_bytes(black_box(b"key:value;")).unwrap();
            }
            black_box(string.len())
        })
    });

    group.bench_function("fixed_string_from_bytes", |b| {
        b.iter(|| black_box(FixedString::from_bytes(black_box(b"a-reasonably-short-label"))))
    });

    group.finish();
}

criterion_group!(benches, array_push, string_append);
criterion_main!(benches);
