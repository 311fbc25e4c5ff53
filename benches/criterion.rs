// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use shape_transitions::{
    CreateHeapData, Heap, PropertyDetails, PropertyName, Shape, ShapeRecord, TransitionArray,
};

const SIZES: [usize; 4] = [1, 8, 64, 512];

fn names(heap: &mut Heap, n: usize) -> Vec<PropertyName> {
    (0..n).map(|i| heap.intern(&format!("property{i}"))).collect()
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    for size in SIZES {
        let mut heap = Heap::default();
        let owner = Shape::create_root(&mut heap, None);
        let keys = names(&mut heap, size);
        let (array, witness) = TransitionArray::allocate(&mut heap, size);
        for (i, &key) in keys.iter().enumerate() {
            let target = heap.create(ShapeRecord::root(None));
            array.set_entry(&mut heap, i, key, target, &witness).unwrap();
        }
        witness.publish(&mut heap, owner).unwrap();

        let mut probes = keys.clone();
        probes.shuffle(&mut StdRng::seed_from_u64(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &probes, |b, probes| {
            b.iter(|| {
                for &key in probes {
                    black_box(array.search(&heap, key));
                }
            })
        });
    }
    group.finish();
}

fn bench_add_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_transition");
    for size in SIZES {
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter_batched(
                || {
                    let mut heap = Heap::default();
                    let mut keys = names(&mut heap, size);
                    keys.shuffle(&mut StdRng::seed_from_u64(size as u64));
                    (heap, keys)
                },
                |(mut heap, keys)| {
                    let owner = Shape::create_root(&mut heap, None);
                    for (i, key) in keys.into_iter().enumerate() {
                        let details = PropertyDetails::data_field(i as u32);
                        black_box(owner.add_property(&mut heap, key, details).unwrap());
                    }
                    heap
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search, bench_add_transition);
criterion_main!(benches);
