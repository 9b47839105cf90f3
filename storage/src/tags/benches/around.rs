use super::add::{generate_keys, DummyMetrics};
use chatdb_storage::{
    sort::Tags,
    table::{Memory, Table},
    tags::{Config, TagIndex},
};
use criterion::{black_box, criterion_group, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

#[cfg(not(full_bench))]
const N_ITEMS: [usize; 2] = [10_000, 50_000];
#[cfg(full_bench)]
const N_ITEMS: [usize; 4] = [10_000, 50_000, 100_000, 500_000];

fn bench_around(c: &mut Criterion) {
    for items in N_ITEMS {
        // Populate the index once
        let mut rng = StdRng::seed_from_u64(0);
        let keys = generate_keys(&mut rng, items);
        let mut index = TagIndex::init(
            DummyMetrics,
            Memory::new(),
            Config {
                table: Table::new(0),
            },
        );
        for key in &keys {
            index.add(Tags::new(1), key).unwrap();
        }

        for count in [10, 100] {
            let label = format!("{}/items={items} count={count}", module_path!());
            c.bench_function(&label, |b| {
                b.iter(|| {
                    let pivot = keys.choose(&mut rng).unwrap();
                    black_box(index.around(Tags::new(1), pivot, count).unwrap());
                });
            });
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_around
}
