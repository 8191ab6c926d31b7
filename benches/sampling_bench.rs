use criterion::{black_box, criterion_group, criterion_main, Criterion};
use projection_core::core::types::{AlignedPair, LanguagePair};
use projection_core::learning::record_columns;
use projection_core::FormProjectionModel;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const INVENTORY: [&str; 12] = ["p", "b", "t", "d", "k", "g", "m", "n", "s", "a", "e", "o"];

fn trained_model() -> FormProjectionModel {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut model = FormProjectionModel::new(LanguagePair::new("deu", "nld"));
    for _ in 0..2_000 {
        let len = rng.gen_range(3..8);
        let columns: Vec<AlignedPair> = (0..len)
            .map(|_| {
                let upper = INVENTORY[rng.gen_range(0..INVENTORY.len())];
                let lower = if rng.gen_bool(0.7) { upper } else { INVENTORY[rng.gen_range(0..INVENTORY.len())] };
                AlignedPair::new(upper, lower, rng.gen_range(0.1..1.0))
            })
            .collect();
        record_columns(&mut model, &columns);
    }
    model.finalize(5.0).expect("trained model has weight");
    model
}

fn bench_sampling(c: &mut Criterion) {
    let model = trained_model();
    let input = ["t", "a", "g", "e", "s"];
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("sample_mapping_5_segments", |b| {
        b.iter(|| model.sample_mapping(black_box(&input), &mut rng).unwrap())
    });

    c.bench_function("finalize_2000_alignments", |b| {
        b.iter_batched(
            || model.clone(),
            |mut m| m.finalize(black_box(5.0)).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_sampling);
criterion_main!(benches);
