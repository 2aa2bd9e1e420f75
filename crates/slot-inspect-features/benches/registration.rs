use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slot_inspect_core::{Budget, GrayImage};
use slot_inspect_features::{match_descriptors, OrbExtractor, Registrar};

fn textured(w: usize, h: usize, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![128u8; w * h];
    for _ in 0..(w * h / 300) {
        let x0 = rng.gen_range(0..w);
        let y0 = rng.gen_range(0..h);
        let bw = rng.gen_range(5..35);
        let bh = rng.gen_range(5..35);
        let v: u8 = rng.gen();
        for y in y0..(y0 + bh).min(h) {
            for x in x0..(x0 + bw).min(w) {
                data[y * w + x] = v;
            }
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}

fn bench_extract(c: &mut Criterion) {
    let img = textured(640, 480, 1);
    let orb = OrbExtractor::default();
    let budget = Budget::unlimited();
    c.bench_function("orb_extract_640x480", |b| {
        b.iter(|| orb.extract(black_box(&img.view()), &budget))
    });
}

fn bench_match(c: &mut Criterion) {
    let img = textured(640, 480, 2);
    let budget = Budget::unlimited();
    let set = match OrbExtractor::default().extract(&img.view(), &budget) {
        Ok(set) => set,
        Err(_) => return,
    };
    c.bench_function("match_cross_check", |b| {
        b.iter(|| match_descriptors(black_box(&set.descriptors), &set.descriptors, 100))
    });
}

fn bench_align_cached(c: &mut Criterion) {
    let reference = textured(640, 480, 3);
    let test = textured(640, 480, 3);
    let registrar = Registrar::default();
    let budget = Budget::unlimited();
    c.bench_function("align_cached_reference", |b| {
        b.iter(|| registrar.align(black_box(&reference.view()), &test.view(), &budget))
    });
}

criterion_group!(benches, bench_extract, bench_match, bench_align_cached);
criterion_main!(benches);
