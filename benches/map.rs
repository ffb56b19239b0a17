use alloc_containers::{HashMap, HashSet};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn bench_map(c: &mut Criterion) {
    let n = 1000;
    {
        let mut group = c.benchmark_group("HashMap vs open-addressed HashMap (Insert 1000)");
        group.bench_function("std::collections::HashMap", |b| {
            b.iter(|| {
                let mut m = std::collections::HashMap::new();
                for i in 0..n {
                    m.insert(black_box(i as u64), black_box(i as u64));
                }
                m
            })
        });

        group.bench_function("HashMap<u64, u64>", |b| {
            b.iter(|| {
                let mut m: HashMap<u64, u64> = HashMap::new();
                for i in 0..n {
                    m.insert(black_box(i as u64), black_box(i as u64));
                }
                m
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("HashMap vs open-addressed HashMap (Get 1000)");
        let mut m_std = std::collections::HashMap::new();
        let mut m_ours: HashMap<u64, u64> = HashMap::new();
        for i in 0..n {
            m_std.insert(i as u64, i as u64);
            m_ours.insert(i as u64, i as u64);
        }

        group.bench_function("std::collections::HashMap", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_std.get(&black_box(i as u64)));
                }
            })
        });

        group.bench_function("HashMap<u64, u64>", |b| {
            b.iter(|| {
                for i in 0..n {
                    black_box(m_ours.get(&black_box(i as u64)));
                }
            })
        });
        group.finish();
    }
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Tombstone Churn (insert/remove 10000)");
    let mut rng = StdRng::seed_from_u64(7);
    let keys: Vec<u32> = (0..10_000).map(|_| rng.r#gen::<u32>() % 512).collect();

    group.bench_function("HashMap<u32, u32>", |b| {
        b.iter(|| {
            let mut m: HashMap<u32, u32> = HashMap::new();
            for &k in &keys {
                if m.remove(&k).is_none() {
                    m.insert(k, k);
                }
            }
            m.len()
        })
    });

    group.bench_function("HashSet<u32>", |b| {
        b.iter(|| {
            let mut s: HashSet<u32> = HashSet::new();
            for &k in &keys {
                if !s.remove(&k) {
                    s.insert(k);
                }
            }
            s.len()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_map, bench_churn);
criterion_main!(benches);
