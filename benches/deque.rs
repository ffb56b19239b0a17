use alloc_containers::{Deque, LinkedList};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::collections::VecDeque;

fn bench_deque(c: &mut Criterion) {
    let n = 4096;
    {
        let mut group = c.benchmark_group("VecDeque vs Deque (Push Both Ends 4096)");
        group.bench_function("std::collections::VecDeque", |b| {
            b.iter(|| {
                let mut d = VecDeque::new();
                for i in 0..n {
                    if i % 2 == 0 {
                        d.push_back(black_box(i));
                    } else {
                        d.push_front(black_box(i));
                    }
                }
                d
            })
        });

        group.bench_function("Deque<usize>", |b| {
            b.iter(|| {
                let mut d: Deque<usize> = Deque::new();
                for i in 0..n {
                    if i % 2 == 0 {
                        d.push_back(black_box(i));
                    } else {
                        d.push_front(black_box(i));
                    }
                }
                d
            })
        });

        group.bench_function("LinkedList<usize>", |b| {
            b.iter(|| {
                let mut d: LinkedList<usize> = LinkedList::new();
                for i in 0..n {
                    if i % 2 == 0 {
                        d.push_back(black_box(i));
                    } else {
                        d.push_front(black_box(i));
                    }
                }
                d
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("VecDeque vs Deque (Random Access 4096)");
        let d_std: VecDeque<usize> = (0..n).collect();
        let mut d_ours: Deque<usize> = Deque::new();
        for i in 0..n {
            d_ours.push_back(i);
        }

        group.bench_function("std::collections::VecDeque", |b| {
            b.iter(|| {
                for i in (0..n).step_by(7) {
                    black_box(d_std.get(black_box(i)));
                }
            })
        });

        group.bench_function("Deque<usize>", |b| {
            b.iter(|| {
                for i in (0..n).step_by(7) {
                    black_box(d_ours.get(black_box(i)));
                }
            })
        });
        group.finish();
    }
}

criterion_group!(benches, bench_deque);
criterion_main!(benches);
