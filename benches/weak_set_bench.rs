use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rc_weakset::{PtrWeakSet, RcWeakSet};
use std::rc::{self, Rc};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn objects(seed: u64, n: usize) -> Vec<Rc<u64>> {
    lcg(seed).take(n).map(Rc::new).collect()
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("weak_set_insert_10k", |b| {
        b.iter_batched(
            || (RcWeakSet::<u64>::new(), objects(1, 10_000)),
            |(set, objs)| {
                for o in &objs {
                    set.insert(o);
                }
                black_box((set, objs))
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_contains_hit(c: &mut Criterion) {
    c.bench_function("weak_set_contains_hit", |b| {
        let set = RcWeakSet::new();
        let objs = objects(7, 20_000);
        for o in &objs {
            set.insert(o);
        }
        let mut it = objs.iter().cycle();
        b.iter(|| black_box(set.contains(it.next().unwrap())))
    });
}

fn bench_contains_miss(c: &mut Criterion) {
    c.bench_function("weak_set_contains_miss", |b| {
        let set = RcWeakSet::new();
        let objs = objects(11, 10_000);
        for o in &objs {
            set.insert(o);
        }
        let probes = objects(0xdead_beef, 1_000);
        let mut it = probes.iter().cycle();
        b.iter(|| black_box(set.contains(it.next().unwrap())))
    });
}

fn bench_len_after_half_dropped(c: &mut Criterion) {
    c.bench_function("weak_set_len_prune_half_10k", |b| {
        b.iter_batched(
            || {
                let set = RcWeakSet::new();
                let mut objs = objects(3, 10_000);
                for o in &objs {
                    set.insert(o);
                }
                objs.truncate(5_000);
                (set, objs)
            },
            |(set, objs)| black_box((set.len(), objs)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_iter(c: &mut Criterion) {
    c.bench_function("ptr_weak_set_iter_10k", |b| {
        let set: PtrWeakSet<rc::Weak<u64>> = PtrWeakSet::new();
        let objs = objects(5, 10_000);
        for o in &objs {
            set.insert(o);
        }
        b.iter(|| black_box(set.iter().map(|m| *m).fold(0u64, u64::wrapping_add)))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_contains_hit, bench_contains_miss, bench_len_after_half_dropped, bench_iter
}
criterion_main!(benches);
