use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use value_hashmap::{Value, ValueHashMap};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

// Mixed-type column with a bounded number of distinct values.
fn column(n: usize, distinct: u64) -> Vec<Value> {
    lcg(42)
        .take(n)
        .map(|x| {
            let d = (x >> 8) % distinct;
            match x % 3 {
                0 => Value::BigInt(d as i64),
                1 => Value::Varchar(format!("v{}", d)),
                _ => Value::Decimal(d as f64 / 4.0),
            }
        })
        .collect()
}

fn bench_distinct(c: &mut Criterion) {
    let col = column(100_000, 5_000);
    c.bench_function("value::distinct_100k_rows", |b| {
        b.iter(|| {
            let mut set: ValueHashMap<()> = ValueHashMap::new();
            for v in &col {
                set.put(v.clone(), ());
            }
            black_box(set.len())
        })
    });
}

fn bench_group_count(c: &mut Criterion) {
    let col = column(100_000, 500);
    c.bench_function("value::group_count_100k_rows", |b| {
        b.iter(|| {
            let mut groups: ValueHashMap<u64> = ValueHashMap::new();
            for v in &col {
                match groups.get_mut(v) {
                    Some(n) => *n += 1,
                    None => {
                        groups.put(v.clone(), 1);
                    }
                }
            }
            black_box(groups.len())
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_distinct, bench_group_count
}
criterion_main!(benches);
