use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv_reconcile::classify;
use csv_reconcile::compare;
use csv_reconcile::dataset::{DEFAULT_NULL_TOKENS, Dataset};
use csv_reconcile::keys::KeyColumns;
use csv_reconcile::schema_diff;
use csv_reconcile::value_diff;

fn generate_orders(name: &str, rows: usize, shift: usize) -> Dataset {
    let headers = ["order_id", "region", "amount", "ordered_at", "status"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let raw_rows = (shift..rows + shift)
        .map(|i| {
            // every 97th order repeats its predecessor to seed duplicates
            let id = if i % 97 == 0 && i > 0 { i - 1 } else { i };
            let status = match i % 3 {
                0 => "shipped",
                1 => "pending",
                _ => "processing",
            };
            vec![
                id.to_string(),
                format!("region-{}", id % 7),
                format!("{}.{:02}", id * 3 % 1000, id % 100),
                format!("2024-01-{:02}", (id % 28) + 1),
                status.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let tokens = DEFAULT_NULL_TOKENS
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>();
    Dataset::from_raw(name, headers, raw_rows, &tokens).expect("build dataset")
}

fn bench_reconcile(c: &mut Criterion) {
    let source = generate_orders("source", 20_000, 0);
    let target = generate_orders("target", 20_000, 500);
    let keys = KeyColumns::new(["order_id", "region"]).expect("keys");
    let schema = schema_diff::reconcile(&source.headers, &target.headers);

    let mut group = c.benchmark_group("reconcile");

    group.bench_function("classify", |b| {
        b.iter(|| classify::classify(&source, &target, &keys).expect("classify"));
    });

    group.bench_function("compare_values", |b| {
        b.iter(|| {
            value_diff::compare_values(&source, &target, &schema.common, &keys)
                .expect("compare values")
        });
    });

    group.bench_function("full_report", |b| {
        b.iter_batched(
            || (),
            |_| {
                let report =
                    compare::compare_datasets(&source, &target, &keys).expect("compare");
                report.render_text()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
