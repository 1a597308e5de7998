use criterion::{criterion_group, criterion_main, Criterion};
use sajc::{compress, compress_columnar_post, decompress, Record, Value};

fn sample_batch(rows: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            let mut record = Record::new();
            record.insert(
                "id".to_string(),
                Value::String(format!("550e8400-e29b-41d4-a716-{i:012}")),
            );
            record.insert("count".to_string(), Value::Number(i as f64));
            record.insert("active".to_string(), Value::Bool(i % 2 == 0));
            record.insert(
                "tag".to_string(),
                Value::String(["red", "green", "blue"][i % 3].to_string()),
            );
            record
        })
        .collect()
}

fn bench_compress(c: &mut Criterion) {
    let batch = sample_batch(1_000);

    c.bench_function("compress standard", |b| {
        b.iter(|| compress(&batch).unwrap());
    });

    c.bench_function("compress columnar post", |b| {
        b.iter(|| compress_columnar_post(&batch).unwrap());
    });

    let encoded = compress(&batch).unwrap();
    c.bench_function("decompress standard", |b| {
        b.iter(|| decompress(&encoded).unwrap());
    });
}

criterion_group!(benches, bench_compress);
criterion_main!(benches);
