use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use reportmerge_base64::{Base64StreamEncoder, encode};

fn bench_stream_encoder(c: &mut Criterion) {
    let data: Vec<u8> = (0..=255u8).cycle().take(1 << 20).collect();

    let mut group = c.benchmark_group("base64_stream");
    group.bench_function("one_shot", |b| b.iter(|| encode(black_box(&data))));

    for chunk_size in [1000usize, 8192, 65_536] {
        group.bench_with_input(
            BenchmarkId::new("chunked", chunk_size),
            &chunk_size,
            |b, &size| {
                b.iter(|| {
                    let mut enc = Base64StreamEncoder::new();
                    let mut out = String::with_capacity(data.len() * 4 / 3 + 4);
                    for chunk in data.chunks(size) {
                        enc.push_into(black_box(chunk), &mut out);
                    }
                    out.push_str(&enc.finish());
                    out
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_stream_encoder);
criterion_main!(benches);
