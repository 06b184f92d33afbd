use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use focas_client::{AddressRange, DataType, PmcArea, PmcValue, Reply, Request};

fn bench_decode(c: &mut Criterion) {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let mut group = c.benchmark_group("decode");
    for data_type in DataType::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(data_type),
            &data_type,
            |b, &data_type| b.iter(|| data_type.decode(black_box(&payload))),
        );
    }
    group.finish();
}

fn bench_fragments(c: &mut Criterion) {
    let range = AddressRange::new(PmcArea::D, DataType::Long, 0, 9_999).unwrap();
    c.bench_function("fragments D0-D9999 LONG", |b| {
        b.iter(|| black_box(&range).fragments(black_box(256)))
    });
}

fn bench_reply_values(c: &mut Criterion) {
    let range = AddressRange::new(PmcArea::R, DataType::Word, 0, 127).unwrap();
    let reply = Reply::ok((0..256u16).map(|i| i as u8).collect());
    c.bench_function("reply to_values R0-R127 WORD", |b| {
        b.iter(|| black_box(&reply).to_values(black_box(&range)))
    });
}

fn bench_write_request(c: &mut Criterion) {
    let range = AddressRange::new(PmcArea::D, DataType::Double, 0, 31).unwrap();
    let values: Vec<PmcValue> = (0..32).map(|i| PmcValue::Double(f64::from(i) * 0.25)).collect();
    c.bench_function("write request D0-D31 DOUBLE", |b| {
        b.iter(|| Request::write_pmc_range(black_box(range), black_box(&values)))
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_fragments,
    bench_reply_values,
    bench_write_request
);
criterion_main!(benches);
