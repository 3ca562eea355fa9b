use criterion::{black_box, criterion_group, criterion_main, Criterion};
use odbc_cursor::codec::datetime::{parse_timestamp, DateOptions};
use odbc_cursor::codec::decimal::{numeric_to_text, text_to_numeric};
use odbc_cursor::engine::ChunkedTransfer;
use odbc_cursor::{Charset, CodecOptions, ColumnDescriptor, SqlType, Target};

fn benchmark_decimal_encode(c: &mut Criterion) {
    c.bench_function("decimal_encode_38_digits", |b| {
        b.iter(|| text_to_numeric(black_box("1234567890123456789012345678.9012345678"), 38, 10))
    });
    c.bench_function("decimal_encode_truncating", |b| {
        b.iter(|| text_to_numeric(black_box("-98765.43210"), 12, 2))
    });
}

fn benchmark_decimal_decode(c: &mut Criterion) {
    let (n, _) = text_to_numeric("1234567890123456789012345678.9012345678", 38, 10)
        .expect("valid decimal");
    c.bench_function("decimal_decode_38_digits", |b| {
        b.iter(|| numeric_to_text(black_box(&n)))
    });
}

fn benchmark_timestamp_parse(c: &mut Criterion) {
    let options = DateOptions::default();
    c.bench_function("timestamp_parse_separated", |b| {
        b.iter(|| parse_timestamp(black_box("2025-02-13 14:05:09.123456"), &options))
    });
    c.bench_function("timestamp_parse_compact", |b| {
        b.iter(|| parse_timestamp(black_box("20250213140509"), &options))
    });
}

fn benchmark_decode_timestamp_cell(c: &mut Criterion) {
    let column = ColumnDescriptor::new("ts", SqlType::Timestamp);
    let options = CodecOptions {
        charset: Charset::Utf8,
        ..CodecOptions::default()
    };
    c.bench_function("decode_timestamp_cell", |b| {
        b.iter(|| {
            let mut out = odbc_cursor::Timestamp::default();
            let mut transfer = ChunkedTransfer::new();
            let _ = transfer.begin_column(0, 1);
            odbc_cursor::codec::decode(
                Some(black_box(&b"2025-02-13 14:05:09"[..])),
                &column,
                &mut Target::Timestamp(&mut out),
                &mut transfer,
                &options,
            )
        })
    });
}

criterion_group!(
    benches,
    benchmark_decimal_encode,
    benchmark_decimal_decode,
    benchmark_timestamp_parse,
    benchmark_decode_timestamp_cell
);
criterion_main!(benches);
