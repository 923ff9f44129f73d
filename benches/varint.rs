use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wire_format::encode::Encoder;
use wire_format::split64::Split64;
use wire_format::writer::Writer;

fn write_varint32(c: &mut Criterion) {
  c.bench_function("write_varint32 small", |b| {
    b.iter(|| {
      let mut e = Encoder::new();
      e.write_varint32(black_box(42));
      e
    })
  });
  c.bench_function("write_varint32 large", |b| {
    b.iter(|| {
      let mut e = Encoder::new();
      e.write_varint32(black_box(u32::MAX));
      e
    })
  });
}

fn write_varint64(c: &mut Criterion) {
  c.bench_function("write_varint64", |b| {
    b.iter(|| {
      let mut e = Encoder::new();
      e.write_varint64(black_box(Split64 { low: u32::MAX, high: u32::MAX }));
      e
    })
  });
}

fn writer_message_round_trip(c: &mut Criterion) {
  c.bench_function("writer field-heavy message", |b| {
    b.iter(|| {
      let mut w = Writer::new();
      for i in 1..=32u32 {
        w.write_varint32_field(i, black_box(i * 7));
      }
      w.into_inner().unwrap()
    })
  });
}

criterion_group!(benches, write_varint32, write_varint64, writer_message_round_trip);
criterion_main!(benches);
