use bond_lite::{Buffer, WireType, Writer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

pub fn varint(c: &mut Criterion) {
  c.bench_function("varint write", |b| {
    let mut buf = Buffer::with_capacity(16 * 1024);
    b.iter(|| {
      buf.clear();
      let mut w = Writer::new(&mut buf);
      for v in 0..1000_u64 {
        w.write_u64_value(black_box(v * v));
      }
    })
  });
  c.bench_function("varint read", |b| {
    let mut buf = Buffer::with_capacity(16 * 1024);
    let mut w = Writer::new(&mut buf);
    for v in 0..1000_u64 {
      w.write_u64_value(v * v);
    }
    b.iter(|| {
      let mut r = buf.reader();
      let mut sum = 0_u64;
      for _ in 0..1000 {
        sum = sum.wrapping_add(r.read_u64_value().unwrap());
      }
      black_box(sum)
    })
  });
}

pub fn structs(c: &mut Criterion) {
  c.bench_function("struct round trip", |b| {
    let mut buf = Buffer::with_capacity(4 * 1024);
    b.iter(|| {
      buf.clear();
      let mut w = Writer::new(&mut buf);
      w.write_str(1, black_box("a person"));
      w.write_u32(2, black_box(42));
      w.write_list_begin(3, WireType::Int32, 8);
      for v in -4..4 {
        w.write_i32_value(v);
      }
      w.struct_end();

      let mut r = buf.reader();
      loop {
        let (_, ty) = r.read_field_header().unwrap();
        if ty == WireType::Stop {
          break;
        }
        r.skip(ty).unwrap();
      }
      black_box(r.index())
    })
  });
}

criterion_group!(benches, varint, structs);
criterion_main!(benches);
