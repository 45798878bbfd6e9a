use criterion::{Criterion, criterion_group, criterion_main};
use structpack::{
    Options, Registry, Value,
    array::array,
    object::object,
    schema::{Candidate, Layout},
};

fn gen_schema(field_count: usize) -> Candidate {
    let mut layout = Layout::named();
    for i in 0..field_count {
        layout = layout.field(format!("f{i}"), if i % 2 == 0 { "uint16" } else { "shortString" });
    }

    object(layout)
}

fn gen_value(field_count: usize) -> Value {
    (0..field_count)
        .map(|i| {
            let value = if i % 2 == 0 {
                Value::from(i * 31 % 65536)
            } else {
                Value::from(format!("field {i}"))
            };
            (format!("f{i}"), value)
        })
        .collect()
}

fn bench_objects(c: &mut Criterion) {
    let registry = Registry::new();
    for &field_count in &[1usize, 10, 50, 100] {
        let schema = gen_schema(field_count);
        let value = gen_value(field_count);
        let bytes = registry.pack(&schema, &value).unwrap();

        c.bench_function(&format!("pack_{field_count}_fields"), |b| {
            b.iter(|| registry.pack(&schema, &value).unwrap())
        });
        c.bench_function(&format!("unpack_{field_count}_fields"), |b| {
            b.iter(|| registry.unpack(&schema, &bytes).unwrap())
        });
    }
}

fn bench_arrays(c: &mut Criterion) {
    let registry = Registry::new();
    let schema = array("uint32", 4096);
    let value = Value::from((0..4096u32).collect::<Vec<_>>());

    // little-endian takes the bulk path, big-endian goes item by item
    for (name, options) in [
        ("bulk", Options::little_endian()),
        ("per_item", Options::big_endian()),
    ] {
        let bytes = registry.pack_with(&schema, &value, &options).unwrap();
        c.bench_function(&format!("pack_array_{name}"), |b| {
            b.iter(|| registry.pack_with(&schema, &value, &options).unwrap())
        });
        c.bench_function(&format!("unpack_array_{name}"), |b| {
            b.iter(|| registry.unpack_with(&schema, &bytes, &options).unwrap())
        });
    }
}

criterion_group!(benches, bench_objects, bench_arrays);
criterion_main!(benches);
