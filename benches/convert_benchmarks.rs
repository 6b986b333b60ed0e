//! Benchmarks for the conversion and comparison engine.
//!
//! Workloads cover the hot paths an interpreter hits on every assignment:
//! - Scalars: numeric narrowing and string parsing
//! - Structs: cross-type field copies and the JSON bridge
//! - Collections: element-wise map and slice conversion
//! - Comparison: each operand domain
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use valuecast::prelude::*;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print total time per top-level scope across recorded frames.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;
    use std::collections::HashMap;

    let Some(frame_view) = FRAME_VIEW.get() else {
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut timings: HashMap<String, i64> = HashMap::new();
    for frame in view.recent_frames() {
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            let Ok(scopes) = reader.read_top_scopes() else {
                continue;
            };
            for scope in scopes {
                if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                    *timings.entry(details.name().to_string()).or_insert(0) +=
                        scope.record.duration_ns;
                }
            }
        }
    }

    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    println!("\n=== Profiling Summary ===");
    for (name, ns) in entries {
        println!("  {name:<40} {:>10.3} ms", ns as f64 / 1_000_000.0);
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

// =============================================================================
// Fixtures
// =============================================================================

fn person() -> TypeDescriptor {
    TypeDescriptor::struct_of(vec![
        Field::new("Name", TypeDescriptor::string()).with_tag("name"),
        Field::new("Age", TypeDescriptor::int64()),
        Field::new("Score", TypeDescriptor::float64()),
        Field::new("Tags", TypeDescriptor::slice_of(TypeDescriptor::string())),
    ])
    .named("main.Person")
}

fn record() -> TypeDescriptor {
    TypeDescriptor::struct_of(vec![
        Field::new("Name", TypeDescriptor::string()),
        Field::new("Age", TypeDescriptor::string()),
        Field::new("Score", TypeDescriptor::int32()),
    ])
    .named("main.Record")
}

fn sample_record() -> DynamicValue {
    DynamicValue::structure(
        record(),
        vec![
            DynamicValue::string("alex"),
            DynamicValue::string("30"),
            DynamicValue::new(TypeDescriptor::int32(), Payload::Int(88)).unwrap(),
        ],
    )
    .unwrap()
}

fn string_map(n: usize) -> DynamicValue {
    let ty = TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::string());
    DynamicValue::map(
        ty,
        (0..n).map(|i| (DynamicValue::string(format!("k{i}")), DynamicValue::string(i.to_string()))),
    )
    .unwrap()
}

fn int_slice(n: usize) -> DynamicValue {
    let ty = TypeDescriptor::slice_of(TypeDescriptor::int64());
    DynamicValue::slice(ty, (0..n as i64).map(DynamicValue::int64).collect()).unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_scalars(c: &mut Criterion) {
    setup_profiler();
    let ctx = Context::new();
    let mut group = c.benchmark_group("scalars");

    let int8 = TypeDescriptor::int8();
    group.bench_function("int64_to_int8", |b| {
        b.iter(|| {
            let out = ctx.convert(black_box(DynamicValue::int64(42)), &int8);
            end_profiling_frame();
            black_box(out)
        })
    });

    let int64 = TypeDescriptor::int64();
    group.bench_function("hex_string_to_int64", |b| {
        b.iter(|| black_box(ctx.convert(black_box(DynamicValue::string("0x7fff_ffff")), &int64)))
    });

    let string = TypeDescriptor::string();
    group.bench_function("float64_to_string", |b| {
        b.iter(|| black_box(ctx.convert(black_box(DynamicValue::float64(3.25)), &string)))
    });

    group.finish();
    print_profiling_stats();
}

fn bench_structs(c: &mut Criterion) {
    let ctx = Context::new();
    let mut group = c.benchmark_group("structs");
    let target = person();

    group.bench_function("cross_copy", |b| {
        b.iter(|| black_box(ctx.convert(black_box(sample_record()), &target)))
    });

    let json = DynamicValue::string(r#"{"name":"alex","Age":30,"Score":1.5,"Tags":["a","b"]}"#);
    group.bench_function("from_json_string", |b| {
        b.iter(|| black_box(ctx.convert(black_box(json.clone()), &target)))
    });

    let string = TypeDescriptor::string();
    let alex = ctx.convert(json.clone(), &target).unwrap();
    group.bench_function("to_json_string", |b| {
        b.iter(|| black_box(ctx.convert(black_box(alex.clone()), &string)))
    });

    group.finish();
}

fn bench_collections(c: &mut Criterion) {
    let ctx = Context::new();
    let mut group = c.benchmark_group("collections");
    let int_map = TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::int64());
    let float_slice = TypeDescriptor::slice_of(TypeDescriptor::float64());

    for size in [16usize, 256, 4096] {
        group.throughput(Throughput::Elements(size as u64));

        let map = string_map(size);
        group.bench_with_input(BenchmarkId::new("map_entries", size), &map, |b, map| {
            b.iter(|| black_box(ctx.convert(map.clone(), &int_map)))
        });

        let slice = int_slice(size);
        group.bench_with_input(BenchmarkId::new("slice_elements", size), &slice, |b, slice| {
            b.iter(|| black_box(ctx.convert(slice.clone(), &float_slice)))
        });
    }

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let ctx = Context::new();
    let mut group = c.benchmark_group("compare");

    let pairs = [
        ("numeric_mixed", DynamicValue::uint64(5), DynamicValue::int64(-1)),
        ("numeric_float", DynamicValue::float64(1.5), DynamicValue::int64(2)),
        ("text", DynamicValue::string("apple"), DynamicValue::int64(10)),
        ("bool", DynamicValue::bool(true), DynamicValue::int64(1)),
    ];

    for (name, left, right) in &pairs {
        group.bench_function(*name, |b| {
            b.iter(|| black_box(ctx.compare_op(black_box(left), black_box(right), CompareOp::Eq)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scalars,
    bench_structs,
    bench_collections,
    bench_compare
);
criterion_main!(benches);
