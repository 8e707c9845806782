//! # Twin-Sync State Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Telemetry decode | < 50µs per 10-record batch |
//! | State decision | < 10µs per batch |

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::TelemetryMessage;
use twins::domain::{decode_records, next_state};
use twins::{Attribute, Definition, State, Twin, TwinDraft};

fn batch(size: usize) -> Vec<u8> {
    let records: Vec<serde_json::Value> = (0..size)
        .map(|i| serde_json::json!({"n": format!("sensor_{i}"), "u": "Cel", "v": i as f64}))
        .collect();
    serde_json::to_vec(&records).unwrap_or_default()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("telemetry-decode");

    for size in [1, 10, 100] {
        let payload = batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("decode_records", size), &payload, |b, p| {
            b.iter(|| black_box(decode_records(p)))
        });
    }

    group.finish();
}

fn bench_next_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("state-decision");

    for attributes in [1, 10, 100] {
        let definition = Definition::with_attributes(
            (0..attributes).map(|i| (format!("attr_{i:03}"), Attribute::new("chan", format!("sub_{i}"), true))),
        );
        let twin = Twin::new("twin-1".into(), "owner".into(), TwinDraft::default(), definition, Utc::now());
        let records = decode_records(&batch(1)).unwrap_or_default();
        let last = format!("sub_{}", attributes - 1);
        let msg = TelemetryMessage::new("thing-1", "chan", &last, batch(1));
        let previous = State::default();

        group.bench_with_input(BenchmarkId::new("next_state", attributes), &attributes, |b, _| {
            b.iter(|| black_box(next_state(&previous, &twin, &records, &msg, Utc::now())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_next_state);
criterion_main!(benches);
