//! Criterion benchmarks for the radar wire codec.
//!
//! Measures encoding and decoding latency for typical compass update sizes.
//! The broadcast loop encodes one update per viewer per tick, so at 32
//! players and a 500 ms interval the codec runs 64 times a second and must
//! stay far below the tick budget.
//!
//! Run with:
//! ```bash
//! cargo bench --package radar-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use radar_core::{compose_marker_id, encode_update, Marker, MarkerUpdateMessage, Position};
use radar_core::protocol::codec::decode_update;
use uuid::Uuid;

/// Builds the update a viewer would receive with `peers` other players online.
fn make_update(peers: usize, tick: u64) -> MarkerUpdateMessage {
    let markers: Vec<Marker> = (0..peers)
        .map(|i| {
            let id = Uuid::new_v4();
            Marker {
                id: compose_marker_id("radar_", id, tick),
                label: format!("player-{i} ({}m)", i * 17),
                icon: "Player.png".to_string(),
                position: Position::new(i as f64 * 3.0, 64.0, -(i as f64)),
            }
        })
        .collect();
    let removals = markers
        .iter()
        .map(|m| m.id.replace(&format!("_{tick}"), &format!("_{}", tick - 1)))
        .collect();
    MarkerUpdateMessage::new(markers, removals)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_update");
    for peers in [1usize, 8, 32] {
        let update = make_update(peers, 100);
        group.bench_with_input(BenchmarkId::from_parameter(peers), &update, |b, update| {
            b.iter(|| encode_update(black_box(update), 42, 12345).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_update");
    for peers in [1usize, 8, 32] {
        let bytes = encode_update(&make_update(peers, 100), 42, 12345).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(peers), &bytes, |b, bytes| {
            b.iter(|| decode_update(black_box(bytes)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
