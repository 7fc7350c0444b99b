use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tidings_event_bus::{Bus, Event, SelectOptions};

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    group.throughput(Throughput::Elements(1));

    for subscribers in [0usize, 1, 8] {
        let bus = Bus::<u64>::new();
        let mut subs: Vec<_> = (0..subscribers).map(|_| bus.select("tick").subscribe()).collect();
        let mut main = bus.main_stream().subscribe();

        group.bench_with_input(BenchmarkId::new("plain", subscribers), &subscribers, |b, _| {
            b.iter(|| {
                black_box(bus.emit(Event::new("tick", 1)));
                for sub in &mut subs {
                    sub.drain();
                }
                main.drain();
            });
        });
    }

    let bus = Bus::<u64>::builder().retain("tick", 64).build().unwrap();
    group.bench_function("with_history", |b| {
        b.iter(|| black_box(bus.emit(Event::new("tick", 1))));
    });

    group.finish();
}

fn bench_subscribe(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe");

    for retained in [1usize, 64, 1024] {
        let bus = Bus::<u64>::builder().retain("tick", retained).build().unwrap();
        for i in 0..retained as u64 {
            bus.emit(Event::new("tick", i));
        }
        let partial = bus.select_with("tick", SelectOptions::new().history_length(1)).unwrap();

        group.bench_with_input(BenchmarkId::new("full_replay", retained), &retained, |b, _| {
            b.iter(|| black_box(bus.select("tick").subscribe()));
        });
        group.bench_with_input(BenchmarkId::new("partial_replay", retained), &retained, |b, _| {
            b.iter(|| black_box(partial.subscribe()));
        });
        group.bench_with_input(BenchmarkId::new("main_stream", retained), &retained, |b, _| {
            b.iter(|| black_box(bus.main_stream().subscribe()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_emit, bench_subscribe);
criterion_main!(benches);
