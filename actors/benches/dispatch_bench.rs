//! Throughput of `WorkStealingDispatcher::dispatch_send` under two regimes:
//! a single busy actor (no thief available) and a pair of actors where one
//! is saturated and donation kicks in.

use std::sync::{mpsc, Arc};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{seq::SliceRandom, thread_rng};

use actors::{Actor, ActorCell, Envelope};
use actors::dispatcher::{DispatcherConfig, WorkStealingDispatcher};
use common::TerminateSignal;

/// A shuffled payload, so the donation benchmark isn't timing a
/// monotonically increasing sequence the branch predictor could exploit.
fn shuffled_payload(size: usize) -> Vec<u32> {
	let mut payload: Vec<u32> = (0..size as u32).collect();
	payload.shuffle(&mut thread_rng());
	payload
}

struct Counter(mpsc::Sender<u32>);

impl Actor for Counter {
	type Message = u32;
	type Reply = ();

	fn receive(&mut self, envelope: Envelope<u32, ()>) {
		let _ = self.0.send(envelope.message);
	}
}

fn single_actor_dispatcher() -> (Arc<WorkStealingDispatcher<u32, ()>>, actors::ActorRef<u32, ()>, mpsc::Receiver<u32>) {
	let dispatcher = WorkStealingDispatcher::new(DispatcherConfig::new("bench-solo", 2, 4)).unwrap();
	dispatcher.start();
	let (tx, rx) = mpsc::channel();
	let actor = ActorCell::new(Counter(tx), TerminateSignal::default());
	dispatcher.register(actor.clone()).unwrap();
	(dispatcher, actor, rx)
}

fn bench_single_actor_throughput(c: &mut Criterion) {
	let mut group = c.benchmark_group("dispatch_single_actor");
	for size in [16usize, 256, 2048] {
		group.throughput(Throughput::Elements(size as u64));
		group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
			let payload = shuffled_payload(size);
			b.iter(|| {
				let (dispatcher, actor, rx) = single_actor_dispatcher();
				for message in &payload {
					dispatcher.dispatch_send(&actor, black_box(*message)).unwrap();
				}
				for _ in 0..size {
					rx.recv().unwrap();
				}
				dispatcher.shutdown();
			});
		});
	}
	group.finish();
}

fn bench_donation_pair_throughput(c: &mut Criterion) {
	let mut group = c.benchmark_group("dispatch_donation_pair");
	for size in [16usize, 256, 2048] {
		group.throughput(Throughput::Elements(size as u64));
		group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
			let payload = shuffled_payload(size);
			b.iter(|| {
				let dispatcher = WorkStealingDispatcher::new(DispatcherConfig::new("bench-pair", 4, 8)).unwrap();
				dispatcher.start();
				let (tx, rx) = mpsc::channel();
				let a = ActorCell::new(Counter(tx.clone()), TerminateSignal::default());
				let b = ActorCell::new(Counter(tx), TerminateSignal::default());
				dispatcher.register(a.clone()).unwrap();
				dispatcher.register(b).unwrap();

				for message in &payload {
					dispatcher.dispatch_send(&a, black_box(*message)).unwrap();
				}
				for _ in 0..size {
					rx.recv().unwrap();
				}
				dispatcher.shutdown();
			});
		});
	}
	group.finish();
}

criterion_group!(benches, bench_single_actor_throughput, bench_donation_pair_throughput);
criterion_main!(benches);
