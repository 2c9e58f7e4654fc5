// Copyright (C) 2023 QuerentAI LLC.
// This file is part of Querent.

// The Licensed Work is licensed under the Business Source License 1.1 (BSL 1.1).
// You may use this file in compliance with the BSL 1.1, subject to the following restrictions:
// 1. You may not use the Licensed Work for AI-related services, database services,
//    or any service or product offering that provides database, big data, or analytics
//    services to third parties unless explicitly authorized by QuerentAI LLC.
// 2. For more details, see the LICENSE file or visit https://mariadb.com/bsl11/.

// For inquiries about alternative licensing arrangements, please contact contact@querent.xyz.

// The Licensed Work is provided "AS IS", WITHOUT WARRANTY OF ANY KIND, express or implied,
// including but not limited to the warranties of merchantability, fitness for a particular purpose,
// and non-infringement. See the Business Source License for more details.

// This software includes code developed by QuerentAI LLC (https://querent.xyz).

//! The work-stealing message dispatcher: a worker pool plus a registry of
//! homogeneous pool members, enforcing per-actor mutual exclusion via
//! try-lock and redistributing work from busy owners to idle peers.
//!
//! The executor shape is lifted directly from `common::runtimes`'
//! `start_runtimes`: a dedicated `tokio::runtime::Runtime` sized with
//! `worker_threads`/`max_blocking_threads`/`thread_keep_alive`. Every
//! `dispatch` schedules exactly one `spawn_blocking` closure, since the
//! user receive function is synchronous and may block arbitrarily.

use std::{
	panic::AssertUnwindSafe,
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, warn};
use uuid::Uuid;

use common::{new_quid, ServiceError, ServiceErrorCode};

use crate::{
	actor::{Actor, ActorRef},
	envelope::Envelope,
	error::DispatchError,
	members::Members,
	reply_future::ReplyFuture,
};

impl ServiceError for DispatchError {
	fn error_code(&self) -> ServiceErrorCode {
		match self {
			DispatchError::DispatcherNotStarted => ServiceErrorCode::Unavailable,
			DispatchError::ExecutorAlreadyBuilt => ServiceErrorCode::AlreadyExists,
			DispatchError::HeterogeneousPoolMember { .. } => ServiceErrorCode::BadRequest,
			DispatchError::MessageNotDelivered { .. } => ServiceErrorCode::Internal,
			DispatchError::NoDelegatesAvailable => ServiceErrorCode::Unavailable,
			DispatchError::ReplyDropped => ServiceErrorCode::Internal,
			DispatchError::Timeout => ServiceErrorCode::Timeout,
		}
	}
}

#[derive(Clone)]
pub struct DispatcherConfig {
	pub name: String,
	/// Core worker thread count (`worker_threads`).
	pub core_size: usize,
	/// Elastic ceiling for the blocking pool (`max_blocking_threads`), where
	/// receive functions actually run.
	pub max_size: usize,
	pub keep_alive: Duration,
}

impl DispatcherConfig {
	pub fn new(name: impl Into<String>, core_size: usize, max_size: usize) -> Self {
		Self { name: name.into(), core_size, max_size, keep_alive: Duration::from_secs(60) }
	}

	pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
		self.keep_alive = keep_alive;
		self
	}
}

pub struct WorkStealingDispatcher<M: Send + 'static, R: Send + 'static> {
	config: DispatcherConfig,
	active: AtomicBool,
	members: Members<M, R>,
	last_thief_index: AtomicUsize,
	runtime: Mutex<Option<Runtime>>,
	queued_tasks: common::metrics::IntCounter,
	active_drains: common::metrics::IntGauge,
}

impl<M: Send + 'static, R: Send + 'static> WorkStealingDispatcher<M, R> {
	/// `init`: builds the executor up front. `start` only flips `active`,
	/// so a dispatcher can be fully constructed and registered against
	/// before it begins draining.
	pub fn new(config: DispatcherConfig) -> Result<Arc<Self>, DispatchError> {
		let thread_prefix = config.name.clone();
		let runtime = Builder::new_multi_thread()
			.worker_threads(config.core_size.max(1))
			.max_blocking_threads(config.max_size.max(1))
			.thread_keep_alive(config.keep_alive)
			.thread_name_fn(move || new_quid(&thread_prefix))
			.enable_all()
			.build()
			.map_err(|_| DispatchError::ExecutorAlreadyBuilt)?;

		let namespace = config.name.clone();
		Ok(Arc::new(Self {
			config,
			active: AtomicBool::new(false),
			members: Members::default(),
			last_thief_index: AtomicUsize::new(0),
			runtime: Mutex::new(Some(runtime)),
			queued_tasks: common::metrics::new_counter(
				"dispatcher_queued_tasks_total",
				"tasks scheduled onto the dispatcher executor",
				&namespace,
			),
			active_drains: common::metrics::new_gauge(
				"dispatcher_active_drains",
				"drain tasks currently running",
				&namespace,
			),
		}))
	}

	pub fn name(&self) -> &str {
		&self.config.name
	}

	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::SeqCst)
	}

	pub fn start(&self) {
		self.active.store(true, Ordering::SeqCst);
		debug!(dispatcher = %self.config.name, "dispatcher-started");
	}

	pub fn register(&self, actor: ActorRef<M, R>) -> Result<(), DispatchError> {
		self.members.register(actor)
	}

	pub fn unregister(&self, uuid: Uuid) {
		self.members.unregister(uuid);
	}

	pub fn member_count(&self) -> usize {
		self.members.len()
	}

	pub fn dispatch_send(self: &Arc<Self>, receiver: &ActorRef<M, R>, message: M) -> Result<(), DispatchError> {
		self.dispatch(receiver, Envelope::new(message))
	}

	pub fn dispatch_ask(
		self: &Arc<Self>,
		receiver: &ActorRef<M, R>,
		message: M,
	) -> Result<ReplyFuture<R>, DispatchError> {
		let (envelope, rx) = Envelope::with_reply(message);
		self.dispatch(receiver, envelope)?;
		receiver.ask_started();
		let receiver = Arc::clone(receiver);
		Ok(ReplyFuture::with_on_drop(rx, move || receiver.ask_finished()))
	}

	fn dispatch(self: &Arc<Self>, receiver: &ActorRef<M, R>, envelope: Envelope<M, R>) -> Result<(), DispatchError> {
		if !self.is_active() {
			return Err(DispatchError::DispatcherNotStarted);
		}
		receiver.mailbox().push_back(envelope);
		self.queued_tasks.inc();

		let handle = {
			let guard = self.runtime.lock().unwrap();
			let runtime = guard.as_ref().ok_or(DispatchError::DispatcherNotStarted)?;
			runtime.handle().clone()
		};
		let dispatcher = Arc::clone(self);
		let receiver = Arc::clone(receiver);
		handle.spawn_blocking(move || dispatcher.run_dispatch_task(&receiver));
		Ok(())
	}

	fn run_dispatch_task(&self, receiver: &ActorRef<M, R>) {
		let _active = common::metrics::GaugeGuard::from_gauge(&self.active_drains);
		if !self.try_process_mailbox(receiver) {
			if let Some(thief) = self.find_thief(receiver) {
				self.try_donate_and_process_messages(receiver, &thief);
			}
		}
	}

	/// Returns whether this call drained at least once. A `false` result
	/// means some other worker already holds `a`'s lock.
	fn try_process_mailbox(&self, a: &ActorRef<M, R>) -> bool {
		let mut mark_drained = false;
		loop {
			match a.try_lock() {
				Some(mut guard) => {
					self.drain(a, &mut guard);
					mark_drained = true;
				}
				None => break,
			}
			if !(mark_drained && !a.mailbox().is_empty()) {
				break;
			}
		}
		mark_drained
	}

	fn drain(&self, a: &ActorRef<M, R>, guard: &mut Box<dyn Actor<Message = M, Reply = R>>) {
		while let Some(envelope) = a.mailbox().poll_head() {
			let receive_result = std::panic::catch_unwind(AssertUnwindSafe(|| guard.receive(envelope)));
			if let Err(panic) = receive_result {
				let reason = panic
					.downcast_ref::<&str>()
					.map(|s| s.to_string())
					.or_else(|| panic.downcast_ref::<String>().cloned())
					.unwrap_or_else(|| "unknown panic".to_string());
				error!(actor = %a.uuid(), reason, "receive-function-panicked");
			}
		}
	}

	/// Snapshots `members`, scans starting at `lastThiefIndex mod
	/// max(1, len)` (the off-by-one fix from the Open Questions), and
	/// returns the first idle peer other than `receiver`.
	fn find_thief(&self, receiver: &ActorRef<M, R>) -> Option<ActorRef<M, R>> {
		let snapshot = self.members.snapshot();
		let len = snapshot.len();
		if len == 0 {
			return None;
		}
		let start = self.last_thief_index.load(Ordering::Relaxed) % len.max(1);
		for offset in 0..len {
			let idx = (start + offset) % len;
			let candidate = &snapshot[idx];
			if candidate.uuid() != receiver.uuid() && candidate.mailbox().is_empty() {
				self.last_thief_index.store((idx + 1) % len, Ordering::Relaxed);
				return Some(Arc::clone(candidate));
			}
		}
		None
	}

	/// Tail-donates `receiver`'s queued envelopes to `thief`, dropping any
	/// reply slot attached (documented resolution, not a latent bug: `ask`
	/// traffic should target a single recipient directly rather than flow
	/// through donation).
	fn try_donate_and_process_messages(&self, receiver: &ActorRef<M, R>, thief: &ActorRef<M, R>) {
		let mut thief_guard = match thief.try_lock() {
			Some(guard) => guard,
			None => return,
		};
		loop {
			let envelope = match receiver.mailbox().poll_tail() {
				Some(envelope) => envelope,
				None => break,
			};
			if envelope.has_reply_slot() {
				warn!(
					from = %receiver.uuid(),
					to = %thief.uuid(),
					"donated-message-reply-slot-dropped"
				);
			}
			thief.mailbox().push_back(Envelope::new(envelope.message));
			self.drain(thief, &mut thief_guard);
		}
	}

	/// Runs a detached async task on this dispatcher's runtime. Used for
	/// reply-forwarding: awaiting a delegate's reply future is cooperative,
	/// not blocking, so it runs on the default scheduler via `spawn`
	/// rather than `spawn_blocking`.
	pub fn spawn_detached<F>(&self, future: F)
	where
		F: std::future::Future<Output = ()> + Send + 'static,
	{
		let guard = self.runtime.lock().unwrap();
		if let Some(runtime) = guard.as_ref() {
			runtime.handle().spawn(future);
		}
	}

	/// Stops the executor, discarding queued-but-not-started blocking
	/// closures; in-flight ones run to completion since OS threads cannot
	/// be force-killed. Clears all member references.
	pub fn shutdown(&self) {
		self.active.store(false, Ordering::SeqCst);
		if let Some(runtime) = self.runtime.lock().unwrap().take() {
			runtime.shutdown_background();
		}
		self.members.clear();
		debug!(dispatcher = %self.config.name, "dispatcher-shutdown");
	}
}

#[cfg(test)]
mod tests {
	use std::{thread::sleep, time::Duration as StdDuration};

	use super::*;
	use crate::actor::ActorCell;
	use common::TerminateSignal;

	struct Recorder(std::sync::mpsc::Sender<u32>);
	impl Actor for Recorder {
		type Message = u32;
		type Reply = ();
		fn receive(&mut self, envelope: Envelope<u32, ()>) {
			let _ = self.0.send(envelope.message);
		}
	}

	#[test]
	fn test_dispatch_before_start_errors() {
		let dispatcher = WorkStealingDispatcher::<u32, ()>::new(DispatcherConfig::new("t", 1, 1)).unwrap();
		let (tx, _rx) = std::sync::mpsc::channel();
		let actor = ActorCell::new(Recorder(tx), TerminateSignal::default());
		dispatcher.register(actor.clone()).unwrap();
		let err = dispatcher.dispatch_send(&actor, 1).unwrap_err();
		assert!(matches!(err, DispatchError::DispatcherNotStarted));
	}

	#[test]
	fn test_dispatch_drains_serially() {
		let dispatcher = WorkStealingDispatcher::<u32, ()>::new(DispatcherConfig::new("t", 2, 2)).unwrap();
		dispatcher.start();
		let (tx, rx) = std::sync::mpsc::channel();
		let actor = ActorCell::new(Recorder(tx), TerminateSignal::default());
		dispatcher.register(actor.clone()).unwrap();
		for i in 0..5 {
			dispatcher.dispatch_send(&actor, i).unwrap();
		}
		let mut received = Vec::new();
		for _ in 0..5 {
			received.push(rx.recv_timeout(StdDuration::from_secs(1)).unwrap());
		}
		assert_eq!(received, vec![0, 1, 2, 3, 4]);
		dispatcher.shutdown();
	}

	#[test]
	fn test_shutdown_clears_members() {
		let dispatcher = WorkStealingDispatcher::<u32, ()>::new(DispatcherConfig::new("t", 1, 1)).unwrap();
		dispatcher.start();
		let (tx, _rx) = std::sync::mpsc::channel();
		let actor = ActorCell::new(Recorder(tx), TerminateSignal::default());
		dispatcher.register(actor).unwrap();
		assert_eq!(dispatcher.member_count(), 1);
		dispatcher.shutdown();
		assert_eq!(dispatcher.member_count(), 0);
		assert!(!dispatcher.is_active());
	}

	#[test]
	fn test_dispatch_ask_tracks_pending_reply_through_real_path() {
		// Holds the reply slot open until told to complete, so the test can
		// observe `has_pending_reply()` while the ask is genuinely in flight
		// through `dispatch_ask`, not just via direct `ask_started`/
		// `ask_finished` calls.
		struct HoldReply(std::sync::mpsc::Receiver<()>);
		impl Actor for HoldReply {
			type Message = u32;
			type Reply = u32;
			fn receive(&mut self, envelope: Envelope<u32, u32>) {
				let _ = self.0.recv_timeout(StdDuration::from_secs(2));
				envelope.complete_with_value(0);
			}
		}

		let dispatcher = WorkStealingDispatcher::<u32, u32>::new(DispatcherConfig::new("t", 1, 1)).unwrap();
		dispatcher.start();
		let (release_tx, release_rx) = std::sync::mpsc::channel();
		let actor = ActorCell::new(HoldReply(release_rx), TerminateSignal::default());
		dispatcher.register(actor.clone()).unwrap();

		assert!(!actor.has_pending_reply());
		let reply = dispatcher.dispatch_ask(&actor, 1).unwrap();
		// `receive` is blocked on `release_rx`, so the ask is still pending.
		sleep(StdDuration::from_millis(50));
		assert!(actor.has_pending_reply());

		release_tx.send(()).unwrap();
		tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
			reply.await_reply().await.unwrap();
		});
		assert!(!actor.has_pending_reply());
		dispatcher.shutdown();
	}

	#[test]
	fn test_dropping_reply_future_without_awaiting_still_clears_pending_reply() {
		let dispatcher = WorkStealingDispatcher::<u32, ()>::new(DispatcherConfig::new("t", 1, 1)).unwrap();
		dispatcher.start();
		let actor = ActorCell::new(Recorder(std::sync::mpsc::channel().0), TerminateSignal::default());
		dispatcher.register(actor.clone()).unwrap();

		let reply = dispatcher.dispatch_ask(&actor, 1).unwrap();
		drop(reply);
		sleep(StdDuration::from_millis(50));
		assert!(!actor.has_pending_reply());
		dispatcher.shutdown();
	}

	#[test]
	fn test_donation_under_contention() {
		struct Slow(std::sync::mpsc::Sender<(&'static str, u32)>, &'static str);
		impl Actor for Slow {
			type Message = u32;
			type Reply = ();
			fn receive(&mut self, envelope: Envelope<u32, ()>) {
				sleep(StdDuration::from_millis(50));
				let _ = self.0.send((self.1, envelope.message));
			}
		}

		let dispatcher = WorkStealingDispatcher::<u32, ()>::new(DispatcherConfig::new("t", 4, 4)).unwrap();
		dispatcher.start();
		let (tx, rx) = std::sync::mpsc::channel();
		let a = ActorCell::new(Slow(tx.clone(), "a"), TerminateSignal::default());
		let b = ActorCell::new(Slow(tx, "b"), TerminateSignal::default());
		dispatcher.register(a.clone()).unwrap();
		dispatcher.register(b.clone()).unwrap();

		for i in 0..10 {
			dispatcher.dispatch_send(&a, i).unwrap();
		}

		let mut by_actor = std::collections::HashMap::new();
		for _ in 0..10 {
			let (who, _) = rx.recv_timeout(StdDuration::from_secs(2)).unwrap();
			*by_actor.entry(who).or_insert(0) += 1;
		}
		assert_eq!(by_actor.values().sum::<i32>(), 10);
		assert!(*by_actor.get("b").unwrap_or(&0) >= 1, "expected donation to occur: {by_actor:?}");
		dispatcher.shutdown();
	}
}
