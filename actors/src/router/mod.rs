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

//! `PoolRouter`: an actor that owns a dynamically sized set of delegates
//! and, per message, resizes the set (capacity strategy), picks recipients
//! (selector), and forwards the message, chaining the first recipient's
//! reply back to the original asker without blocking a thread on it.
//!
//! Composition over inheritance, per the "mixin composition → explicit
//! strategies" design note: a [`RouterConfig`] bundles the three extension
//! points as trait objects rather than mixing traits into the router type.

pub mod capacity;
pub mod filter;
pub mod pressure;
pub mod selector;

use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use common::TerminateSignal;

use self::{capacity::CapacityStrategy, selector::Selector};
use crate::{
	actor::{Actor, ActorCell, ActorRef},
	dispatcher::WorkStealingDispatcher,
	envelope::Envelope,
	error::{DispatchError, RouterError},
};

/// The message envelope the router actually receives: either its own
/// control protocol, a supervision notification, or a user message bound
/// for a delegate.
pub enum RouterMessage<M> {
	Stat,
	DelegateFailed(Uuid),
	User(M),
}

pub enum RouterReply<R> {
	Stats(usize),
	Delegate(R),
}

/// `(instance-factory, selector, capacity-strategy)`, per the design note.
/// `instance` is handed the router's own kill switch so it can build a
/// delegate already linked to it (`ActorCell::start_linked_to`) — the
/// concrete stand-in for the source's `startLinkedTo(self)` call, adapted
/// since a `TerminateSignal` is parented at construction time, not after.
pub struct RouterConfig<M: Send + 'static, R: Send + 'static> {
	pub instance: Box<dyn Fn(&TerminateSignal) -> ActorRef<M, R> + Send + Sync>,
	pub selector: Box<dyn Selector<M, R>>,
	pub capacity: Box<dyn CapacityStrategy<M, R>>,
}

pub struct PoolRouter<M: Send + Clone + 'static, R: Send + 'static> {
	config: RouterConfig<M, R>,
	delegate_dispatcher: Arc<WorkStealingDispatcher<M, R>>,
	delegates: Vec<ActorRef<M, R>>,
	terminate: TerminateSignal,
	last_capacity_delta: i64,
	last_selection_count: usize,
	delegate_removed_total: common::metrics::IntCounter,
	delegate_count_gauge: common::metrics::IntGauge,
}

impl<M: Send + Clone + 'static, R: Send + 'static> PoolRouter<M, R> {
	/// Builds a router bound to `delegate_dispatcher`; the caller registers
	/// the returned `ActorRef` onto whatever dispatcher hosts the router
	/// itself (the router is "dispatched as an ordinary actor", typically
	/// a dedicated single-member pool).
	pub fn spawn(
		namespace: &str,
		config: RouterConfig<M, R>,
		delegate_dispatcher: Arc<WorkStealingDispatcher<M, R>>,
	) -> ActorRef<RouterMessage<M>, RouterReply<R>> {
		let terminate = TerminateSignal::default();
		let router = Self {
			config,
			delegate_dispatcher,
			delegates: Vec::new(),
			terminate: terminate.clone(),
			last_capacity_delta: 0,
			last_selection_count: 0,
			delegate_removed_total: common::metrics::new_counter(
				"router_delegate_removed_total",
				"delegates removed after exceeding their restart budget",
				namespace,
			),
			delegate_count_gauge: common::metrics::new_gauge(
				"router_delegate_count",
				"delegates currently held by the router",
				namespace,
			),
		};
		ActorCell::new(router, terminate)
	}

	pub fn delegate_count(&self) -> usize {
		self.delegates.len()
	}

	pub fn last_capacity_delta(&self) -> i64 {
		self.last_capacity_delta
	}

	pub fn last_selection_count(&self) -> usize {
		self.last_selection_count
	}

	/// Grows or shrinks `self.delegates`, registering every newly spawned
	/// delegate onto `delegate_dispatcher` and unregistering every one it
	/// stops. Without this, `find_thief` (dispatcher.rs) always sees an
	/// empty member snapshot for this pool, and donation across delegates
	/// can never fire.
	fn adjust_capacity(&mut self) {
		let delta = self.config.capacity.capacity(&self.delegates);
		self.last_capacity_delta = delta;
		if delta > 0 {
			for _ in 0..delta {
				let delegate = (self.config.instance)(&self.terminate);
				if let Err(err) = self.delegate_dispatcher.register(delegate.clone()) {
					error!(error = %err, "delegate-registration-failed");
					continue;
				}
				self.delegates.push(delegate);
			}
			debug!(delta, total = self.delegates.len(), "router-capacity-increased");
		} else if delta < 0 {
			let shrink_by = (-delta) as usize;
			let keep = self.delegates.len().saturating_sub(shrink_by);
			let stopped = self.delegates.split_off(keep);
			for delegate in &stopped {
				delegate.stop();
				self.delegate_dispatcher.unregister(delegate.uuid());
			}
			debug!(delta, total = self.delegates.len(), "router-capacity-decreased");
		}
		self.delegate_count_gauge.set(self.delegates.len() as i64);
	}
}

impl<M: Send + Clone + 'static, R: Send + 'static> Actor for PoolRouter<M, R> {
	type Message = RouterMessage<M>;
	type Reply = RouterReply<R>;

	fn receive(&mut self, mut envelope: Envelope<RouterMessage<M>, RouterReply<R>>) {
		let reply_slot = envelope.take_reply_slot();
		match envelope.message {
			RouterMessage::Stat => {
				let count = self.delegates.len();
				if let Some(slot) = reply_slot {
					let _ = slot.send(Ok(RouterReply::Stats(count)));
				}
			}
			RouterMessage::DelegateFailed(uuid) => {
				self.delegates.retain(|d| d.uuid() != uuid);
				self.delegate_dispatcher.unregister(uuid);
				self.delegate_removed_total.inc();
				self.delegate_count_gauge.set(self.delegates.len() as i64);
				error!(error = %RouterError::DelegateTerminal { uuid }, "delegate-removed-on-supervision-notice");
				// Not a reply-bearing notification; dropping the slot (if any)
				// resolves any asker with ReplyDropped.
			}
			RouterMessage::User(message) => {
				self.adjust_capacity();
				let (chosen, count) = self.config.selector.select(&self.delegates);
				self.last_selection_count = count;

				match reply_slot {
					None => {
						for delegate in &chosen {
							let _ = self.delegate_dispatcher.dispatch_send(delegate, message.clone());
						}
					}
					Some(slot) => match chosen.split_first() {
						None => {
							let _ = slot.send(Err(DispatchError::NoDelegatesAvailable));
						}
						Some((first, rest)) => {
							for delegate in rest {
								let _ = self.delegate_dispatcher.dispatch_send(delegate, message.clone());
							}
							match self.delegate_dispatcher.dispatch_ask(first, message) {
								Ok(reply_future) => {
									self.delegate_dispatcher.spawn_detached(async move {
										let result = reply_future.await_reply().await.map(RouterReply::Delegate);
										let _ = slot.send(result);
									});
								}
								Err(err) => {
									error!(
										error = %RouterError::DelegateInvocationError(err.clone()),
										"delegate-ask-failed"
									);
									let _ = slot.send(Err(err));
								}
							}
						}
					},
				}
			}
		}
	}
}
