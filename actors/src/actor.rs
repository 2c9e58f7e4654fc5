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

//! The `Actor` trait and its concrete cell.
//!
//! The distilled specification treats the actor abstraction as an external
//! collaborator and only lists the capabilities an `ActorRef` must expose.
//! This crate is a standalone library with no host framework to borrow a
//! mailbox or identity from, so `Actor` is supplied here: a minimal,
//! object-safe trait with one `Message`/`Reply` pair, mirroring the shape of
//! the teacher's `Handler<M>` trait but collapsed to a single pair since the
//! router forwards one logical message enum to all of its delegates.
//!
//! `receive` takes the whole [`Envelope`], not just the message, so a
//! handler (the router, chiefly) can take the reply slot out and complete it
//! later from a detached task instead of synchronously returning a value.

use std::{
	any::TypeId,
	sync::{atomic::{AtomicUsize, Ordering}, Arc, Mutex},
};

use uuid::Uuid;

use crate::{envelope::Envelope, error::DispatchError, mailbox::Mailbox};
use common::TerminateSignal;

pub trait Actor: Send + 'static {
	type Message: Send + 'static;
	type Reply: Send + 'static;

	/// Handles one envelope. Implementations own the reply slot: call
	/// [`Envelope::complete_with_value`]/[`Envelope::complete_with_error`]
	/// before returning, or take the slot out via
	/// [`Envelope::take_reply_slot`] to complete it asynchronously.
	fn receive(&mut self, envelope: Envelope<Self::Message, Self::Reply>);
}

/// The concrete `ActorRef`. `Arc<ActorCell<M, R>>` is the handle passed
/// around; cloning it is cheap and shares the same mailbox, lock and
/// identity.
pub struct ActorCell<M: Send + 'static, R: Send + 'static> {
	uuid: Uuid,
	concrete_type: TypeId,
	mailbox: Mailbox<M, R>,
	actor: Mutex<Box<dyn Actor<Message = M, Reply = R>>>,
	active_asks: AtomicUsize,
	terminate: TerminateSignal,
}

pub type ActorRef<M, R> = Arc<ActorCell<M, R>>;

impl<M: Send + 'static, R: Send + 'static> ActorCell<M, R> {
	pub fn new<A>(actor: A, terminate: TerminateSignal) -> ActorRef<M, R>
	where
		A: Actor<Message = M, Reply = R>,
	{
		Arc::new(Self {
			uuid: Uuid::new_v4(),
			concrete_type: TypeId::of::<A>(),
			mailbox: Mailbox::default(),
			actor: Mutex::new(Box::new(actor)),
			active_asks: AtomicUsize::new(0),
			terminate,
		})
	}

	/// Spawns a child actor whose kill switch is linked to `parent`: killing
	/// `parent` kills this actor too. Grounded in `TerminateSignal::child`.
	pub fn start_linked_to<A>(actor: A, parent: &TerminateSignal) -> ActorRef<M, R>
	where
		A: Actor<Message = M, Reply = R>,
	{
		Self::new(actor, parent.child())
	}

	pub fn uuid(&self) -> Uuid {
		self.uuid
	}

	pub fn concrete_type(&self) -> TypeId {
		self.concrete_type
	}

	pub fn mailbox_size(&self) -> usize {
		self.mailbox.len()
	}

	pub fn mailbox(&self) -> &Mailbox<M, R> {
		&self.mailbox
	}

	/// Whether this actor currently has one or more outstanding `ask` calls
	/// awaiting a reply. Backs `ActiveFuturesPressure`.
	pub fn has_pending_reply(&self) -> bool {
		self.active_asks.load(Ordering::Relaxed) > 0
	}

	pub fn active_ask_count(&self) -> usize {
		self.active_asks.load(Ordering::Relaxed)
	}

	pub(crate) fn ask_started(&self) {
		self.active_asks.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn ask_finished(&self) {
		self.active_asks.fetch_sub(1, Ordering::Relaxed);
	}

	/// Enqueues at the tail with no reply slot. Raw mailbox op: does not
	/// schedule a drain. Callers that want delivery scheduled should go
	/// through `WorkStealingDispatcher::dispatch_send`.
	pub fn send(&self, message: M) {
		self.mailbox.push_back(Envelope::new(message));
	}

	/// Non-reentrant try-lock guarding "currently processing" state. The
	/// dispatcher's mutual-exclusion primitive: reusing `Mutex::try_lock`
	/// directly, rather than a separate atomic flag, gives the same
	/// semantics with one less moving part.
	pub(crate) fn try_lock(&self) -> Option<std::sync::MutexGuard<'_, Box<dyn Actor<Message = M, Reply = R>>>> {
		self.actor.try_lock().ok()
	}

	pub fn stop(&self) {
		self.terminate.kill();
	}

	pub fn is_alive(&self) -> bool {
		self.terminate.is_alive()
	}

	pub fn terminate_signal(&self) -> &TerminateSignal {
		&self.terminate
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Echo;
	impl Actor for Echo {
		type Message = u32;
		type Reply = u32;
		fn receive(&mut self, envelope: Envelope<u32, u32>) {
			let msg = envelope.message;
			envelope.complete_with_value(msg);
		}
	}

	struct OtherEcho;
	impl Actor for OtherEcho {
		type Message = u32;
		type Reply = u32;
		fn receive(&mut self, envelope: Envelope<u32, u32>) {
			envelope.complete_with_value(0);
		}
	}

	#[test]
	fn test_uuid_is_stable_and_unique() {
		let a = ActorCell::new(Echo, TerminateSignal::default());
		let b = ActorCell::new(Echo, TerminateSignal::default());
		assert_eq!(a.uuid(), a.uuid());
		assert_ne!(a.uuid(), b.uuid());
	}

	#[test]
	fn test_concrete_type_distinguishes_implementations() {
		let a: super::ActorRef<u32, u32> = ActorCell::new(Echo, TerminateSignal::default());
		let b: super::ActorRef<u32, u32> = ActorCell::new(OtherEcho, TerminateSignal::default());
		assert_ne!(a.concrete_type(), b.concrete_type());
	}

	#[test]
	fn test_send_enqueues_without_draining() {
		let a = ActorCell::new(Echo, TerminateSignal::default());
		a.send(7);
		assert_eq!(a.mailbox_size(), 1);
	}

	#[test]
	fn test_try_lock_is_non_reentrant() {
		let a = ActorCell::new(Echo, TerminateSignal::default());
		let guard = a.try_lock();
		assert!(guard.is_some());
		assert!(a.try_lock().is_none());
		drop(guard);
		assert!(a.try_lock().is_some());
	}

	#[test]
	fn test_stop_kills_terminate_signal() {
		let a = ActorCell::new(Echo, TerminateSignal::default());
		assert!(a.is_alive());
		a.stop();
		assert!(!a.is_alive());
	}
}
