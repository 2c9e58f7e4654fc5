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

//! The unit of delivery: a message, an optional reply slot, and an optional
//! sender identity. Grounded in `messagebus.rs`'s envelope-plus-oneshot
//! pairing, collapsed to a single `Message`/`Reply` type pair per actor.

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::DispatchError;

/// A single-assignment reply cell. Exactly one of [`Envelope::complete_with_value`]
/// or [`Envelope::complete_with_error`] should be called when a reply slot is
/// present; dropping it uncompleted resolves the asker's future with
/// [`DispatchError::ReplyDropped`] via the underlying `oneshot` channel closing.
pub type ReplySlot<R> = oneshot::Sender<Result<R, DispatchError>>;

pub struct Envelope<M, R> {
	pub message: M,
	pub sender: Option<Uuid>,
	reply_slot: Option<ReplySlot<R>>,
}

impl<M, R> Envelope<M, R> {
	/// Builds a fire-and-forget envelope with no reply slot.
	pub fn new(message: M) -> Self {
		Self { message, sender: None, reply_slot: None }
	}

	/// Builds an envelope with a reply slot, returning the receiver half
	/// the asker awaits on.
	pub fn with_reply(message: M) -> (Self, oneshot::Receiver<Result<R, DispatchError>>) {
		let (tx, rx) = oneshot::channel();
		(Self { message, sender: None, reply_slot: Some(tx) }, rx)
	}

	pub fn with_sender(mut self, sender: Uuid) -> Self {
		self.sender = Some(sender);
		self
	}

	pub fn has_reply_slot(&self) -> bool {
		self.reply_slot.is_some()
	}

	/// Takes the reply slot out, leaving this envelope without one. Used by
	/// handlers (the router, in particular) that forward the reply
	/// asynchronously instead of completing it inline.
	pub fn take_reply_slot(&mut self) -> Option<ReplySlot<R>> {
		self.reply_slot.take()
	}

	pub fn complete_with_value(mut self, value: R) {
		if let Some(slot) = self.reply_slot.take() {
			let _ = slot.send(Ok(value));
		}
	}

	pub fn complete_with_error(mut self, err: DispatchError) {
		if let Some(slot) = self.reply_slot.take() {
			let _ = slot.send(Err(err));
		}
	}
}
