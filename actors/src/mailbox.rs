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

//! Per-actor FIFO queue with head-poll (ordinary consumption) and tail-poll
//! (donation only). A plain `Mutex<VecDeque<_>>` is enough here: the read
//! path (`find_thief`) snapshots `members` outside of any mailbox lock, so
//! this lock is only ever held for the duration of a single push/pop, per
//! the "mutex-guarded vector is acceptable only if..." note in the spec's
//! design notes.

use std::{collections::VecDeque, sync::Mutex};

use crate::envelope::Envelope;

pub struct Mailbox<M, R> {
	queue: Mutex<VecDeque<Envelope<M, R>>>,
}

impl<M, R> Default for Mailbox<M, R> {
	fn default() -> Self {
		Self { queue: Mutex::new(VecDeque::new()) }
	}
}

impl<M, R> Mailbox<M, R> {
	pub fn len(&self) -> usize {
		self.queue.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn push_back(&self, envelope: Envelope<M, R>) {
		self.queue.lock().unwrap().push_back(envelope);
	}

	/// Ordinary single-consumer poll: the head of the queue.
	pub fn poll_head(&self) -> Option<Envelope<M, R>> {
		self.queue.lock().unwrap().pop_front()
	}

	/// Donation-only poll: the tail of the queue, so a donating owner moves
	/// its most-recently-arrived work, minimizing reordering visible to
	/// whichever consumer is already mid-drain on the head.
	pub fn poll_tail(&self) -> Option<Envelope<M, R>> {
		self.queue.lock().unwrap().pop_back()
	}
}

#[cfg(test)]
mod tests {
	use super::Mailbox;
	use crate::envelope::Envelope;

	#[test]
	fn test_head_and_tail_poll() {
		let mailbox: Mailbox<u32, ()> = Mailbox::default();
		mailbox.push_back(Envelope::new(1));
		mailbox.push_back(Envelope::new(2));
		mailbox.push_back(Envelope::new(3));

		assert_eq!(mailbox.poll_head().unwrap().message, 1);
		assert_eq!(mailbox.poll_tail().unwrap().message, 3);
		assert_eq!(mailbox.poll_head().unwrap().message, 2);
		assert!(mailbox.poll_head().is_none());
		assert!(mailbox.poll_tail().is_none());
	}

	#[test]
	fn test_len_and_is_empty() {
		let mailbox: Mailbox<u32, ()> = Mailbox::default();
		assert!(mailbox.is_empty());
		mailbox.push_back(Envelope::new(1));
		assert_eq!(mailbox.len(), 1);
		assert!(!mailbox.is_empty());
	}
}
