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

//! Policies choosing which delegates receive a given message.

use crate::actor::ActorRef;

pub trait Selector<M: Send + 'static, R: Send + 'static>: Send {
	/// Returns the chosen delegates plus the count, matching the spec's
	/// `(iterator, count)` pair even though the iterator side collapses to
	/// a plain `Vec` here.
	fn select(&mut self, delegates: &[ActorRef<M, R>]) -> (Vec<ActorRef<M, R>>, usize);
}

/// Chooses `min(k, len)` delegates (or exactly `k`, with repetition, when
/// `partial_fill` is false) ordered ascending by mailbox size. Ties break on
/// original pool order via a stable sort.
pub struct SmallestMailbox {
	pub k: usize,
	pub partial_fill: bool,
}

impl SmallestMailbox {
	pub fn new(k: usize, partial_fill: bool) -> Self {
		Self { k, partial_fill }
	}
}

impl<M: Send + 'static, R: Send + 'static> Selector<M, R> for SmallestMailbox {
	fn select(&mut self, delegates: &[ActorRef<M, R>]) -> (Vec<ActorRef<M, R>>, usize) {
		let len = delegates.len();
		if len == 0 {
			return (Vec::new(), 0);
		}
		let mut indices: Vec<usize> = (0..len).collect();
		indices.sort_by_key(|&i| delegates[i].mailbox_size());

		let count = if self.partial_fill { self.k.min(len) } else { self.k };
		let chosen: Vec<ActorRef<M, R>> = (0..count).map(|slot| delegates[indices[slot % len]].clone()).collect();
		let n = chosen.len();
		(chosen, n)
	}
}

/// Advances a persistent cursor by one per selection slot, emitting exactly
/// `k` (or `min(k, len)` under `partial_fill`) delegates. The cursor
/// survives across calls so successive selections rotate across the pool.
pub struct RoundRobin {
	pub k: usize,
	pub partial_fill: bool,
	cursor: usize,
}

impl RoundRobin {
	pub fn new(k: usize, partial_fill: bool) -> Self {
		Self { k, partial_fill, cursor: 0 }
	}
}

impl<M: Send + 'static, R: Send + 'static> Selector<M, R> for RoundRobin {
	fn select(&mut self, delegates: &[ActorRef<M, R>]) -> (Vec<ActorRef<M, R>>, usize) {
		let len = delegates.len();
		if len == 0 {
			return (Vec::new(), 0);
		}
		let count = if self.partial_fill { self.k.min(len) } else { self.k };
		let mut chosen = Vec::with_capacity(count);
		for _ in 0..count {
			chosen.push(delegates[self.cursor % len].clone());
			self.cursor = (self.cursor + 1) % len;
		}
		let n = chosen.len();
		(chosen, n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{actor::ActorCell, envelope::Envelope};
	use common::TerminateSignal;

	struct Noop;
	impl crate::actor::Actor for Noop {
		type Message = u32;
		type Reply = ();
		fn receive(&mut self, _envelope: Envelope<u32, ()>) {}
	}

	fn delegate() -> ActorRef<u32, ()> {
		ActorCell::new(Noop, TerminateSignal::default())
	}

	#[test]
	fn test_round_robin_selects_exactly_k_and_rotates() {
		let delegates = vec![delegate(), delegate(), delegate()];
		let mut selector = RoundRobin::new(1, true);
		let mut seen = Vec::new();
		for _ in 0..6 {
			let (chosen, count) = selector.select(&delegates);
			assert_eq!(count, 1);
			seen.push(chosen[0].uuid());
		}
		assert_eq!(seen[0], delegates[0].uuid());
		assert_eq!(seen[1], delegates[1].uuid());
		assert_eq!(seen[2], delegates[2].uuid());
		assert_eq!(seen[3], delegates[0].uuid());
		assert_eq!(seen[4], delegates[1].uuid());
		assert_eq!(seen[5], delegates[2].uuid());
	}

	#[test]
	fn test_round_robin_fairness_over_n_times_k() {
		let delegates = vec![delegate(), delegate(), delegate()];
		let mut selector = RoundRobin::new(1, true);
		let mut counts = std::collections::HashMap::new();
		for _ in 0..(delegates.len() * 2) {
			let (chosen, _) = selector.select(&delegates);
			*counts.entry(chosen[0].uuid()).or_insert(0) += 1;
		}
		for d in &delegates {
			assert_eq!(counts[&d.uuid()], 2);
		}
	}

	#[test]
	fn test_smallest_mailbox_avoids_loaded_delegate() {
		let loaded = delegate();
		for _ in 0..5 {
			loaded.send(0);
		}
		let idle_a = delegate();
		let idle_b = delegate();
		let delegates = vec![idle_a.clone(), loaded.clone(), idle_b.clone()];
		let mut selector = SmallestMailbox::new(1, true);
		let (chosen, count) = selector.select(&delegates);
		assert_eq!(count, 1);
		assert_ne!(chosen[0].uuid(), loaded.uuid());
	}

	#[test]
	fn test_select_on_empty_pool_returns_empty() {
		let delegates: Vec<ActorRef<u32, ()>> = Vec::new();
		let mut selector = RoundRobin::new(3, true);
		let (chosen, count) = selector.select(&delegates);
		assert!(chosen.is_empty());
		assert_eq!(count, 0);
	}
}
