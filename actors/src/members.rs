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

//! The dispatcher's pool membership: a concurrent, append-tolerant sequence
//! of `ActorRef`s with a `memberType` pinned on first registration.
//!
//! Grounded in the "shared mutable sequence of actors" design note: readers
//! (`find_thief`) must snapshot without blocking registration/
//! unregistration. `arc-swap` gives lock-free, copy-on-write reads at the
//! cost of a full-vector clone on write, which matches the teacher's own
//! choice of `arc-swap` for its concurrent snapshot needs elsewhere in the
//! workspace.

use std::any::TypeId;

use arc_swap::ArcSwap;
use once_cell::sync::OnceCell;

use crate::{actor::ActorRef, error::DispatchError};

pub struct Members<M: Send + 'static, R: Send + 'static> {
	member_type: OnceCell<TypeId>,
	members: ArcSwap<Vec<ActorRef<M, R>>>,
}

impl<M: Send + 'static, R: Send + 'static> Default for Members<M, R> {
	fn default() -> Self {
		Self { member_type: OnceCell::new(), members: ArcSwap::from_pointee(Vec::new()) }
	}
}

impl<M: Send + 'static, R: Send + 'static> Members<M, R> {
	/// Registers `actor`, pinning `memberType` if this is the first
	/// registration. Rejects heterogeneous members without mutating state.
	pub fn register(&self, actor: ActorRef<M, R>) -> Result<(), DispatchError> {
		let pinned = *self.member_type.get_or_init(|| actor.concrete_type());
		if actor.concrete_type() != pinned {
			return Err(DispatchError::HeterogeneousPoolMember { uuid: actor.uuid() });
		}
		self.members.rcu(|current| {
			let mut next = (**current).clone();
			if !next.iter().any(|existing| existing.uuid() == actor.uuid()) {
				next.push(actor.clone());
			}
			next
		});
		Ok(())
	}

	pub fn unregister(&self, uuid: uuid::Uuid) {
		self.members.rcu(|current| {
			let mut next = (**current).clone();
			next.retain(|existing| existing.uuid() != uuid);
			next
		});
	}

	/// A stable snapshot safe to iterate even while concurrent
	/// `register`/`unregister` calls proceed.
	pub fn snapshot(&self) -> arc_swap::Guard<std::sync::Arc<Vec<ActorRef<M, R>>>> {
		self.members.load()
	}

	pub fn member_type(&self) -> Option<TypeId> {
		self.member_type.get().copied()
	}

	pub fn len(&self) -> usize {
		self.members.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops all member references. Used by `shutdown`.
	pub fn clear(&self) {
		self.members.store(std::sync::Arc::new(Vec::new()));
	}
}
