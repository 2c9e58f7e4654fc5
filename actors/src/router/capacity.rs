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

//! Policies returning the requested change in delegate count.

use crate::{actor::ActorRef, router::filter::Filter, router::pressure::Pressure};

pub trait CapacityStrategy<M: Send + 'static, R: Send + 'static>: Send {
	/// Requested delta in delegate count: positive grows, negative shrinks,
	/// zero holds.
	fn capacity(&mut self, delegates: &[ActorRef<M, R>]) -> i64;
}

/// Only grows, up to `limit`.
pub struct FixedSize {
	pub limit: usize,
}

impl FixedSize {
	pub fn new(limit: usize) -> Self {
		Self { limit }
	}
}

impl<M: Send + 'static, R: Send + 'static> CapacityStrategy<M, R> for FixedSize {
	fn capacity(&mut self, delegates: &[ActorRef<M, R>]) -> i64 {
		(self.limit as i64 - delegates.len() as i64).max(0)
	}
}

/// Clamps a pressure-driven delta so the delegate count always stays within
/// `[lower, upper]`.
pub struct Bounded<M: Send + 'static, R: Send + 'static> {
	pub lower: usize,
	pub upper: usize,
	pressure: Box<dyn Pressure<M, R>>,
	filter: Box<dyn Filter>,
}

impl<M: Send + 'static, R: Send + 'static> Bounded<M, R> {
	pub fn new(lower: usize, upper: usize, pressure: Box<dyn Pressure<M, R>>, filter: Box<dyn Filter>) -> Self {
		Self { lower, upper, pressure, filter }
	}
}

impl<M: Send + 'static, R: Send + 'static> CapacityStrategy<M, R> for Bounded<M, R> {
	fn capacity(&mut self, delegates: &[ActorRef<M, R>]) -> i64 {
		let capacity = delegates.len() as i64;
		let pressure = self.pressure.measure(delegates);
		let delta = self.filter.eval(pressure, delegates.len());
		let proposed = (capacity + delta).clamp(self.lower as i64, self.upper as i64);
		proposed - capacity
	}
}
