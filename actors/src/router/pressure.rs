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

//! Scalar load measures a capacity strategy folds into a resize decision.

use crate::actor::ActorRef;

pub trait Pressure<M: Send + 'static, R: Send + 'static>: Send + Sync {
	/// A scalar reading of load over the current delegate set.
	fn measure(&self, delegates: &[ActorRef<M, R>]) -> usize;
}

/// Count of delegates whose mailbox exceeds `threshold`.
pub struct MailboxPressure {
	pub threshold: usize,
}

impl MailboxPressure {
	pub fn new(threshold: usize) -> Self {
		Self { threshold }
	}
}

impl<M: Send + 'static, R: Send + 'static> Pressure<M, R> for MailboxPressure {
	fn measure(&self, delegates: &[ActorRef<M, R>]) -> usize {
		delegates.iter().filter(|d| d.mailbox_size() > self.threshold).count()
	}
}

/// Count of delegates currently holding an un-resolved reply slot.
pub struct ActiveFuturesPressure;

impl<M: Send + 'static, R: Send + 'static> Pressure<M, R> for ActiveFuturesPressure {
	fn measure(&self, delegates: &[ActorRef<M, R>]) -> usize {
		delegates.iter().filter(|d| d.has_pending_reply()).count()
	}
}
