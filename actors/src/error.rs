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

//! Error kinds surfaced by the dispatcher and router.
//!
//! Split into two enums, mirroring the policy in `common::ServiceError`:
//! programmer errors are reported to the caller (`DispatchError`), while
//! router-level faults are either absorbed (delegate removal) or forwarded
//! to a reply slot (`RouterError`), never panicking the router itself.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone)]
pub enum DispatchError {
	#[error("dispatcher not started")]
	DispatcherNotStarted,

	#[error("executor already built")]
	ExecutorAlreadyBuilt,

	#[error("actor {uuid} has concrete type incompatible with pool member type")]
	HeterogeneousPoolMember { uuid: Uuid },

	#[error("message was not delivered to {uuid}")]
	MessageNotDelivered { uuid: Uuid },

	#[error("router has no delegates to select from")]
	NoDelegatesAvailable,

	#[error("reply was dropped without completion")]
	ReplyDropped,

	#[error("ask timed out")]
	Timeout,
}

#[derive(Debug, Error)]
pub enum RouterError {
	#[error("delegate {uuid} exceeded its restart budget and was removed")]
	DelegateTerminal { uuid: Uuid },

	#[error("delegate invocation failed: {0}")]
	DelegateInvocationError(#[source] DispatchError),

	#[error("receive function raised with no reply slot: {0}")]
	UserMessageException(anyhow::Error),
}
