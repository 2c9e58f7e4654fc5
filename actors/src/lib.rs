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

//! A work-stealing message dispatcher and an elastic actor pool router.
//!
//! [`dispatcher::WorkStealingDispatcher`] owns a worker pool and a registry
//! of homogeneous actors, enforcing one-drain-at-a-time per actor via
//! try-lock and donating tail-polled work to idle peers under contention.
//! [`router::PoolRouter`] sits on top of it as an ordinary actor: it grows
//! and shrinks a pool of delegates, selects recipients for each message,
//! and forwards replies without blocking a thread per ask.
#![deny(clippy::disallowed_methods)]

pub mod actor;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod mailbox;
pub mod members;
pub mod reply_future;
pub mod router;

pub use actor::{Actor, ActorCell, ActorRef};
pub use dispatcher::{DispatcherConfig, WorkStealingDispatcher};
pub use envelope::Envelope;
pub use error::{DispatchError, RouterError};
pub use reply_future::ReplyFuture;
pub use router::{PoolRouter, RouterConfig, RouterMessage, RouterReply};
