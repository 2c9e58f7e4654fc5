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

//! The future an asker awaits. Wraps a `tokio::sync::oneshot::Receiver`;
//! a dropped reply slot surfaces as `DispatchError::ReplyDropped` rather
//! than a raw channel-closed error, matching `AskError`'s shape in the
//! teacher's `lib.rs`.

use tokio::sync::oneshot;

use crate::error::DispatchError;

/// Fires a callback exactly once when dropped, whether or not the future it
/// rides along with was ever awaited. Backs the asking actor's
/// outstanding-ask count (`ActorCell::ask_finished`): an asker that abandons
/// a `ReplyFuture` mid-flight must not leave that count stuck above zero.
struct AskGuard(Option<Box<dyn FnOnce() + Send>>);

impl Drop for AskGuard {
	fn drop(&mut self) {
		if let Some(on_drop) = self.0.take() {
			on_drop();
		}
	}
}

pub struct ReplyFuture<R> {
	rx: oneshot::Receiver<Result<R, DispatchError>>,
	_guard: Option<AskGuard>,
}

impl<R> ReplyFuture<R> {
	pub(crate) fn new(rx: oneshot::Receiver<Result<R, DispatchError>>) -> Self {
		Self { rx, _guard: None }
	}

	/// Same as `new`, but runs `on_drop` once this future (awaited or not)
	/// is dropped.
	pub(crate) fn with_on_drop(
		rx: oneshot::Receiver<Result<R, DispatchError>>,
		on_drop: impl FnOnce() + Send + 'static,
	) -> Self {
		Self { rx, _guard: Some(AskGuard(Some(Box::new(on_drop)))) }
	}

	pub async fn await_reply(self) -> Result<R, DispatchError> {
		self.rx.await.unwrap_or(Err(DispatchError::ReplyDropped))
	}

	/// Per §5's "no cancellation primitive" clause: timing out never
	/// cancels the in-flight drain that would eventually complete the slot.
	pub async fn await_timeout(self, timeout: std::time::Duration) -> Option<Result<R, DispatchError>> {
		tokio::time::timeout(timeout, self.rx)
			.await
			.ok()
			.map(|res| res.unwrap_or(Err(DispatchError::ReplyDropped)))
	}
}
