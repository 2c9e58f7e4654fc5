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

//! Shared utilities: errors, metrics and termination signals.
//!
//! This crate is the ambient stack the `actors` crate leans on, trimmed
//! from a much larger internal `common` crate down to the pieces a
//! standalone dispatcher/router library actually needs.

pub mod error;
pub mod metrics;
pub mod quid;
pub mod terminate_sig;

pub use error::{ServiceError, ServiceErrorCode};
pub use quid::new_quid;
pub use terminate_sig::TerminateSignal;
