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

//! Thin wrappers around `prometheus` primitives, trimmed to the pieces the
//! dispatcher and router actually register: plain counters and gauges. The
//! label-vector and text-exposition helpers from the teacher crate are
//! dropped along with it, since this workspace has no HTTP `/metrics`
//! endpoint to serve them from (out of scope, see Non-goals).

pub use prometheus::{IntCounter, IntGauge};
use prometheus::{IntCounter as PrometheusIntCounter, IntGauge as PrometheusIntGauge, Opts};

pub fn new_counter(name: &str, description: &str, namespace: &str) -> IntCounter {
	let opts = Opts::new(name, description).namespace(namespace);
	let counter = PrometheusIntCounter::with_opts(opts).expect("failed to create counter");
	let _ = prometheus::register(Box::new(counter.clone()));
	counter
}

pub fn new_gauge(name: &str, description: &str, namespace: &str) -> IntGauge {
	let opts = Opts::new(name, description).namespace(namespace);
	let gauge = PrometheusIntGauge::with_opts(opts).expect("failed to create gauge");
	let _ = prometheus::register(Box::new(gauge.clone()));
	gauge
}

/// Increments a gauge on construction, decrements it on drop.
pub struct GaugeGuard<'a>(&'a IntGauge);

impl<'a> GaugeGuard<'a> {
	pub fn from_gauge(gauge: &'a IntGauge) -> Self {
		gauge.inc();
		Self(gauge)
	}
}

impl Drop for GaugeGuard<'_> {
	fn drop(&mut self) {
		self.0.dec();
	}
}
