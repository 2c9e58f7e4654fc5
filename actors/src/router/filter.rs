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

//! Functions mapping a `(pressure, capacity)` reading to a capacity delta.

pub trait Filter: Send + Sync {
	fn eval(&mut self, pressure: usize, capacity: usize) -> i64;

	fn reset(&mut self) {}
}

/// Grows by `ceil(rate * capacity)` once pressure reaches capacity.
pub struct BasicRampup {
	pub rate: f64,
}

impl BasicRampup {
	pub fn new(rate: f64) -> Self {
		Self { rate }
	}
}

impl Filter for BasicRampup {
	fn eval(&mut self, pressure: usize, capacity: usize) -> i64 {
		if pressure >= capacity {
			(self.rate * capacity as f64).ceil() as i64
		} else {
			0
		}
	}
}

/// Shrinks by `ceil(-rate * capacity)` once the pressure ratio drops below
/// `threshold`.
pub struct BasicBackoff {
	pub threshold: f64,
	pub rate: f64,
}

impl BasicBackoff {
	pub fn new(threshold: f64, rate: f64) -> Self {
		Self { threshold, rate }
	}
}

impl Filter for BasicBackoff {
	fn eval(&mut self, pressure: usize, capacity: usize) -> i64 {
		if capacity > 0 && (pressure as f64 / capacity as f64) < self.threshold {
			(-self.rate * capacity as f64).ceil() as i64
		} else {
			0
		}
	}
}

/// Sum of a rampup and a backoff component. Both are always evaluated, even
/// though at most one is normally nonzero, so their internal counters (if
/// any) stay consistent call over call.
pub struct BasicFilter {
	rampup: BasicRampup,
	backoff: BasicBackoff,
}

impl BasicFilter {
	pub fn new(rampup_rate: f64, backoff_threshold: f64, backoff_rate: f64) -> Self {
		Self { rampup: BasicRampup::new(rampup_rate), backoff: BasicBackoff::new(backoff_threshold, backoff_rate) }
	}
}

impl Filter for BasicFilter {
	fn eval(&mut self, pressure: usize, capacity: usize) -> i64 {
		let rampup = self.rampup.eval(pressure, capacity);
		let backoff = self.backoff.eval(pressure, capacity);
		rampup + backoff
	}
}

/// A backoff that only fires when both the instantaneous pressure ratio
/// and the running mean ratio (across every `eval` call since the last
/// `reset`) are below `threshold`. The cut is proportionally larger than
/// `BasicBackoff`'s: `floor(rate * (capacity - pressure))`.
pub struct RunningMeanBackoff {
	pub threshold: f64,
	pub rate: f64,
	sum_pressure: f64,
	sum_capacity: f64,
}

impl RunningMeanBackoff {
	pub fn new(threshold: f64, rate: f64) -> Self {
		Self { threshold, rate, sum_pressure: 0.0, sum_capacity: 0.0 }
	}
}

impl Filter for RunningMeanBackoff {
	fn eval(&mut self, pressure: usize, capacity: usize) -> i64 {
		let pressure = pressure as f64;
		let capacity = capacity as f64;
		self.sum_pressure += pressure;
		self.sum_capacity += capacity;

		if capacity <= 0.0 {
			return 0;
		}
		let instantaneous = pressure / capacity;
		let running_mean = if self.sum_capacity > 0.0 { self.sum_pressure / self.sum_capacity } else { 0.0 };
		if instantaneous < self.threshold && running_mean < self.threshold {
			-((self.rate * (capacity - pressure)).floor() as i64)
		} else {
			0
		}
	}

	fn reset(&mut self) {
		self.sum_pressure = 0.0;
		self.sum_capacity = 0.0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rampup_fires_at_or_above_capacity() {
		let mut rampup = BasicRampup::new(0.5);
		assert_eq!(rampup.eval(10, 10), 5);
		assert_eq!(rampup.eval(5, 10), 0);
	}

	#[test]
	fn test_backoff_fires_below_threshold() {
		let mut backoff = BasicBackoff::new(0.3, 0.25);
		assert_eq!(backoff.eval(1, 10), -3);
		assert_eq!(backoff.eval(5, 10), 0);
	}

	#[test]
	fn test_basic_filter_is_sum_and_mutually_exclusive() {
		let mut filter = BasicFilter::new(0.5, 0.3, 0.25);
		assert_eq!(filter.eval(10, 10), 5);
		assert_eq!(filter.eval(1, 10), -3);
		assert_eq!(filter.eval(5, 10), 0);
	}

	#[test]
	fn test_running_mean_backoff_requires_both_ratios_low() {
		let mut filter = RunningMeanBackoff::new(0.5, 0.5);
		// First call: instantaneous 9/10 = 0.9, not below threshold.
		assert_eq!(filter.eval(9, 10), 0);
		// Running mean so far: (9+1)/(10+10) = 0.5, not strictly below 0.5.
		assert_eq!(filter.eval(1, 10), 0);
		// Running mean now: (9+1+1)/(30) = 0.366, instantaneous 1/10=0.1: both below.
		let delta = filter.eval(1, 10);
		assert!(delta < 0);
	}

	#[test]
	fn test_reset_clears_both_accumulators() {
		let mut filter = RunningMeanBackoff::new(0.5, 0.5);
		filter.eval(9, 10);
		filter.reset();
		// After reset, running mean is based only on the next call, matching
		// a fresh instance's behavior.
		let after_reset = filter.eval(9, 10);
		let mut fresh = RunningMeanBackoff::new(0.5, 0.5);
		let fresh_value = fresh.eval(9, 10);
		assert_eq!(after_reset, fresh_value);
	}
}
