//! Simulated duration

// Imports
use std::{fmt, ops};

/// Simulated duration with femto-second precision
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default, Debug)]
#[derive(serde::Serialize)]
pub struct SimDuration {
	/// Femto seconds
	femto_secs: u128,
}

impl SimDuration {
	/// Number of femto-seconds per nano-second
	pub const FEMTOS_PER_NANO: u128 = 1_000_000;
	/// Zero duration
	pub const ZERO: Self = Self { femto_secs: 0 };

	/// Creates a new duration from floating-point nanoseconds.
	///
	/// Negative and non-finite values saturate to zero.
	pub fn from_nanos_f64(nanos: f64) -> Self {
		let femtos = nanos * Self::FEMTOS_PER_NANO as f64;
		let femto_secs = match femtos.is_finite() && femtos > 0.0 {
			true => femtos.round() as u128,
			false => 0,
		};

		Self { femto_secs }
	}

	/// Returns this duration in floating-point nanoseconds
	pub fn as_nanos_f64(self) -> f64 {
		self.femto_secs as f64 / Self::FEMTOS_PER_NANO as f64
	}

	/// Returns this duration in femto seconds
	pub const fn as_femtos(self) -> u128 {
		self.femto_secs
	}
}

impl ops::Add for SimDuration {
	type Output = Self;

	fn add(self, rhs: Self) -> Self::Output {
		Self {
			femto_secs: self.femto_secs.saturating_add(rhs.femto_secs),
		}
	}
}

impl ops::Mul<u64> for SimDuration {
	type Output = Self;

	fn mul(self, rhs: u64) -> Self::Output {
		Self {
			femto_secs: self.femto_secs.saturating_mul(u128::from(rhs)),
		}
	}
}

impl fmt::Display for SimDuration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		// Format in the largest unit with a non-zero whole part
		const UNITS: [(u128, &str); 6] = [
			(1_000_000_000_000_000, "s"),
			(1_000_000_000_000, "ms"),
			(1_000_000_000, "µs"),
			(1_000_000, "ns"),
			(1_000, "ps"),
			(1, "fs"),
		];

		if self.femto_secs == 0 {
			return write!(f, "0ns");
		}

		let (scale, unit) = UNITS
			.into_iter()
			.find(|&(scale, _)| self.femto_secs >= scale)
			.unwrap_or((1, "fs"));
		let whole = self.femto_secs / scale;
		let frac = (self.femto_secs % scale) * 1000 / scale;
		match frac {
			0 => write!(f, "{whole}{unit}"),
			_ => write!(f, "{whole}.{frac:03}{unit}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_nanos_rounds_to_femtos() {
		assert_eq!(SimDuration::from_nanos_f64(2.5).as_femtos(), 2_500_000);
		assert_eq!(SimDuration::from_nanos_f64(-1.0), SimDuration::ZERO);
		assert_eq!(SimDuration::from_nanos_f64(f64::NAN), SimDuration::ZERO);
	}

	#[test]
	fn display_picks_largest_unit() {
		assert_eq!(SimDuration::ZERO.to_string(), "0ns");
		assert_eq!(SimDuration::from_nanos_f64(2.5).to_string(), "2.500ns");
		assert_eq!(SimDuration::from_nanos_f64(614.4).to_string(), "614.400ns");
		assert_eq!(SimDuration::from_nanos_f64(10_240.0).to_string(), "10.240µs");
		assert_eq!(SimDuration::from_nanos_f64(0.15).to_string(), "150ps");
	}

	#[test]
	fn arithmetic_saturates() {
		let cycle = SimDuration::from_nanos_f64(2.5);
		assert_eq!((cycle * 4).as_nanos_f64(), 10.0);
		assert_eq!((cycle + cycle).as_nanos_f64(), 5.0);
	}
}
