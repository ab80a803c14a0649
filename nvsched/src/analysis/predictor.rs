//! Predictor analysis.
//!
//! Compares the idle-plane predictor against the schedule observed in the
//! plane log. For a write issued at `t`, the predictor expects it to start at
//! `t` if its plane is idle, otherwise as soon as the plane becomes idle again.
//! The observed start is the plane's first unclaimed write transition at or
//! after `t`.

// Imports
use {
	super::PlaneTimelines,
	crate::{
		report::{Report, Section},
		sim_log::{PlaneState, WriteRecord},
		Config,
	},
	average::{Estimate, Mean},
	nvsched_util::SimDuration,
};

/// Error buckets, as `(label, max error in cycles)`
const ERROR_BUCKETS: [(&str, u64); 5] = [
	("exact", 0),
	("1-10", 10),
	("11-100", 100),
	("101-1000", 1000),
	(">1000", u64::MAX),
];

/// Analyzes the idle-plane predictor against the observed schedule
pub fn analyze(config: &Config, records: &[WriteRecord], timelines: &PlaneTimelines) -> Result<Report, anyhow::Error> {
	let geometry = &config.geometry;

	// Index of the first unclaimed transition of each plane
	let mut cursors = vec![0_usize; geometry.total_planes()];

	let mut stats = Statistics::default();
	for record in records.iter().filter(|record| record.kind.is_write()) {
		let plane_idx = geometry.plane_idx(record.addr.plane)?;

		let predicted = match timelines.state_before(plane_idx, record.time) {
			PlaneState::Idle => Some(record.time),
			_ => timelines.next_idle(plane_idx, record.time),
		};

		let transitions = timelines.transitions(plane_idx);
		let cursor = &mut cursors[plane_idx];
		let observed = transitions[*cursor..]
			.iter()
			.position(|transition| transition.time >= record.time && transition.state.is_write())
			.map(|offset| {
				let transition_idx = *cursor + offset;
				*cursor = transition_idx + 1;
				transitions[transition_idx].time
			});

		tracing::trace!(time = record.time, plane = %record.addr.plane, ?predicted, ?observed, "Predicted write");
		stats.register(record.time, predicted, observed);
	}

	Ok(stats.into_report(config))
}

/// Predictor statistics
#[derive(Clone, Debug, Default)]
struct Statistics {
	/// Writes seen
	writes: u64,

	/// Writes with a prediction
	predicted: u64,

	/// Writes with an observed start
	observed: u64,

	/// Writes with both
	compared: u64,

	/// Writes whose prediction matched exactly
	exact: u64,

	/// Writes predicted to wait for their plane
	predicted_waits: u64,

	/// Writes observed to wait for their plane
	observed_waits: u64,

	/// Absolute error, in cycles
	abs_error: Mean,

	/// Maximum absolute error, in cycles
	max_abs_error: u64,

	/// Writes per error bucket
	error_buckets: [u64; ERROR_BUCKETS.len()],
}

impl Statistics {
	/// Registers a write issued at `time`
	fn register(&mut self, time: u64, predicted: Option<u64>, observed: Option<u64>) {
		self.writes += 1;

		if let Some(predicted) = predicted {
			self.predicted += 1;
			if predicted > time {
				self.predicted_waits += 1;
			}
		}

		if let Some(observed) = observed {
			self.observed += 1;
			if observed > time {
				self.observed_waits += 1;
			}
		}

		if let (Some(predicted), Some(observed)) = (predicted, observed) {
			let error = predicted.abs_diff(observed);
			self.compared += 1;
			if error == 0 {
				self.exact += 1;
			}
			self.abs_error.add(error as f64);
			self.max_abs_error = self.max_abs_error.max(error);

			let bucket_idx = ERROR_BUCKETS
				.iter()
				.position(|&(_, max_error)| error <= max_error)
				.unwrap_or(ERROR_BUCKETS.len() - 1);
			self.error_buckets[bucket_idx] += 1;
		}
	}

	/// Builds the report
	fn into_report(self, config: &Config) -> Report {
		let agreement_rate = match self.compared {
			0 => 0.0,
			compared => self.exact as f64 / compared as f64,
		};
		let mean_abs_error = match self.compared {
			0 => 0.0,
			_ => self.abs_error.mean(),
		};

		let mut report = Report::new("Predictor analysis");
		report.add_section(
			Section::new("Predictor")
				.with("writes", self.writes)
				.with("predicted", self.predicted)
				.with("unpredicted", self.writes - self.predicted)
				.with("observed", self.observed)
				.with("unobserved", self.writes - self.observed)
				.with("compared", self.compared)
				.with("exact_agreements", self.exact)
				.with("agreement_rate", agreement_rate)
				.with("predicted_waits", self.predicted_waits)
				.with("observed_waits", self.observed_waits),
		);
		report.add_section(
			Section::new("Prediction error")
				.with("mean_abs_cycles", mean_abs_error)
				.with("max_abs_cycles", self.max_abs_error)
				.with("mean_abs", config.timing.cycles_duration(mean_abs_error))
				.with(
					"max_abs",
					SimDuration::from_nanos_f64(self.max_abs_error as f64 * config.timing.device_cycle_ns),
				),
		);

		let mut buckets = Section::new("Prediction error (cycles)");
		for (&(label, _), &count) in ERROR_BUCKETS.iter().zip(&self.error_buckets) {
			buckets.push(label, count);
		}
		report.add_section(buckets);

		report
	}
}
