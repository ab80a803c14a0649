//! Plane timelines

// Imports
use {
	crate::{
		config::Geometry,
		sim_log::{PlaneRecord, PlaneState},
		ErrorKind,
	},
	anyhow::Context,
	std::collections::BTreeMap,
};

/// State transitions of every plane, as given by the plane log
#[derive(Clone, Debug)]
pub struct PlaneTimelines {
	/// Transitions, by flat plane index.
	///
	/// Each plane's transitions are sorted by time.
	transitions: Vec<Vec<Transition>>,
}

impl PlaneTimelines {
	/// Builds the timelines from the plane log.
	///
	/// # Errors
	/// Returns an error if a record's plane is outside `geometry`, or
	/// if the records aren't in chronological order.
	pub fn new(geometry: &Geometry, records: &[PlaneRecord]) -> Result<Self, anyhow::Error> {
		let mut transitions = vec![vec![]; geometry.total_planes()];

		let mut last_time = 0;
		for (record_idx, record) in records.iter().enumerate() {
			if record.time < last_time {
				return Err(anyhow::Error::new(ErrorKind::Parse).context(format!(
					"Plane log record {} goes back in time ({} after {last_time})",
					record_idx + 1,
					record.time
				)));
			}
			last_time = record.time;

			let plane_idx = geometry
				.plane_idx(record.plane)
				.with_context(|| format!("Plane log record {} has an invalid plane", record_idx + 1))?;
			transitions[plane_idx].push(Transition {
				time:  record.time,
				state: record.state,
			});
		}

		Ok(Self { transitions })
	}

	/// Returns all transitions of a plane
	pub fn transitions(&self, plane_idx: usize) -> &[Transition] {
		&self.transitions[plane_idx]
	}

	/// Returns the state of a plane just before `time`.
	///
	/// Planes are idle until their first transition.
	pub fn state_before(&self, plane_idx: usize, time: u64) -> PlaneState {
		let transitions = self.transitions(plane_idx);
		let idx = transitions.partition_point(|transition| transition.time < time);
		match idx {
			0 => PlaneState::Idle,
			_ => transitions[idx - 1].state,
		}
	}

	/// Returns the first time, at or after `time`, that a plane becomes idle
	pub fn next_idle(&self, plane_idx: usize, time: u64) -> Option<u64> {
		let transitions = self.transitions(plane_idx);
		let start = transitions.partition_point(|transition| transition.time < time);
		transitions[start..]
			.iter()
			.find(|transition| transition.state == PlaneState::Idle)
			.map(|transition| transition.time)
	}

	/// Returns the cycles each plane spent in each state, summed over all planes,
	/// counting every plane's last state as lasting until `end`.
	pub fn state_cycles(&self, end: u64) -> BTreeMap<PlaneState, u64> {
		let mut cycles = PlaneState::ALL
			.iter()
			.map(|&state| (state, 0u64))
			.collect::<BTreeMap<_, _>>();

		for transitions in &self.transitions {
			let ends = transitions
				.iter()
				.skip(1)
				.map(|transition| transition.time)
				.chain(std::iter::once(end));
			for (transition, state_end) in transitions.iter().zip(ends) {
				let state_cycles = cycles.entry(transition.state).or_default();
				*state_cycles = state_cycles.saturating_add(state_end.saturating_sub(transition.time));
			}
		}

		cycles
	}

	/// Returns the time of the last transition, if any
	pub fn last_time(&self) -> Option<u64> {
		self.transitions
			.iter()
			.filter_map(|transitions| transitions.last())
			.map(|transition| transition.time)
			.max()
	}

	/// Returns the time of the first transition, if any
	pub fn first_time(&self) -> Option<u64> {
		self.transitions
			.iter()
			.filter_map(|transitions| transitions.first())
			.map(|transition| transition.time)
			.min()
	}
}

/// Plane state transition
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Transition {
	/// Timestamp
	pub time: u64,

	/// State entered
	pub state: PlaneState,
}

#[cfg(test)]
mod tests {
	use {super::*, crate::sim_log::PlaneAddr};

	fn record(time: u64, state: PlaneState, die: usize) -> PlaneRecord {
		PlaneRecord {
			time,
			state,
			plane: PlaneAddr {
				package: 0,
				die,
				plane: 0,
			},
		}
	}

	fn geometry() -> Geometry {
		Geometry {
			packages: 1,
			dies_per_package: 2,
			planes_per_die: 1,
			..Geometry::default()
		}
	}

	#[test]
	fn state_before_uses_strictly_earlier_transitions() {
		let records = [record(10, PlaneState::Writing, 0), record(20, PlaneState::Idle, 0)];
		let timelines = PlaneTimelines::new(&geometry(), &records).unwrap();

		assert_eq!(timelines.state_before(0, 0), PlaneState::Idle);
		assert_eq!(timelines.state_before(0, 10), PlaneState::Idle);
		assert_eq!(timelines.state_before(0, 11), PlaneState::Writing);
		assert_eq!(timelines.state_before(0, 20), PlaneState::Writing);
		assert_eq!(timelines.state_before(0, 21), PlaneState::Idle);
		assert_eq!(timelines.state_before(1, 15), PlaneState::Idle);
	}

	#[test]
	fn next_idle_searches_forward() {
		let records = [
			record(10, PlaneState::Writing, 0),
			record(20, PlaneState::Idle, 0),
			record(30, PlaneState::Erasing, 0),
		];
		let timelines = PlaneTimelines::new(&geometry(), &records).unwrap();

		assert_eq!(timelines.next_idle(0, 12), Some(20));
		assert_eq!(timelines.next_idle(0, 20), Some(20));
		assert_eq!(timelines.next_idle(0, 31), None);
	}

	#[test]
	fn state_cycles_sum_over_planes() {
		let records = [
			record(0, PlaneState::Writing, 0),
			record(4, PlaneState::Reading, 1),
			record(10, PlaneState::Idle, 0),
			record(12, PlaneState::Idle, 1),
		];
		let timelines = PlaneTimelines::new(&geometry(), &records).unwrap();
		let cycles = timelines.state_cycles(20);

		assert_eq!(cycles[&PlaneState::Writing], 10);
		assert_eq!(cycles[&PlaneState::Reading], 8);
		assert_eq!(cycles[&PlaneState::Idle], 10 + 8);
		assert_eq!(cycles[&PlaneState::Erasing], 0);
		assert_eq!(timelines.first_time(), Some(0));
		assert_eq!(timelines.last_time(), Some(12));
	}

	#[test]
	fn non_chronological_logs_are_rejected() {
		let records = [record(10, PlaneState::Writing, 0), record(5, PlaneState::Idle, 1)];
		let err = PlaneTimelines::new(&geometry(), &records).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
	}

	#[test]
	fn out_of_range_planes_are_rejected() {
		let records = [record(0, PlaneState::Writing, 2)];
		let err = PlaneTimelines::new(&geometry(), &records).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
	}
}
