//! Traffic analysis

// Imports
use {
	super::PlaneTimelines,
	crate::{
		report::{Report, Section},
		sim_log::{OpKind, PlaneState, WriteRecord},
		Config,
	},
	average::Variance,
	itertools::Itertools,
	nvsched_util::DisplayWrapper,
	std::collections::BTreeMap,
};

/// Analyzes the traffic of the write log.
pub fn analyze(config: &Config, records: &[WriteRecord], timelines: &PlaneTimelines) -> Result<Report, anyhow::Error> {
	let geometry = &config.geometry;
	let timing = &config.timing;
	let mut report = Report::new("Traffic analysis");

	// Note: The span is inclusive, so a single record spans 1 cycle.
	let span_cycles = records
		.iter()
		.map(|record| record.time)
		.minmax()
		.into_option()
		.map_or(0, |(first, last)| (last - first).saturating_add(1));
	let span = timing.cycles_duration(span_cycles as f64);

	let writes = records.iter().filter(|record| record.kind.is_write()).collect::<Vec<_>>();
	let write_rate = match span.as_nanos_f64() {
		span_ns if span_ns > 0.0 => writes.len() as f64 / (span_ns / 1000.0),
		_ => 0.0,
	};
	report.add_section(
		Section::new("Summary")
			.with("records", records.len())
			.with("writes", writes.len())
			.with("span_cycles", span_cycles)
			.with("span", span)
			.with("writes_per_us", write_rate),
	);

	// Operation counts
	let op_counts = records.iter().map(|record| record.kind).counts();
	let mut operations = Section::new("Operations");
	for &kind in OpKind::ALL {
		operations.push(kind.tag(), op_counts.get(&kind).copied().unwrap_or(0));
	}
	report.add_section(operations);

	// Inter-arrival times between consecutive writes
	let inter_arrivals = writes
		.iter()
		.tuple_windows()
		.map(|(prev, next)| next.time.saturating_sub(prev.time))
		.collect::<Vec<_>>();
	let (min_inter_arrival, max_inter_arrival) = inter_arrivals.iter().copied().minmax().into_option().unwrap_or((0, 0));
	let inter_arrival_variance = inter_arrivals.iter().map(|&cycles| cycles as f64).collect::<Variance>();
	report.add_section(
		Section::new("Write inter-arrival (cycles)")
			.with("samples", inter_arrivals.len())
			.with("min", min_inter_arrival)
			.with("mean", inter_arrival_variance.mean())
			.with("std_dev", inter_arrival_variance.sample_variance().sqrt())
			.with("max", max_inter_arrival),
	);

	// Per-plane and per-package writes
	let mut plane_writes = vec![0_u64; geometry.total_planes()];
	let mut package_writes = vec![0_u64; geometry.packages];
	let mut package_transfers = vec![0_u64; geometry.packages];
	for record in records {
		let package = record.addr.plane.package;
		if record.kind != OpKind::Erase {
			package_transfers[package] += 1;
		}
		if record.kind.is_write() {
			plane_writes[geometry.plane_idx(record.addr.plane)?] += 1;
			package_writes[package] += 1;
		}
	}
	tracing::debug!(
		"Plane writes: {}",
		DisplayWrapper::new(|f| {
			for (plane_idx, &count) in plane_writes.iter().enumerate().filter(|(_, &count)| count != 0) {
				write!(f, "{}={count} ", geometry.plane_addr(plane_idx))?;
			}
			Ok(())
		})
	);

	let page_transfer = timing.channel_page_transfer(geometry);
	let mut packages = Section::new("Packages");
	for (package, (&write_count, &transfers)) in package_writes.iter().zip(&package_transfers).enumerate() {
		let channel_busy = page_transfer * transfers;
		let channel_utilization = match span.as_nanos_f64() {
			span_ns if span_ns > 0.0 => channel_busy.as_nanos_f64() / span_ns,
			_ => 0.0,
		};

		packages.push(format!("{package}.writes"), write_count);
		packages.push(format!("{package}.channel_busy"), channel_busy);
		packages.push(format!("{package}.channel_utilization"), channel_utilization);
	}
	report.add_section(packages);

	let mut planes = Section::new("Plane writes");
	for (plane_idx, &count) in plane_writes.iter().enumerate() {
		planes.push(geometry.plane_addr(plane_idx).to_string(), count);
	}
	report.add_section(planes);

	report.add_section(self::plane_states(config, records, timelines)?);

	Ok(report)
}

/// Summarizes plane states and write conflicts
fn plane_states(config: &Config, records: &[WriteRecord], timelines: &PlaneTimelines) -> Result<Section, anyhow::Error> {
	let geometry = &config.geometry;
	let mut section = Section::new("Plane states");

	// A write conflicts if its plane was busy when it was issued
	let mut conflicts = 0_u64;
	for record in records.iter().filter(|record| record.kind.is_write()) {
		let plane_idx = geometry.plane_idx(record.addr.plane)?;
		let state = timelines.state_before(plane_idx, record.time);
		if state != PlaneState::Idle {
			tracing::trace!(time = record.time, plane = %record.addr.plane, %state, "Write conflict");
			conflicts += 1;
		}
	}
	section.push("conflicts", conflicts);

	// Note: The window covers both logs, so a plane busy past the last
	//       write still counts.
	let first_time = records.iter().map(|record| record.time).chain(timelines.first_time()).min();
	let last_time = records.iter().map(|record| record.time).chain(timelines.last_time()).max();
	let window = first_time
		.zip(last_time)
		.map_or(0, |(first, last)| (last - first).saturating_add(1));
	let state_cycles = match last_time {
		Some(last_time) => timelines.state_cycles(last_time.saturating_add(1)),
		None => BTreeMap::new(),
	};

	let busy_cycles = state_cycles
		.iter()
		.filter(|(&state, _)| state != PlaneState::Idle)
		.fold(0_u64, |busy_cycles, (_, &cycles)| busy_cycles.saturating_add(cycles));
	let utilization = match window as f64 * geometry.total_planes() as f64 {
		plane_cycles if plane_cycles > 0.0 => busy_cycles as f64 / plane_cycles,
		_ => 0.0,
	};
	section.push("busy_cycles", busy_cycles);
	section.push("mean_plane_utilization", utilization);

	for &state in PlaneState::ALL {
		let cycles = state_cycles.get(&state).copied().unwrap_or(0);
		section.push(format!("{}_cycles", state.tag()), cycles);
	}

	Ok(section)
}
