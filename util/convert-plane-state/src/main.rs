//! Converts the simulator's `PlaneState.log` snapshots from stdin into
//! a plane log on stdout.
//!
//! Only plane state changes are emitted, with every plane starting idle.

// Imports
use {
	anyhow::Context,
	clap::Parser,
	nvsched::{
		config::Geometry,
		sim_log::{PlaneAddr, PlaneState},
	},
	nvsched_util::{logger, NextField},
	std::{
		collections::BTreeMap,
		io::{self, BufRead, BufWriter, Write},
	},
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
struct Args {
	/// Dies per package
	#[clap(long = "dies-per-package", default_value_t = Geometry::default().dies_per_package)]
	dies_per_package: usize,

	/// Planes per die
	#[clap(long = "planes-per-die", default_value_t = Geometry::default().planes_per_die)]
	planes_per_die: usize,
}

fn main() -> Result<(), anyhow::Error> {
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));
	logger::init(None, false);

	let stdin = io::stdin().lock();
	let mut stdout = BufWriter::new(io::stdout().lock());
	let changes = self::convert(stdin, &mut stdout, args.dies_per_package, args.planes_per_die)
		.context("Unable to convert plane state log")?;
	stdout.flush().context("Unable to flush output")?;

	tracing::info!(changes, "Converted plane state log");
	Ok(())
}

/// Converts snapshots from `reader` into plane log lines on `writer`.
///
/// Returns the number of lines written.
fn convert(
	reader: impl BufRead,
	writer: &mut impl Write,
	dies_per_package: usize,
	planes_per_die: usize,
) -> Result<usize, anyhow::Error> {
	anyhow::ensure!(
		dies_per_package != 0 && planes_per_die != 0,
		"Dies per package and planes per die must be non-zero"
	);

	let mut states = BTreeMap::<PlaneAddr, PlaneState>::new();
	let mut cur_time = None;
	let mut package = 0;
	let mut changes = 0;
	for (line_idx, line) in reader.lines().enumerate() {
		let line_num = line_idx + 1;
		let line = line.with_context(|| format!("Unable to read line {line_num}"))?;
		let line = line.trim();

		// A blank line ends the current snapshot
		if line.is_empty() {
			cur_time = None;
			continue;
		}

		if let Some(rest) = line.strip_prefix("Clock cycle:") {
			let time = rest
				.split_whitespace()
				.next_field::<u64>("clock cycle")
				.with_context(|| format!("Malformed clock cycle on line {line_num}"))?;
			cur_time = Some(time);
			package = 0;
			continue;
		}

		// Anything outside of a snapshot, such as the header, is ignored
		let Some(time) = cur_time else {
			tracing::debug!(line_num, line, "Ignoring line outside of snapshot");
			continue;
		};

		let ordinals = line.split_whitespace().collect::<Vec<_>>();
		anyhow::ensure!(
			ordinals.len() == dies_per_package * planes_per_die,
			"Expected {} plane states on line {line_num}, found {}",
			dies_per_package * planes_per_die,
			ordinals.len()
		);

		for (plane_idx, ordinal) in ordinals.into_iter().enumerate() {
			let state = ordinal
				.parse::<usize>()
				.ok()
				.and_then(PlaneState::from_ordinal)
				.with_context(|| format!("Unknown plane state {ordinal:?} on line {line_num}"))?;
			let plane = PlaneAddr {
				package,
				die: plane_idx / planes_per_die,
				plane: plane_idx % planes_per_die,
			};

			let prev_state = states.insert(plane, state).unwrap_or(PlaneState::Idle);
			if prev_state != state {
				writeln!(writer, "{time} {state} {} {} {}", plane.package, plane.die, plane.plane)
					.context("Unable to write output")?;
				changes += 1;
			}
		}
		package += 1;
	}

	Ok(changes)
}

#[cfg(test)]
mod tests {
	use super::*;

	const SNAPSHOTS: &str = "\
Plane State Log
Clock cycle: 10
3    0
0    0

Clock cycle: 25
3    0
0    5

Clock cycle: 40
0    0
0    5

";

	#[test]
	fn emits_only_state_changes() {
		let mut output = Vec::<u8>::new();
		let changes = convert(SNAPSHOTS.as_bytes(), &mut output, 2, 1).unwrap();

		assert_eq!(changes, 3);
		assert_eq!(
			String::from_utf8(output).unwrap(),
			"10 WRITING 0 0 0\n25 ERASING 1 1 0\n40 IDLE 0 0 0\n"
		);
	}

	#[test]
	fn output_parses_as_plane_log() {
		let mut output = Vec::<u8>::new();
		convert(SNAPSHOTS.as_bytes(), &mut output, 2, 1).unwrap();

		let records = nvsched::sim_log::parse_log::<nvsched::PlaneRecord>(output.as_slice()).unwrap();
		assert_eq!(records.len(), 3);
		assert_eq!(records[1].state, PlaneState::Erasing);
	}

	#[test]
	fn rejects_wrong_row_width() {
		let err = convert("Clock cycle: 1\n0 0 0\n".as_bytes(), &mut Vec::<u8>::new(), 2, 1).unwrap_err();
		assert!(err.to_string().contains("line 2"), "{err}");
	}

	#[test]
	fn rejects_unknown_states() {
		let err = convert("Clock cycle: 1\n0 9\n".as_bytes(), &mut Vec::<u8>::new(), 2, 1).unwrap_err();
		assert!(err.to_string().contains("\"9\""), "{err}");
	}
}
