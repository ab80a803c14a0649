//! Log analysis

// Modules
pub mod predictor;
pub mod timeline;
pub mod traffic;

// Exports
pub use self::timeline::PlaneTimelines;

// Imports
use {
	crate::{
		report::{Format, OutputDest, Report},
		sim_log::{self, LogRecord, PlaneRecord, WriteRecord},
		Config,
		ErrorKind,
	},
	anyhow::Context,
	std::{fmt, io, str::FromStr},
};

/// Run mode
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Mode {
	/// Operation counts, rates and timing
	Traffic,

	/// Idle-plane predictor agreement with the observed schedule
	Predictor,
}

impl FromStr for Mode {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			s if s.eq_ignore_ascii_case("traffic") => Ok(Self::Traffic),
			s if s.eq_ignore_ascii_case("predictor") => Ok(Self::Predictor),
			_ => Err(anyhow::Error::new(ErrorKind::InvalidMode)
				.context(format!("Unknown mode {s:?}, expected `traffic` or `predictor`"))),
		}
	}
}

impl fmt::Display for Mode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Traffic => f.write_str("traffic"),
			Self::Predictor => f.write_str("predictor"),
		}
	}
}

/// Log analyzer
#[derive(Clone, Debug)]
pub struct LogAnalyzer {
	/// Config
	config: Config,
}

impl LogAnalyzer {
	/// Creates a new analyzer
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Returns the config
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Parses a log, in file order
	pub fn parse<R: LogRecord>(&self, reader: impl io::BufRead) -> Result<Vec<R>, anyhow::Error> {
		sim_log::parse_log(reader)
	}

	/// Computes the report for `mode`.
	///
	/// Depends only on its inputs, so the same logs always produce the same report.
	///
	/// # Errors
	/// Returns an error if any record addresses a page or plane outside of
	/// the configured geometry, or if the plane log isn't chronological.
	pub fn aggregate(
		&self,
		write_records: &[WriteRecord],
		plane_records: &[PlaneRecord],
		mode: Mode,
	) -> Result<Report, anyhow::Error> {
		let geometry = &self.config.geometry;
		for (record_idx, record) in write_records.iter().enumerate() {
			geometry
				.check_page(record.addr)
				.with_context(|| format!("Write log record {} has an invalid address", record_idx + 1))?;
		}
		let timelines = PlaneTimelines::new(geometry, plane_records).context("Unable to build plane timelines")?;

		if write_records.is_empty() {
			tracing::warn!("Write log is empty");
		}
		if plane_records.is_empty() {
			tracing::warn!("Plane log is empty");
		}

		tracing::info!(%mode, writes = write_records.len(), planes = plane_records.len(), "Aggregating");
		match mode {
			Mode::Traffic => traffic::analyze(&self.config, write_records, &timelines),
			Mode::Predictor => predictor::analyze(&self.config, write_records, &timelines),
		}
	}

	/// Writes `report` to `output`
	pub fn emit(&self, report: &Report, output: &OutputDest, format: Format) -> Result<(), anyhow::Error> {
		output.emit(report, format)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn modes_parse_case_insensitively() {
		assert_eq!("traffic".parse::<Mode>().unwrap(), Mode::Traffic);
		assert_eq!("Predictor".parse::<Mode>().unwrap(), Mode::Predictor);
	}

	#[test]
	fn unknown_modes_are_invalid() {
		let err = "schedule".parse::<Mode>().unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::InvalidMode));
	}

	#[test]
	fn aggregate_is_deterministic() {
		let analyzer = LogAnalyzer::new(Config::default());
		let writes = analyzer
			.parse::<WriteRecord>("0 WRITE 0 0 0 0 0\n4 WRITE 1 0 0 0 1\n9 GC_WRITE 0 0 0 1 0\n".as_bytes())
			.unwrap();
		let planes = analyzer
			.parse::<PlaneRecord>("0 WRITING 0 0 0\n6 IDLE 0 0 0\n9 GC_WRITING 0 0 0\n".as_bytes())
			.unwrap();

		for mode in [Mode::Traffic, Mode::Predictor] {
			let first = analyzer.aggregate(&writes, &planes, mode).unwrap();
			let second = analyzer.aggregate(&writes, &planes, mode).unwrap();
			assert_eq!(first, second);
			assert_eq!(first.to_string(), second.to_string());
		}
	}

	#[test]
	fn out_of_range_writes_are_rejected() {
		let analyzer = LogAnalyzer::new(Config::default());
		let writes = analyzer.parse::<WriteRecord>("0 WRITE 0 0 0 32 0\n".as_bytes()).unwrap();

		let err = analyzer.aggregate(&writes, &[], Mode::Traffic).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
	}
}
