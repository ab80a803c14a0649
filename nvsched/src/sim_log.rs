//! Simulator log parsing.
//!
//! Both logs are line based, with whitespace separated fields:
//!
//! ```text
//! write log:  <time> <kind>  <package> <die> <plane> <block> <page>
//! plane log:  <time> <state> <package> <die> <plane>
//! ```
//!
//! Blank lines are skipped. Tags are case-insensitive.

// Imports
use {
	crate::ErrorKind,
	anyhow::Context,
	nvsched_util::NextField,
	std::{fmt, io, str::FromStr},
};

/// A record parsed from a single log line
pub trait LogRecord: Sized {
	/// Names of the fields of each line, in order
	const FIELDS: &'static [&'static str];

	/// Parses a record from the fields of a line.
	///
	/// `fields` is guaranteed to yield exactly `FIELDS.len()` items.
	fn from_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, anyhow::Error>;

	/// Timestamp, in device cycles
	fn time(&self) -> u64;
}

/// Parses all records from a log.
///
/// Fails on the first malformed line, with its line number.
pub fn parse_log<R: LogRecord>(reader: impl io::BufRead) -> Result<Vec<R>, anyhow::Error> {
	let mut records = vec![];
	for (line_idx, line) in reader.lines().enumerate() {
		let line_num = line_idx + 1;
		let line = match line {
			Ok(line) => line,
			Err(err) => {
				// Note: Invalid utf-8 is reported as invalid data, which makes the line malformed.
				let kind = match err.kind() {
					io::ErrorKind::InvalidData => ErrorKind::Parse,
					_ => ErrorKind::FileAccess,
				};
				return Err(anyhow::Error::new(err)
					.context(kind)
					.context(format!("Unable to read line {line_num}")));
			},
		};

		let line = line.trim();
		if line.is_empty() {
			continue;
		}

		let record = self::parse_line::<R>(line)
			.context(ErrorKind::Parse)
			.with_context(|| format!("Malformed line {line_num}: {line:?}"))?;
		tracing::trace!(target: "nvsched::parse_log", line_num, time = record.time(), "Parsed record");
		records.push(record);
	}

	tracing::debug!(records = records.len(), "Parsed log");
	Ok(records)
}

/// Parses a single, non-empty, line
fn parse_line<R: LogRecord>(line: &str) -> Result<R, anyhow::Error> {
	let field_count = line.split_whitespace().count();
	anyhow::ensure!(
		field_count == R::FIELDS.len(),
		"Expected {} fields ({}), found {field_count}",
		R::FIELDS.len(),
		R::FIELDS.join(" "),
	);

	R::from_fields(&mut line.split_whitespace())
}

/// Plane address
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default, Debug)]
pub struct PlaneAddr {
	pub package: usize,
	pub die:     usize,
	pub plane:   usize,
}

impl PlaneAddr {
	/// Parses a plane address from the next 3 fields
	fn from_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, anyhow::Error> {
		Ok(Self {
			package: fields.next_field("package")?,
			die:     fields.next_field("die")?,
			plane:   fields.next_field("plane")?,
		})
	}
}

impl fmt::Display for PlaneAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.package, self.die, self.plane)
	}
}

/// Page address
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default, Debug)]
pub struct PageAddr {
	pub plane: PlaneAddr,
	pub block: usize,
	pub page:  usize,
}

impl fmt::Display for PageAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.plane, self.block, self.page)
	}
}

/// Write log record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WriteRecord {
	/// Timestamp
	pub time: u64,

	/// Operation kind
	pub kind: OpKind,

	/// Target page
	pub addr: PageAddr,
}

impl LogRecord for WriteRecord {
	const FIELDS: &'static [&'static str] = &["time", "kind", "package", "die", "plane", "block", "page"];

	fn from_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, anyhow::Error> {
		let time = fields.next_field("time")?;
		let kind = fields.next_field("kind")?;
		let plane = PlaneAddr::from_fields(fields)?;
		let block = fields.next_field("block")?;
		let page = fields.next_field("page")?;

		Ok(Self {
			time,
			kind,
			addr: PageAddr { plane, block, page },
		})
	}

	fn time(&self) -> u64 {
		self.time
	}
}

/// Plane log record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct PlaneRecord {
	/// Timestamp
	pub time: u64,

	/// State the plane entered
	pub state: PlaneState,

	/// Plane
	pub plane: PlaneAddr,
}

impl LogRecord for PlaneRecord {
	const FIELDS: &'static [&'static str] = &["time", "state", "package", "die", "plane"];

	fn from_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, anyhow::Error> {
		let time = fields.next_field("time")?;
		let state = fields.next_field("state")?;
		let plane = PlaneAddr::from_fields(fields)?;

		Ok(Self { time, state, plane })
	}

	fn time(&self) -> u64 {
		self.time
	}
}

/// Declares a closed set of log tags, parsed case-insensitively
macro_rules! log_tags {
	(
		$(#[$meta:meta])*
		pub enum $Name:ident {
			$(
				#[doc = $doc:literal]
				$Variant:ident = $tag:literal,
			)*
		}
	) => {
		$(#[$meta])*
		#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
		pub enum $Name {
			$(
				#[doc = $doc]
				$Variant,
			)*
		}

		impl $Name {
			/// All variants, in declaration order
			pub const ALL: &'static [Self] = &[$(Self::$Variant,)*];

			/// Returns the log tag of this variant
			pub const fn tag(self) -> &'static str {
				match self {
					$(Self::$Variant => $tag,)*
				}
			}
		}

		impl FromStr for $Name {
			type Err = UnknownTag;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::ALL
					.iter()
					.copied()
					.find(|variant| variant.tag().eq_ignore_ascii_case(s))
					.ok_or_else(|| UnknownTag(s.to_owned()))
			}
		}

		impl fmt::Display for $Name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.tag())
			}
		}
	};
}

log_tags! {
	/// Operation kind of a write log record
	pub enum OpKind {
		/// Read
		Read = "READ",
		/// Garbage collection read
		GcRead = "GC_READ",
		/// Write
		Write = "WRITE",
		/// Garbage collection write
		GcWrite = "GC_WRITE",
		/// Block erase
		Erase = "ERASE",
	}
}

impl OpKind {
	/// Returns if this operation writes a page
	pub const fn is_write(self) -> bool {
		matches!(self, Self::Write | Self::GcWrite)
	}
}

log_tags! {
	/// Plane state of a plane log record
	pub enum PlaneState {
		/// Idle
		Idle = "IDLE",
		/// Reading
		Reading = "READING",
		/// Garbage collection reading
		GcReading = "GC_READING",
		/// Writing
		Writing = "WRITING",
		/// Garbage collection writing
		GcWriting = "GC_WRITING",
		/// Erasing
		Erasing = "ERASING",
	}
}

impl PlaneState {
	/// Returns the state for the simulator's numeric plane state
	pub fn from_ordinal(ordinal: usize) -> Option<Self> {
		Self::ALL.get(ordinal).copied()
	}

	/// Returns if the plane started writing a page in this state
	pub const fn is_write(self) -> bool {
		matches!(self, Self::Writing | Self::GcWriting)
	}
}

/// Unknown log tag
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct UnknownTag(pub String);

impl fmt::Display for UnknownTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown tag {:?}", self.0)
	}
}

impl std::error::Error for UnknownTag {}

#[cfg(test)]
mod tests {
	use super::*;

	const WRITE_LOG: &str = "\
0 WRITE 0 0 0 0 0

1 write 0 1 0 3 7
   2 GC_WRITE 31 3 0 31 47
3 ERASE 5 2 0 4 0
";

	#[test]
	fn write_log_skips_blank_lines_and_keeps_order() {
		let records = parse_log::<WriteRecord>(WRITE_LOG.as_bytes()).unwrap();

		assert_eq!(records.len(), 4);
		assert_eq!(records.iter().map(|record| record.time).collect::<Vec<_>>(), [0, 1, 2, 3]);
		assert_eq!(records[1], WriteRecord {
			time: 1,
			kind: OpKind::Write,
			addr: PageAddr {
				plane: PlaneAddr {
					package: 0,
					die:     1,
					plane:   0,
				},
				block: 3,
				page:  7,
			},
		});
		assert_eq!(records[2].kind, OpKind::GcWrite);
		assert_eq!(records[3].kind, OpKind::Erase);
		assert!(!records[3].kind.is_write());
	}

	#[test]
	fn plane_log_parses_states() {
		let log = "5 WRITING 1 2 0\n9 idle 1 2 0\n";
		let records = parse_log::<PlaneRecord>(log.as_bytes()).unwrap();

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].state, PlaneState::Writing);
		assert_eq!(records[1].state, PlaneState::Idle);
		assert_eq!(records[1].plane.to_string(), "1/2/0");
	}

	#[test]
	fn wrong_field_count_reports_line() {
		let log = "0 WRITE 0 0 0 0 0\n1 WRITE 0 0 0 0\n";
		let err = parse_log::<WriteRecord>(log.as_bytes()).unwrap_err();

		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
		assert!(err.to_string().contains("line 2"), "{err}");
	}

	#[test]
	fn invalid_utf8_is_a_parse_error() {
		let log: &[u8] = b"0 WRITE 0 0 0 0 0\n1 WRITE \xff 0 0 0 0\n";
		let err = parse_log::<WriteRecord>(log).unwrap_err();

		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
		assert!(err.to_string().contains("line 2"), "{err}");
	}

	#[test]
	fn non_numeric_and_unknown_tags_fail() {
		let err = parse_log::<WriteRecord>("x WRITE 0 0 0 0 0".as_bytes()).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));

		let err = parse_log::<PlaneRecord>("0 SLEEPING 0 0 0".as_bytes()).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Parse));
		assert!(format!("{err:#}").contains("SLEEPING"), "{err:#}");
	}

	#[test]
	fn empty_log_has_no_records() {
		let records = parse_log::<PlaneRecord>("\n\n".as_bytes()).unwrap();
		assert!(records.is_empty());
	}

	#[test]
	fn plane_state_ordinals_follow_simulator() {
		assert_eq!(PlaneState::from_ordinal(0), Some(PlaneState::Idle));
		assert_eq!(PlaneState::from_ordinal(3), Some(PlaneState::Writing));
		assert_eq!(PlaneState::from_ordinal(5), Some(PlaneState::Erasing));
		assert_eq!(PlaneState::from_ordinal(6), None);
	}
}
