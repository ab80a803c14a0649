//! Reports

// Imports
use {
	crate::ErrorKind,
	anyhow::Context,
	nvsched_util::SimDuration,
	std::{
		fmt,
		fs,
		io::{self, Write},
		path::PathBuf,
	},
};

/// Report
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct Report {
	/// Title
	pub title: String,

	/// Sections, in output order
	pub sections: Vec<Section>,
}

impl Report {
	/// Creates an empty report
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title:    title.into(),
			sections: vec![],
		}
	}

	/// Adds a section to this report
	pub fn add_section(&mut self, section: Section) {
		self.sections.push(section);
	}

	/// Returns a section by name
	pub fn section(&self, name: &str) -> Option<&Section> {
		self.sections.iter().find(|section| section.name == name)
	}

	/// Writes this report to `writer` in `format`
	pub fn write_to(&self, format: Format, writer: &mut impl Write) -> Result<(), anyhow::Error> {
		match format {
			Format::Text => write!(writer, "{self}").context("Unable to write report")?,
			Format::Json => {
				serde_json::to_writer_pretty(&mut *writer, self).context("Unable to write report")?;
				writeln!(writer).context("Unable to write report")?;
			},
		}

		Ok(())
	}
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "== {} ==", self.title)?;
		for section in &self.sections {
			writeln!(f)?;
			writeln!(f, "[{}]", section.name)?;

			let name_width = section.metrics.iter().map(|metric| metric.name.len()).max().unwrap_or(0);
			for metric in &section.metrics {
				writeln!(f, "  {:<name_width$}  {}", metric.name, metric.value)?;
			}
		}

		Ok(())
	}
}

/// Report section
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct Section {
	/// Name
	pub name: String,

	/// Metrics, in output order
	pub metrics: Vec<Metric>,
}

impl Section {
	/// Creates an empty section
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name:    name.into(),
			metrics: vec![],
		}
	}

	/// Adds a metric to this section
	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.push(name, value);
		self
	}

	/// Adds a metric to this section
	pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.metrics.push(Metric {
			name:  name.into(),
			value: value.into(),
		});
	}

	/// Returns a metric's value by name
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.metrics
			.iter()
			.find(|metric| metric.name == name)
			.map(|metric| &metric.value)
	}
}

/// Named metric
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
pub struct Metric {
	pub name:  String,
	pub value: Value,
}

/// Metric value
#[derive(PartialEq, Clone, Debug)]
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum Value {
	Count(u64),
	Float(f64),
	Duration(SimDuration),
	Text(String),
}

impl From<u64> for Value {
	fn from(count: u64) -> Self {
		Self::Count(count)
	}
}

impl From<usize> for Value {
	fn from(count: usize) -> Self {
		Self::Count(count as u64)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}

impl From<SimDuration> for Value {
	fn from(duration: SimDuration) -> Self {
		Self::Duration(duration)
	}
}

impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Value {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Count(count) => write!(f, "{count}"),
			Self::Float(value) => write!(f, "{value:.4}"),
			Self::Duration(duration) => write!(f, "{duration}"),
			Self::Text(text) => f.write_str(text),
		}
	}
}

/// Report format
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[derive(clap::ValueEnum)]
pub enum Format {
	/// Aligned plain text
	#[default]
	Text,

	/// Pretty-printed json
	Json,
}

/// Report output destination
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum OutputDest {
	/// Standard output
	Stdout,

	/// File, truncated before writing
	Overwrite(PathBuf),

	/// File, appended to
	Append(PathBuf),
}

impl OutputDest {
	/// Resolves the trailing positional arguments `[Append|Overwrite] [output_path]`.
	///
	/// A single argument is an output path to overwrite. With two, the
	/// first selects appending if it's exactly `Append`, overwriting otherwise.
	pub fn from_positional(args: &[String]) -> Result<Self, anyhow::Error> {
		match args {
			[] => Ok(Self::Stdout),
			[path] => Ok(Self::Overwrite(PathBuf::from(path))),
			[write_mode, path] => match write_mode.as_str() {
				"Append" => Ok(Self::Append(PathBuf::from(path))),
				_ => Ok(Self::Overwrite(PathBuf::from(path))),
			},
			_ => Err(anyhow::Error::new(ErrorKind::Argument).context(format!(
				"Expected at most 2 trailing arguments ([Append|Overwrite] [output_path]), found {}",
				args.len()
			))),
		}
	}

	/// Writes `report` to this destination.
	///
	/// The file, if any, is only opened once the report is ready.
	pub fn emit(&self, report: &Report, format: Format) -> Result<(), anyhow::Error> {
		let (path, append) = match self {
			Self::Stdout => {
				let mut stdout = io::stdout().lock();
				return self::write_report(report, format, &mut stdout).context("Unable to write report to stdout");
			},
			Self::Overwrite(path) => (path, false),
			Self::Append(path) => (path, true),
		};

		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(append)
			.truncate(!append)
			.open(path)
			.context(ErrorKind::FileAccess)
			.with_context(|| format!("Unable to open output file {path:?}"))?;
		let mut file = io::BufWriter::new(file);
		self::write_report(report, format, &mut file)
			.with_context(|| format!("Unable to write output file {path:?}"))?;

		tracing::debug!(?path, append, "Wrote report");
		Ok(())
	}
}

/// Writes and flushes `report` to `writer`
fn write_report(report: &Report, format: Format, writer: &mut impl Write) -> Result<(), anyhow::Error> {
	report.write_to(format, writer).context(ErrorKind::FileAccess)?;
	writer
		.flush()
		.context(ErrorKind::FileAccess)
		.context("Unable to flush report")
}

#[cfg(test)]
mod tests {
	use {super::*, std::path::Path};

	fn report() -> Report {
		let mut report = Report::new("Test");
		report.add_section(Section::new("Counts").with("writes", 3_u64).with("rate", 0.5));
		report
	}

	fn temp_path(name: &str) -> PathBuf {
		std::env::temp_dir().join(format!("nvsched-report-{}-{name}", std::process::id()))
	}

	/// Writer that always fails
	struct BrokenWriter;

	impl Write for BrokenWriter {
		fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
			Err(io::Error::from(io::ErrorKind::BrokenPipe))
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	fn strings(args: &[&str]) -> Vec<String> {
		args.iter().map(|&arg| arg.to_owned()).collect()
	}

	#[test]
	fn text_rendering_is_aligned() {
		assert_eq!(report().to_string(), "== Test ==\n\n[Counts]\n  writes  3\n  rate    0.5000\n");
	}

	#[test]
	fn write_failures_are_file_access_errors() {
		for format in [Format::Text, Format::Json] {
			let err = write_report(&report(), format, &mut BrokenWriter).unwrap_err();
			assert_eq!(ErrorKind::of(&err), Some(ErrorKind::FileAccess), "{err:?}");
		}
	}

	#[test]
	fn json_rendering() {
		let mut output = vec![];
		report().write_to(Format::Json, &mut output).unwrap();
		let json = serde_json::from_slice::<serde_json::Value>(&output).unwrap();
		assert_eq!(json["sections"][0]["metrics"][0]["value"], 3);
		assert_eq!(json["sections"][0]["metrics"][1]["name"], "rate");
	}

	#[test]
	fn positional_output_shapes() {
		assert_eq!(OutputDest::from_positional(&[]).unwrap(), OutputDest::Stdout);
		assert_eq!(
			OutputDest::from_positional(&strings(&["out.txt"])).unwrap(),
			OutputDest::Overwrite("out.txt".into())
		);
		assert_eq!(
			OutputDest::from_positional(&strings(&["Append", "out.txt"])).unwrap(),
			OutputDest::Append("out.txt".into())
		);
		assert_eq!(
			OutputDest::from_positional(&strings(&["append", "out.txt"])).unwrap(),
			OutputDest::Overwrite("out.txt".into())
		);

		let err = OutputDest::from_positional(&strings(&["a", "b", "c"])).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::Argument));
	}

	#[test]
	fn append_keeps_and_overwrite_truncates() {
		let path = self::temp_path("append");
		fs::write(&path, "previous\n").unwrap();

		OutputDest::Append(path.clone()).emit(&report(), Format::Text).unwrap();
		let appended = fs::read_to_string(&path).unwrap();
		assert!(appended.starts_with("previous\n== Test =="), "{appended}");

		OutputDest::Overwrite(path.clone()).emit(&report(), Format::Text).unwrap();
		let overwritten = fs::read_to_string(&path).unwrap();
		assert_eq!(overwritten, report().to_string());

		fs::remove_file(&path).unwrap();
	}

	#[test]
	fn unwritable_output_is_a_file_access_error() {
		let path = Path::new("/nonexistent-nvsched-dir/out.txt").to_path_buf();
		let err = OutputDest::Overwrite(path).emit(&report(), Format::Text).unwrap_err();
		assert_eq!(ErrorKind::of(&err), Some(ErrorKind::FileAccess));
	}
}
