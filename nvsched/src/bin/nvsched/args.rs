//! Arguments

// Imports
use {
	nvsched::{ErrorKind, Format, OutputDest},
	std::path::PathBuf,
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
#[clap(about = "Analyzes the write and plane logs of an NV-DIMM simulator run")]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Config file
	///
	/// Json file with the array geometry and timing.
	/// Defaults to the simulator's built-in configuration.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Report format
	#[clap(long = "format", value_enum, default_value_t = Format::Text)]
	pub format: Format,

	/// Output file
	///
	/// If not specified, the report is written to stdout.
	#[clap(short = 'o', long = "output")]
	pub output_file: Option<PathBuf>,

	/// Whether to append to the output file instead of overwriting it
	#[clap(long = "append", requires = "output_file")]
	pub append: bool,

	/// Write log
	pub write_log: PathBuf,

	/// Plane log
	pub plane_log: PathBuf,

	/// Mode (`traffic` or `predictor`)
	pub mode: String,

	/// Output, as `[Append|Overwrite] <output_path>`
	#[clap(num_args = 0..=2)]
	pub output: Vec<String>,
}

impl Args {
	/// Resolves the output destination
	pub fn output_dest(&self) -> Result<OutputDest, anyhow::Error> {
		match (&self.output_file, self.output.is_empty()) {
			(None, _) => OutputDest::from_positional(&self.output),
			(Some(path), true) => match self.append {
				true => Ok(OutputDest::Append(path.clone())),
				false => Ok(OutputDest::Overwrite(path.clone())),
			},
			(Some(_), false) => Err(anyhow::Error::new(ErrorKind::Argument)
				.context("Output given both with `--output` and positionally")),
		}
	}
}
