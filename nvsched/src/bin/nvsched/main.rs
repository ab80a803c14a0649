//! NV-DIMM scheduling log analyzer (`nvsched`)

// Modules
mod args;

// Imports
use {
	self::args::Args,
	anyhow::Context,
	clap::Parser,
	nvsched::{Config, ErrorKind, LogAnalyzer, Mode, PlaneRecord, WriteRecord},
	nvsched_util::logger,
	std::{fs, io, path::Path, process::ExitCode},
};

fn main() -> ExitCode {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	match self::run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			let kind = ErrorKind::of(&err);
			tracing::error!(?kind, "Analysis failed");
			eprintln!("Error: {err:?}");
			ExitCode::from(kind.map_or(1, ErrorKind::exit_code))
		},
	}
}

fn run(args: &Args) -> Result<(), anyhow::Error> {
	// Note: Both of these must be validated before touching any file.
	let mode = args.mode.parse::<Mode>().context("Unable to parse mode")?;
	let output = args.output_dest().context("Unable to resolve output")?;
	tracing::debug!(%mode, ?output, "Resolved arguments");

	// Read the config file
	let config = match &args.config_file {
		Some(config_file) => Config::load(config_file)?,
		None => Config::default(),
	};
	tracing::trace!(target: "nvsched::config", ?config, "Loaded config");
	let analyzer = LogAnalyzer::new(config);

	// Parse both logs
	let write_records = {
		let reader = self::open_log(&args.write_log).context("Unable to open write log")?;
		analyzer.parse::<WriteRecord>(reader).context("Unable to parse write log")?
	};
	let plane_records = {
		let reader = self::open_log(&args.plane_log).context("Unable to open plane log")?;
		analyzer.parse::<PlaneRecord>(reader).context("Unable to parse plane log")?
	};
	tracing::info!(writes = write_records.len(), planes = plane_records.len(), "Parsed logs");

	// Then analyze and write the report
	let report = analyzer
		.aggregate(&write_records, &plane_records, mode)
		.context("Unable to analyze logs")?;
	analyzer
		.emit(&report, &output, args.format)
		.context("Unable to emit report")?;

	Ok(())
}

/// Opens a log for buffered reading
fn open_log(path: &Path) -> Result<io::BufReader<fs::File>, anyhow::Error> {
	let file = fs::File::open(path)
		.context(ErrorKind::FileAccess)
		.with_context(|| format!("Unable to open {path:?}"))?;

	Ok(io::BufReader::new(file))
}
