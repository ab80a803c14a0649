//! NV-DIMM scheduling log analyzer (`nvsched`)
//!
//! Parses the write and plane logs of an NV-DIMM simulator run and
//! summarizes its scheduling behavior.

// Modules
pub mod analysis;
pub mod config;
pub mod error;
pub mod report;
pub mod sim_log;

// Exports
pub use self::{
	analysis::{LogAnalyzer, Mode},
	config::Config,
	error::ErrorKind,
	report::{Format, OutputDest, Report},
	sim_log::{PlaneRecord, WriteRecord},
};
