//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG` (default `info`), and optionally
//! to a file, filtered by `RUST_LOG_FILE` (default `debug`).

// Imports
use {
	std::{fs, path::Path, sync::Mutex},
	tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Layer},
};

/// Pre-initialization logging.
///
/// Messages logged here are buffered until [`init`] is called, at which
/// point they're emitted through the real subscriber.
pub mod pre_init {
	use super::*;

	/// Buffered messages
	static MESSAGES: Mutex<Vec<String>> = Mutex::new(vec![]);

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		// Note: A poisoned lock only means another thread panicked while
		//       pushing, the messages themselves are still valid.
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		messages.push(msg.into());
	}

	/// Takes all buffered messages
	pub(super) fn take() -> Vec<String> {
		let mut messages = MESSAGES.lock().unwrap_or_else(|err| err.into_inner());
		std::mem::take(&mut *messages)
	}
}

/// Initializes the logger.
///
/// If `log_file` is given, verbose logs are additionally written to it,
/// appending when `log_file_append` is set.
///
/// Calling this more than once only replays the buffered messages.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	// Create the stderr layer
	let stderr_layer = fmt::layer()
		.with_writer(std::io::stderr)
		.with_filter(self::env_filter("RUST_LOG", LevelFilter::INFO));

	// Then the file layer, if any
	let mut file_open_err = None;
	let file_layer = log_file.and_then(|log_file| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(log_file);

		match file {
			Ok(file) => Some(
				fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(self::env_filter("RUST_LOG_FILE", LevelFilter::DEBUG)),
			),
			Err(err) => {
				file_open_err = Some(format!("Unable to open log file {log_file:?}: {err}"));
				None
			},
		}
	});

	if let Err(err) = tracing_subscriber::registry()
		.with(stderr_layer)
		.with(file_layer)
		.try_init()
	{
		pre_init::debug(format!("Logger was already initialized: {err}"));
	}

	if let Some(err) = file_open_err {
		tracing::warn!("{err}");
	}

	// Finally replay everything logged before initialization
	for msg in pre_init::take() {
		tracing::debug!("{msg}");
	}
}

/// Creates an env filter from `var`, defaulting to `default`
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
	EnvFilter::builder()
		.with_default_directive(default.into())
		.with_env_var(var)
		.from_env_lossy()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pre_init_messages_are_taken_once() {
		pre_init::debug("first");
		pre_init::debug(String::from("second"));

		let messages = pre_init::take();
		assert!(messages.ends_with(&["first".to_owned(), "second".to_owned()]), "{messages:?}");
		assert!(pre_init::take().is_empty());
	}
}
