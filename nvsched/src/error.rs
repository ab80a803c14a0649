//! Error kinds

// Imports
use std::fmt;

/// Kind of a terminal error.
///
/// Attached to errors as context, so the kind of any error produced by this
/// crate can be recovered with [`ErrorKind::of`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ErrorKind {
	/// Bad command line arguments or configuration
	Argument,

	/// A file couldn't be opened, read or written
	FileAccess,

	/// A log line didn't match its expected layout
	Parse,

	/// Unknown run mode
	InvalidMode,
}

impl ErrorKind {
	/// Returns the outermost kind attached to `err`, if any
	pub fn of(err: &anyhow::Error) -> Option<Self> {
		err.downcast_ref::<Self>().copied()
	}

	/// Returns the process exit code for this kind
	pub const fn exit_code(self) -> u8 {
		match self {
			Self::Argument => 2,
			Self::FileAccess => 3,
			Self::Parse => 4,
			Self::InvalidMode => 5,
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let msg = match self {
			Self::Argument => "Invalid arguments",
			Self::FileAccess => "File access failed",
			Self::Parse => "Malformed log input",
			Self::InvalidMode => "Invalid mode",
		};

		f.write_str(msg)
	}
}

impl std::error::Error for ErrorKind {}
