//! Utilities shared by the `nvsched` tools

// Modules
pub mod duration;
pub mod logger;

// Exports
pub use duration::SimDuration;

// Imports
use std::{cell::RefCell, fmt, str::FromStr};

/// Extension trait for iterators over whitespace-separated fields
#[extend::ext(name = NextField)]
pub impl<'a, I: Iterator<Item = &'a str>> I {
	/// Parses the next field as `T`.
	///
	/// Returns `Err` describing `name` if the field is missing or doesn't parse.
	fn next_field<T: FromStr>(&mut self, name: &str) -> Result<T, FieldError> {
		let field = self.next().ok_or_else(|| FieldError::Missing(name.to_owned()))?;
		field.parse().map_err(|_| FieldError::Invalid {
			name:  name.to_owned(),
			value: field.to_owned(),
		})
	}
}

/// Error for [`NextField::next_field`]
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum FieldError {
	/// Field was missing
	Missing(String),

	/// Field didn't parse
	Invalid { name: String, value: String },
}

impl fmt::Display for FieldError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Missing(name) => write!(f, "Missing field `{name}`"),
			Self::Invalid { name, value } => write!(f, "Invalid value {value:?} for field `{name}`"),
		}
	}
}

impl std::error::Error for FieldError {}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}


impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}
