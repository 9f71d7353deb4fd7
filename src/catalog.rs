//! Device error code catalogs.

use crate::error::UnknownErrorCodeError;

/// An immutable map from the error codes an instrument family reports to
/// human-readable messages.
///
/// Catalogs are `'static` values scoped to a [`Dialect`](crate::dialect::Dialect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCatalog {
	entries: &'static [(&'static str, &'static str)],
}

impl ErrorCatalog {
	/// A catalog with no entries. Every code is unknown.
	pub const EMPTY: ErrorCatalog = ErrorCatalog::new(&[]);

	/// The error codes documented for MKS mass-flow and pressure controllers.
	pub const MKS: ErrorCatalog = ErrorCatalog::new(&[
		("01", "Checksum error"),
		("10", "Syntax error"),
		("11", "Data length error"),
		("12", "Invalid data"),
		("13", "Invalid operating mode"),
		("14", "Invalid action"),
		("15", "Invalid gas"),
		("16", "Invalid control mode"),
		("17", "Invalid command"),
		("24", "Calibration error"),
		("25", "Flow too large"),
		("27", "Too many gases in gas table"),
		("28", "Flow cal error; valve not open"),
		("98", "Internal device error"),
		("99", "Internal device error"),
	]);

	/// Create a catalog from `(code, message)` pairs.
	pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
		ErrorCatalog { entries }
	}

	/// Look up the message for `code`.
	///
	/// Codes that are not in the catalog are reported as an error rather than
	/// mapped to a generic message.
	pub fn lookup(&self, code: &str) -> Result<&'static str, UnknownErrorCodeError> {
		self.entries
			.iter()
			.find(|(known, _)| *known == code)
			.map(|(_, message)| *message)
			.ok_or_else(|| UnknownErrorCodeError::new(code))
	}

	/// The number of codes in the catalog.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the catalog has no codes.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn lookup_known_codes() {
		assert_eq!(ErrorCatalog::MKS.lookup("15"), Ok("Invalid gas"));
		assert_eq!(ErrorCatalog::MKS.lookup("01"), Ok("Checksum error"));
		assert_eq!(ErrorCatalog::MKS.lookup("99"), Ok("Internal device error"));
		assert_eq!(ErrorCatalog::MKS.len(), 15);
	}

	#[test]
	fn lookup_unknown_codes() {
		let err = ErrorCatalog::MKS.lookup("42").unwrap_err();
		assert_eq!(err.code(), "42");
		// Codes are matched exactly, without normalizing zero padding.
		assert!(ErrorCatalog::MKS.lookup("1").is_err());
		assert!(ErrorCatalog::EMPTY.lookup("15").is_err());
		assert!(ErrorCatalog::EMPTY.is_empty());
	}
}
