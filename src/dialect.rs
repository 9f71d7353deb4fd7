//! Declarative descriptions of instrument wire formats.
//!
//! A [`Dialect`] captures everything that differs between instrument families:
//! the markers around a frame, the width of the address field, the checksum
//! strategy, how commands are spelled, and how replies are laid out. The
//! [`codec`](crate::codec) consumes a dialect and is otherwise family-agnostic,
//! so supporting a new instrument family means adding a new `Dialect` value.
//!
//! A request frame is laid out as
//!
//! ```text
//! preamble | start_marker address body terminator | checksum | end_marker
//!          |<------------- checksummed ------------>|
//! ```

use crate::{
	catalog::ErrorCatalog,
	checksum::{self, ChecksumFn},
	command::CommandKind,
};
use std::time::Duration;

/// How replies are laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
	/// Replies carry explicit success and failure markers and a terminator.
	///
	/// The payload (or error code) is the text between the marker and the
	/// last terminator after it.
	Delimited {
		/// The success marker, e.g. `ACK`.
		ack: &'static str,
		/// The failure marker, e.g. `NAK`.
		nak: &'static str,
		/// The byte closing the payload, e.g. `;`.
		terminator: u8,
	},
	/// Replies are a fixed-width header, a hexadecimal payload and a
	/// fixed-width trailer.
	///
	/// The widths must match the frames produced for the same dialect.
	Positional {
		/// The number of leading bytes to strip (start marker and echo).
		header: usize,
		/// The number of trailing bytes to strip (checksum and end marker).
		trailer: usize,
	},
}

/// The wire format of one instrument family.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
	/// A short name for the family, used in logs and errors.
	pub name: &'static str,
	/// Bytes sent before the start marker. Not checksummed.
	pub preamble: &'static str,
	/// The start of the checksummed part of a frame.
	pub start_marker: &'static str,
	/// The number of zero-padded decimal digits of the address, or 0 if the
	/// address is implicit and omitted.
	pub address_width: usize,
	/// Bytes closing the command body. Checksummed.
	pub terminator: &'static str,
	/// Bytes sent after the checksum. Not checksummed.
	pub end_marker: &'static str,
	/// The checksum strategy.
	pub checksum: ChecksumFn,
	/// How each supported [`CommandKind`] is spelled.
	pub mnemonics: &'static [(CommandKind, &'static str)],
	/// The number of decimal places numeric arguments are written with.
	pub argument_precision: usize,
	/// How replies are laid out.
	pub reply: ReplyFormat,
	/// The delay between writing a request and reading its reply that is
	/// known to work for this family.
	pub settle_delay: Duration,
	/// The error codes the family reports.
	pub catalog: ErrorCatalog,
}

impl Dialect {
	/// MKS mass-flow and pressure controllers on an addressed RS-485 bus.
	///
	/// Requests look like `@@@230FS?;E8`: the `@@` preamble, the checksummed
	/// `@` start marker, a 3-digit address, the command, the `;` terminator and
	/// the additive checksum. Replies contain `ACK<payload>;` or `NAK<code>;`.
	pub const MKS: Dialect = Dialect {
		name: "MKS",
		preamble: "@@",
		start_marker: "@",
		address_width: 3,
		terminator: ";",
		end_marker: "",
		checksum: checksum::additive,
		mnemonics: &[
			(CommandKind::ReadFullScale, "FS?"),
			(CommandKind::ReadUnit, "U?"),
			(CommandKind::ReadSerialNumber, "SN?"),
			(CommandKind::SetFlow, "SX!"),
			(CommandKind::ReadFlow, "FX?"),
			(CommandKind::ReadPressure, "PX?"),
			(CommandKind::SetPressure, "SX!"),
		],
		argument_precision: 6,
		reply: ReplyFormat::Delimited {
			ack: "ACK",
			nak: "NAK",
			terminator: b';',
		},
		settle_delay: Duration::from_millis(100),
		catalog: ErrorCatalog::MKS,
	};

	/// Ultraflex induction heater power supplies.
	///
	/// Requests look like `S3i11K`: the checksummed `S` start marker, the
	/// single-digit unit number, the command, the subtractive checksum and the
	/// `K` end marker. Replies echo the first three bytes of the request,
	/// followed by a hexadecimal value, a checksum and `K`.
	pub const ULTRAFLEX: Dialect = Dialect {
		name: "Ultraflex",
		preamble: "",
		start_marker: "S",
		address_width: 1,
		terminator: "",
		end_marker: "K",
		checksum: checksum::subtractive,
		mnemonics: &[
			(CommandKind::ReadCurrent, "i"),
			(CommandKind::ReadFrequency, "f"),
		],
		argument_precision: 0,
		reply: ReplyFormat::Positional {
			header: 3,
			trailer: 3,
		},
		settle_delay: Duration::from_millis(200),
		catalog: ErrorCatalog::EMPTY,
	};

	/// The mnemonic for `kind`, if the dialect supports it.
	pub fn mnemonic(&self, kind: CommandKind) -> Option<&'static str> {
		self.mnemonics
			.iter()
			.find(|(known, _)| *known == kind)
			.map(|(_, mnemonic)| *mnemonic)
	}

	/// Find the command kind whose mnemonic starts `body`.
	///
	/// Returns the kind and the rest of the body. When several mnemonics match,
	/// the longest wins; when the same mnemonic is shared by several kinds (such
	/// as the MKS `SX!` set point), the first listed wins.
	pub fn match_mnemonic<'b>(&self, body: &'b str) -> Option<(CommandKind, &'b str)> {
		let mut best: Option<(CommandKind, &'static str)> = None;
		for &(kind, mnemonic) in self.mnemonics {
			if body.starts_with(mnemonic)
				&& best.map_or(true, |(_, current)| mnemonic.len() > current.len())
			{
				best = Some((kind, mnemonic));
			}
		}
		best.map(|(kind, mnemonic)| (kind, &body[mnemonic.len()..]))
	}

	/// The largest address that fits in the address field, or `None` if
	/// the address is implicit.
	pub fn max_address(&self) -> Option<u16> {
		match self.address_width {
			0 => None,
			width => Some(
				10u32
					.checked_pow(width as u32)
					.map_or(u16::MAX, |limit| {
						u16::try_from(limit - 1).unwrap_or(u16::MAX)
					}),
			),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_mnemonics() {
		assert_eq!(Dialect::MKS.mnemonic(CommandKind::ReadFlow), Some("FX?"));
		assert_eq!(Dialect::MKS.mnemonic(CommandKind::ReadCurrent), None);
		assert_eq!(Dialect::ULTRAFLEX.mnemonic(CommandKind::ReadCurrent), Some("i"));
	}

	#[test]
	fn test_match_mnemonic() {
		assert_eq!(
			Dialect::MKS.match_mnemonic("SX!42.500000"),
			Some((CommandKind::SetFlow, "42.500000"))
		);
		assert_eq!(
			Dialect::MKS.match_mnemonic("SN?"),
			Some((CommandKind::ReadSerialNumber, ""))
		);
		assert_eq!(Dialect::MKS.match_mnemonic("XX?"), None);
		assert_eq!(
			Dialect::ULTRAFLEX.match_mnemonic("f"),
			Some((CommandKind::ReadFrequency, ""))
		);
	}

	#[test]
	fn test_max_address() {
		assert_eq!(Dialect::MKS.max_address(), Some(999));
		assert_eq!(Dialect::ULTRAFLEX.max_address(), Some(9));
		let implicit = Dialect {
			address_width: 0,
			..Dialect::ULTRAFLEX
		};
		assert_eq!(implicit.max_address(), None);
	}
}
