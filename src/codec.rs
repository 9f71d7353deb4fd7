//! Encoding and decoding frames for any [`Dialect`].
//!
//! * [`encode`] turns a [`Command`] and an address into a request frame.
//! * [`decode`] classifies the raw bytes read back from an instrument as a
//!   [`Reply`].
//! * [`parse_request`] reverses [`encode`], which is what a simulated
//!   instrument needs to understand what it was asked.

use crate::{
	catalog::ErrorCatalog,
	checksum,
	command::Command,
	dialect::{Dialect, ReplyFormat},
	error::*,
};
use std::io::Write as _;

/// A reply, classified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reply {
	/// The instrument accepted the command. Contains the payload, which is
	/// empty if the command had no result.
	Ack(String),
	/// The instrument rejected the command. Contains the error code.
	Nak(String),
	/// No bytes were captured within the settle window.
	Absent,
	/// Bytes were captured but they have no recognizable structure.
	Malformed(Vec<u8>),
}

impl Reply {
	/// Check that the reply is an acknowledgement and return its payload.
	///
	/// Error codes are translated into messages with `catalog`. A code that is
	/// not in the catalog is reported as [`ReplyError::UnknownErrorCode`].
	pub fn check(self, catalog: &ErrorCatalog) -> Result<String, ReplyError> {
		match self {
			Reply::Ack(payload) => Ok(payload),
			Reply::Nak(code) => match catalog.lookup(&code) {
				Ok(message) => Err(DeviceError::new(&code, message).into()),
				Err(err) => Err(err.into()),
			},
			Reply::Absent => Err(DeviceAbsentError::new().into()),
			Reply::Malformed(raw) => Err(MalformedReplyError::new(raw).into()),
		}
	}

	/// Whether the reply is [`Reply::Absent`].
	pub fn is_absent(&self) -> bool {
		matches!(self, Reply::Absent)
	}
}

impl std::fmt::Display for Reply {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Reply::Ack(payload) => write!(f, "ACK {payload:?}"),
			Reply::Nak(code) => write!(f, "NAK {code:?}"),
			Reply::Absent => write!(f, "absent"),
			Reply::Malformed(raw) => write!(f, "malformed {:?}", String::from_utf8_lossy(raw)),
		}
	}
}

/// A decoded request frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
	/// The addressed instrument, or `None` if the dialect's address is implicit.
	pub address: Option<u16>,
	/// The command body, without markers, address or checksum.
	pub body: String,
}

impl Request {
	/// Recover the semantic command from the body.
	///
	/// Returns `None` if the body does not start with one of the dialect's
	/// mnemonics or its argument does not match the command.
	pub fn command(&self, dialect: &Dialect) -> Option<Command> {
		let (kind, rest) = dialect.match_mnemonic(&self.body)?;
		let argument = if kind.takes_argument() {
			Some(rest.trim().parse::<f64>().ok()?)
		} else if rest.is_empty() {
			None
		} else {
			return None;
		};
		Command::from_parts(kind, argument)
	}
}

/// Write the address field into `buf`.
fn write_address(buf: &mut Vec<u8>, address: u16, dialect: &Dialect) -> Result<(), Error> {
	match dialect.max_address() {
		None => Ok(()),
		Some(max) if address <= max => {
			write!(buf, "{:0width$}", address, width = dialect.address_width)?;
			Ok(())
		}
		Some(_) => Err(InvalidAddressError::new(address, dialect.address_width).into()),
	}
}

/// Encode `command`, addressed to `address`, into a request frame.
///
/// The address is ignored if the dialect's address is implicit.
pub fn encode(command: &Command, address: u16, dialect: &Dialect) -> Result<Vec<u8>, Error> {
	let mut frame = Vec::with_capacity(32);
	frame.extend_from_slice(dialect.preamble.as_bytes());
	let hashed_start = frame.len();
	frame.extend_from_slice(dialect.start_marker.as_bytes());
	write_address(&mut frame, address, dialect)?;
	command.write_body_into(dialect, &mut frame)?;
	frame.extend_from_slice(dialect.terminator.as_bytes());
	let rendered = checksum::render((dialect.checksum)(&frame[hashed_start..]));
	frame.extend_from_slice(&rendered);
	frame.extend_from_slice(dialect.end_marker.as_bytes());
	Ok(frame)
}

/// Find the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	if needle.is_empty() {
		return Some(0);
	}
	haystack
		.windows(needle.len())
		.position(|window| window == needle)
}

/// The trimmed text between `start` and the last `terminator` after it.
fn delimited_text(raw: &[u8], start: usize, terminator: u8) -> Option<String> {
	let end = start + raw[start..].iter().rposition(|b| *b == terminator)?;
	Some(String::from_utf8_lossy(&raw[start..end]).trim().to_string())
}

/// Classify the raw bytes read back from an instrument.
///
/// * Empty input is [`Reply::Absent`].
/// * For [`ReplyFormat::Delimited`] dialects, a failure marker takes
///   precedence over a success marker. Input with neither marker, or with a
///   marker but no terminator after it, is [`Reply::Malformed`].
/// * For [`ReplyFormat::Positional`] dialects, the header and trailer are
///   stripped and the remaining hexadecimal value is returned in decimal.
///   Input too short to hold a value, or whose value is not hexadecimal, is
///   [`Reply::Malformed`].
pub fn decode(raw: &[u8], dialect: &Dialect) -> Reply {
	if raw.is_empty() {
		return Reply::Absent;
	}
	match dialect.reply {
		ReplyFormat::Delimited {
			ack,
			nak,
			terminator,
		} => {
			if let Some(pos) = find(raw, nak.as_bytes()) {
				match delimited_text(raw, pos + nak.len(), terminator) {
					Some(code) => Reply::Nak(code),
					None => Reply::Malformed(raw.to_vec()),
				}
			} else if let Some(pos) = find(raw, ack.as_bytes()) {
				match delimited_text(raw, pos + ack.len(), terminator) {
					Some(payload) => Reply::Ack(payload),
					None => Reply::Malformed(raw.to_vec()),
				}
			} else {
				Reply::Malformed(raw.to_vec())
			}
		}
		ReplyFormat::Positional { header, trailer } => {
			if raw.len() <= header + trailer {
				return Reply::Malformed(raw.to_vec());
			}
			let value = std::str::from_utf8(&raw[header..raw.len() - trailer])
				.ok()
				.and_then(|hex| u64::from_str_radix(hex, 16).ok());
			match value {
				Some(value) => Reply::Ack(value.to_string()),
				None => Reply::Malformed(raw.to_vec()),
			}
		}
	}
}

/// Parse a request frame produced by [`encode`] for the same dialect.
///
/// The markers, address digits and checksum are all verified.
pub fn parse_request(frame: &[u8], dialect: &Dialect) -> Result<Request, MalformedRequestError> {
	let malformed = || MalformedRequestError::new(frame);

	let rest = frame
		.strip_prefix(dialect.preamble.as_bytes())
		.ok_or_else(malformed)?;
	let rest = rest
		.strip_suffix(dialect.end_marker.as_bytes())
		.ok_or_else(malformed)?;
	if rest.len() < 2 {
		return Err(malformed());
	}
	let (hashed, rendered) = rest.split_at(rest.len() - 2);
	if !checksum::verify(dialect.checksum, hashed, rendered) {
		return Err(malformed());
	}

	let inner = hashed
		.strip_prefix(dialect.start_marker.as_bytes())
		.and_then(|inner| inner.strip_suffix(dialect.terminator.as_bytes()))
		.ok_or_else(malformed)?;
	if inner.len() < dialect.address_width {
		return Err(malformed());
	}
	let (digits, body) = inner.split_at(dialect.address_width);
	let address = if dialect.address_width == 0 {
		None
	} else if digits.iter().all(u8::is_ascii_digit) {
		let digits = std::str::from_utf8(digits).map_err(|_| malformed())?;
		Some(digits.parse::<u16>().map_err(|_| malformed())?)
	} else {
		return Err(malformed());
	};
	let body = std::str::from_utf8(body).map_err(|_| malformed())?;
	Ok(Request {
		address,
		body: body.to_string(),
	})
}

/// The content of a reply built by [`encode_reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyBody<'a> {
	/// An acknowledgement with a text payload (delimited dialects).
	Ack(&'a str),
	/// A rejection with an error code (delimited dialects).
	Nak(&'a str),
	/// A numeric value (positional dialects).
	Value(u64),
}

/// Build the reply an instrument of `dialect` would send to `request`.
///
/// Delimited replies are framed like requests, with the success or failure
/// marker in place of the command. Positional replies echo the start marker,
/// address and the first byte of the request body, followed by the value in
/// uppercase hexadecimal. Returns `None` if `body` does not fit the dialect's
/// reply format.
pub fn encode_reply(request: &Request, body: ReplyBody<'_>, dialect: &Dialect) -> Option<Vec<u8>> {
	let mut frame = Vec::with_capacity(32);
	frame.extend_from_slice(dialect.preamble.as_bytes());
	let hashed_start = frame.len();
	frame.extend_from_slice(dialect.start_marker.as_bytes());
	if let Some(address) = request.address {
		write_address(&mut frame, address, dialect).ok()?;
	}
	match (dialect.reply, body) {
		(ReplyFormat::Delimited { ack, terminator, .. }, ReplyBody::Ack(payload)) => {
			frame.extend_from_slice(ack.as_bytes());
			frame.extend_from_slice(payload.as_bytes());
			frame.push(terminator);
		}
		(ReplyFormat::Delimited { nak, terminator, .. }, ReplyBody::Nak(code)) => {
			frame.extend_from_slice(nak.as_bytes());
			frame.extend_from_slice(code.as_bytes());
			frame.push(terminator);
		}
		(ReplyFormat::Positional { .. }, ReplyBody::Value(value)) => {
			frame.extend_from_slice(request.body.as_bytes().get(..1)?);
			write!(frame, "{value:X}").ok()?;
		}
		_ => return None,
	}
	let rendered = checksum::render((dialect.checksum)(&frame[hashed_start..]));
	frame.extend_from_slice(&rendered);
	frame.extend_from_slice(dialect.end_marker.as_bytes());
	Some(frame)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn encode_mks() {
		let frame = encode(&Command::ReadFullScale, 1, &Dialect::MKS).unwrap();
		assert_eq!(frame, b"@@@001FS?;E4");
		let frame = encode(&Command::ReadFullScale, 230, &Dialect::MKS).unwrap();
		assert_eq!(frame, b"@@@230FS?;E8");
		let frame = encode(&Command::ReadPressure, 250, &Dialect::MKS).unwrap();
		assert_eq!(frame, b"@@@250PX?;F9");
		let frame = encode(&Command::SetFlow(42.5), 230, &Dialect::MKS).unwrap();
		assert!(frame.starts_with(b"@@@230SX!42.500000;"));
		assert_eq!(frame.len(), b"@@@230SX!42.500000;".len() + 2);
	}

	#[test]
	fn encode_ultraflex() {
		let frame = encode(&Command::ReadCurrent, 3, &Dialect::ULTRAFLEX).unwrap();
		assert_eq!(frame, b"S3i11K");
		let frame = encode(&Command::Raw("E".into()), 3, &Dialect::ULTRAFLEX).unwrap();
		// 'S' + '3' + 'E' = 203, and -203 mod 256 = 53
		assert_eq!(frame, b"S3E35K");
	}

	#[test]
	fn encode_implicit_address() {
		let dialect = Dialect {
			address_width: 0,
			..Dialect::ULTRAFLEX
		};
		let frame = encode(&Command::Raw("3i".into()), 7, &dialect).unwrap();
		assert_eq!(frame, b"S3i11K");
	}

	#[test]
	fn encode_errors() {
		let err = encode(&Command::ReadFlow, 1000, &Dialect::MKS).unwrap_err();
		assert!(matches!(err, Error::InvalidAddress(e) if e.address() == 1000));
		let err = encode(&Command::ReadFlow, 3, &Dialect::ULTRAFLEX).unwrap_err();
		assert!(matches!(err, Error::UnsupportedCommand(_)));
	}

	#[test]
	fn decode_delimited() {
		let mks = &Dialect::MKS;
		assert_eq!(decode(b"ACK12.50;", mks), Reply::Ack("12.50".into()));
		assert_eq!(decode(b"@@@000ACK500;4B", mks), Reply::Ack("500".into()));
		assert_eq!(decode(b"ACK;", mks), Reply::Ack(String::new()));
		assert_eq!(decode(b"NAK15;", mks), Reply::Nak("15".into()));
		assert_eq!(decode(b"@@@230NAK 15 ;FF", mks), Reply::Nak("15".into()));
		// A failure marker wins over a success marker.
		assert_eq!(decode(b"ACK1;NAK10;", mks), Reply::Nak("10".into()));
		assert_eq!(decode(b"", mks), Reply::Absent);
		assert_eq!(decode(b"garbage", mks), Reply::Malformed(b"garbage".to_vec()));
		assert_eq!(decode(b"ACK12.5", mks), Reply::Malformed(b"ACK12.5".to_vec()));
	}

	#[test]
	fn decode_positional() {
		let ultraflex = &Dialect::ULTRAFLEX;
		assert_eq!(decode(b"S3iFF00K", ultraflex), Reply::Ack("255".into()));
		assert_eq!(decode(b"S3f1388A1K", ultraflex), Reply::Ack("5000".into()));
		assert_eq!(decode(b"", ultraflex), Reply::Absent);
		assert_eq!(decode(b"S3i00K", ultraflex), Reply::Malformed(b"S3i00K".to_vec()));
		assert_eq!(decode(b"S3iXY00K", ultraflex), Reply::Malformed(b"S3iXY00K".to_vec()));
	}

	#[test]
	fn check_replies() {
		let catalog = &ErrorCatalog::MKS;
		assert_eq!(decode(b"ACK12.50;", &Dialect::MKS).check(catalog), Ok("12.50".into()));

		let err = decode(b"NAK15;", &Dialect::MKS).check(catalog).unwrap_err();
		match err {
			ReplyError::Device(e) => {
				assert_eq!(e.code(), "15");
				assert_eq!(e.message(), "Invalid gas");
			}
			e => panic!("unexpected error {e:?}"),
		}

		let err = decode(b"NAK42;", &Dialect::MKS).check(catalog).unwrap_err();
		assert!(matches!(err, ReplyError::UnknownErrorCode(e) if e.code() == "42"));

		let err = decode(b"", &Dialect::MKS).check(catalog).unwrap_err();
		assert!(err.is_absent());

		let err = decode(b"??", &Dialect::MKS).check(catalog).unwrap_err();
		assert!(matches!(err, ReplyError::Malformed(e) if e.as_bytes() == b"??"));
	}

	#[test]
	fn request_round_trip() {
		let cases = [
			(Command::ReadFullScale, 230, &Dialect::MKS),
			(Command::ReadUnit, 0, &Dialect::MKS),
			(Command::ReadSerialNumber, 999, &Dialect::MKS),
			(Command::SetFlow(42.5), 231, &Dialect::MKS),
			(Command::ReadFlow, 232, &Dialect::MKS),
			(Command::ReadPressure, 250, &Dialect::MKS),
			(Command::ReadCurrent, 3, &Dialect::ULTRAFLEX),
			(Command::ReadFrequency, 9, &Dialect::ULTRAFLEX),
		];
		for (command, address, dialect) in cases {
			let frame = encode(&command, address, dialect).unwrap();
			let request = parse_request(&frame, dialect).unwrap();
			assert_eq!(request.address, Some(address));
			assert_eq!(request.body, command.body(dialect).unwrap());
			assert_eq!(request.command(dialect), Some(command));
		}
	}

	#[test]
	fn parse_request_rejects_corruption() {
		let mks = &Dialect::MKS;
		assert!(parse_request(b"@@@230FS?;E9", mks).is_err()); // bad checksum
		assert!(parse_request(b"@@230FS?;E8", mks).is_err()); // missing marker
		assert!(parse_request(b"@@@2x0FS?;E8", mks).is_err());
		assert!(parse_request(b"S3i11", &Dialect::ULTRAFLEX).is_err());
		assert!(parse_request(b"", &Dialect::ULTRAFLEX).is_err());
	}

	#[test]
	fn reply_round_trip() {
		let mks = &Dialect::MKS;
		let request = parse_request(b"@@@230FS?;E8", mks).unwrap();
		let frame = encode_reply(&request, ReplyBody::Ack("500"), mks).unwrap();
		assert!(frame.starts_with(b"@@@230ACK500;"));
		assert_eq!(decode(&frame, mks), Reply::Ack("500".into()));
		let frame = encode_reply(&request, ReplyBody::Nak("15"), mks).unwrap();
		assert_eq!(decode(&frame, mks), Reply::Nak("15".into()));
		assert_eq!(encode_reply(&request, ReplyBody::Value(1), mks), None);

		let ultraflex = &Dialect::ULTRAFLEX;
		let request = parse_request(b"S3i11K", ultraflex).unwrap();
		let frame = encode_reply(&request, ReplyBody::Value(0xFF), ultraflex).unwrap();
		assert!(frame.starts_with(b"S3iFF"));
		assert!(frame.ends_with(b"K"));
		assert_eq!(decode(&frame, ultraflex), Reply::Ack("255".into()));
	}
}
