//! A deterministic, in-memory backend that stands in for real instruments.
//!
//! Every frame written to a [`Simulated`] backend is recorded and handed to a
//! [`Responder`], whose reply is buffered for reading. Frames are delimited by
//! calls to `flush`, which is how a [`Transport`](crate::transport::Transport)
//! ends every request.
//!
//! ```
//! use gasline::backend::simulated::{MksBus, MksInstrument};
//! use gasline::transport::OpenOptions;
//!
//! let bus = MksBus::new().with_instrument(230, MksInstrument::new(100.0, "SCCM", "1234"));
//! let transport = OpenOptions::new().open_simulated(bus)?;
//! # let _ = transport;
//! # Ok::<(), gasline::error::Error>(())
//! ```

use super::Backend;
use crate::{
	codec::{self, ReplyBody},
	command::Command,
	dialect::Dialect,
};
use std::{
	collections::{BTreeMap, VecDeque},
	io,
	time::Duration,
};

/// Produces the reply to a request frame written to a [`Simulated`] backend.
///
/// An empty reply means the instrument stays silent. Closures of type
/// `FnMut(&[u8]) -> Vec<u8>` are responders too.
pub trait Responder: Send {
	/// Reply to `frame`.
	fn respond(&mut self, frame: &[u8]) -> Vec<u8>;
}

impl<F> Responder for F
where
	F: FnMut(&[u8]) -> Vec<u8> + Send,
{
	fn respond(&mut self, frame: &[u8]) -> Vec<u8> {
		(self)(frame)
	}
}

/// An in-memory backend driven by a [`Responder`].
///
/// Specific errors can be inserted for the next call to `read` or `write`.
pub struct Simulated {
	/// Produces replies to written frames.
	responder: Box<dyn Responder>,
	/// Bytes written since the last flush.
	pending: Vec<u8>,
	/// Every frame written so far, in order.
	written: Vec<Vec<u8>>,
	/// The bytes waiting to be read.
	buffer: VecDeque<u8>,
	/// The error to surface on the next read, if any. It is only surfaced once.
	read_error: Option<io::Error>,
	/// The error to surface on the next write, if any. It is only surfaced once.
	write_error: Option<io::Error>,
	/// The read timeout, which is ignored.
	ignored_read_timeout: Option<Duration>,
}

impl Simulated {
	/// Create a backend that answers with `responder`.
	pub fn new<R: Responder + 'static>(responder: R) -> Self {
		Simulated {
			responder: Box::new(responder),
			pending: Vec::new(),
			written: Vec::new(),
			buffer: VecDeque::new(),
			read_error: None,
			write_error: None,
			ignored_read_timeout: Some(Duration::ZERO),
		}
	}

	/// Create a backend that never answers, as if no instrument were connected.
	pub fn silent() -> Self {
		Simulated::new(Script::default())
	}

	/// Every frame written to the backend so far, in order.
	pub fn written(&self) -> &[Vec<u8>] {
		&self.written
	}

	/// Forget the frames written so far.
	pub fn clear_written(&mut self) {
		self.written.clear();
	}

	/// Append unsolicited data to the read buffer.
	///
	/// The data is not validated in any way.
	pub fn append_data<T: AsRef<[u8]>>(&mut self, bytes: T) {
		self.buffer.extend(bytes.as_ref());
	}

	/// Set the error for the next `read`, if any.
	pub fn read_error(&mut self, err: Option<io::Error>) {
		self.read_error = err;
	}

	/// Set the error for the next `write`, if any.
	pub fn write_error(&mut self, err: Option<io::Error>) {
		self.write_error = err;
	}
}

impl std::fmt::Debug for Simulated {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Simulated")
			.field("pending", &self.pending)
			.field("written", &self.written)
			.field("buffer", &self.buffer)
			.finish_non_exhaustive()
	}
}

impl io::Read for Simulated {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if let Some(err) = self.read_error.take() {
			return Err(err);
		}
		if self.buffer.is_empty() {
			// A real port would block until the read timeout elapses.
			return Err(io::Error::new(
				io::ErrorKind::TimedOut,
				"Simulated timeout error",
			));
		}
		let count = buf.len().min(self.buffer.len());
		for (dst, src) in buf.iter_mut().zip(self.buffer.drain(..count)) {
			*dst = src;
		}
		Ok(count)
	}
}

impl io::Write for Simulated {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if let Some(err) = self.write_error.take() {
			Err(err)
		} else {
			self.pending.extend_from_slice(buf);
			Ok(buf.len())
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		if self.pending.is_empty() {
			return Ok(());
		}
		let frame = std::mem::take(&mut self.pending);
		let reply = self.responder.respond(&frame);
		self.buffer.extend(reply);
		self.written.push(frame);
		Ok(())
	}
}

impl Backend for Simulated {
	fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<(), io::Error> {
		self.ignored_read_timeout = timeout;
		Ok(())
	}

	fn read_timeout(&self) -> Result<Option<Duration>, io::Error> {
		Ok(self.ignored_read_timeout)
	}

	fn bytes_to_read(&self) -> Result<usize, io::Error> {
		Ok(self.buffer.len())
	}

	fn name(&self) -> Option<String> {
		Some(format!("<simulated 0x{:x}>", self as *const Simulated as usize))
	}
}

/// Replies with a queue of canned replies, one per request, regardless of
/// what was asked.
///
/// Once the queue is exhausted the instrument stays silent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
	replies: VecDeque<Vec<u8>>,
}

impl Script {
	/// Create a script from a sequence of replies.
	pub fn new<I, R>(replies: I) -> Self
	where
		I: IntoIterator<Item = R>,
		R: AsRef<[u8]>,
	{
		Script {
			replies: replies
				.into_iter()
				.map(|reply| reply.as_ref().to_vec())
				.collect(),
		}
	}

	/// Queue another reply.
	pub fn push<R: AsRef<[u8]>>(&mut self, reply: R) {
		self.replies.push_back(reply.as_ref().to_vec());
	}

	/// The number of replies left.
	pub fn remaining(&self) -> usize {
		self.replies.len()
	}
}

impl Responder for Script {
	fn respond(&mut self, _frame: &[u8]) -> Vec<u8> {
		self.replies.pop_front().unwrap_or_default()
	}
}

/// The state of one emulated MKS controller.
#[derive(Debug, Clone, PartialEq)]
pub struct MksInstrument {
	/// The upper bound of the instrument's range.
	pub full_scale: f64,
	/// The engineering unit, e.g. `SCCM` or `Torr`.
	pub unit: String,
	/// The serial number.
	pub serial_number: String,
	/// The current set point. Reads report it as the measured value.
	pub setpoint: f64,
}

impl MksInstrument {
	/// Create an instrument with a zero set point.
	pub fn new(full_scale: f64, unit: &str, serial_number: &str) -> Self {
		MksInstrument {
			full_scale,
			unit: unit.to_string(),
			serial_number: serial_number.to_string(),
			setpoint: 0.0,
		}
	}
}

/// Emulates a bus of MKS flow and pressure controllers.
///
/// Requests to addresses with no instrument, and frames that do not parse,
/// go unanswered. Commands the instruments do not understand are rejected
/// with error code `17` and set points above full scale with `12`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MksBus {
	instruments: BTreeMap<u16, MksInstrument>,
}

impl MksBus {
	/// Create an empty bus.
	pub fn new() -> Self {
		MksBus::default()
	}

	/// Attach `instrument` at `address`, replacing any instrument already there.
	pub fn with_instrument(mut self, address: u16, instrument: MksInstrument) -> Self {
		self.instruments.insert(address, instrument);
		self
	}

	/// Get the instrument at `address`.
	pub fn instrument(&self, address: u16) -> Option<&MksInstrument> {
		self.instruments.get(&address)
	}
}

impl Responder for MksBus {
	fn respond(&mut self, frame: &[u8]) -> Vec<u8> {
		let dialect = &Dialect::MKS;
		let Ok(request) = codec::parse_request(frame, dialect) else {
			return Vec::new();
		};
		let Some(instrument) = request
			.address
			.and_then(|address| self.instruments.get_mut(&address))
		else {
			return Vec::new();
		};

		let payload = match request.command(dialect) {
			Some(Command::ReadFullScale) => Ok(instrument.full_scale.to_string()),
			Some(Command::ReadUnit) => Ok(instrument.unit.clone()),
			Some(Command::ReadSerialNumber) => Ok(instrument.serial_number.clone()),
			Some(Command::SetFlow(value) | Command::SetPressure(value)) => {
				if (0.0..=instrument.full_scale).contains(&value) {
					instrument.setpoint = value;
					Ok(format!("{value:.2}"))
				} else {
					Err("12")
				}
			}
			Some(Command::ReadFlow | Command::ReadPressure) => {
				Ok(format!("{:.2}", instrument.setpoint))
			}
			_ => Err("17"),
		};
		let body = match &payload {
			Ok(payload) => ReplyBody::Ack(payload),
			Err(code) => ReplyBody::Nak(code),
		};
		codec::encode_reply(&request, body, dialect).unwrap_or_default()
	}
}

/// Emulates one Ultraflex heater power supply.
///
/// Only requests addressed to the unit's number that read the current or the
/// frequency are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UltraflexUnit {
	unit: u16,
	/// The output current, in tenths of an ampere.
	current: u64,
	/// The output frequency, in hertz.
	frequency: u64,
}

impl UltraflexUnit {
	/// Create a supply with number `unit` and zeroed registers.
	pub fn new(unit: u16) -> Self {
		UltraflexUnit {
			unit,
			current: 0,
			frequency: 0,
		}
	}

	/// Set the raw current register, in tenths of an ampere.
	pub fn with_current(mut self, tenths_of_amperes: u64) -> Self {
		self.current = tenths_of_amperes;
		self
	}

	/// Set the frequency register, in hertz.
	pub fn with_frequency(mut self, hertz: u64) -> Self {
		self.frequency = hertz;
		self
	}
}

impl Responder for UltraflexUnit {
	fn respond(&mut self, frame: &[u8]) -> Vec<u8> {
		let dialect = &Dialect::ULTRAFLEX;
		let Ok(request) = codec::parse_request(frame, dialect) else {
			return Vec::new();
		};
		if request.address != Some(self.unit) {
			return Vec::new();
		}
		let value = match request.command(dialect) {
			Some(Command::ReadCurrent) => self.current,
			Some(Command::ReadFrequency) => self.frequency,
			_ => return Vec::new(),
		};
		codec::encode_reply(&request, ReplyBody::Value(value), dialect).unwrap_or_default()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::codec::{decode, encode, Reply};
	use std::io::{Read as _, Write as _};

	fn send(backend: &mut Simulated, frame: &[u8]) -> Vec<u8> {
		backend.write_all(frame).unwrap();
		backend.flush().unwrap();
		let mut reply = vec![0; backend.bytes_to_read().unwrap()];
		if !reply.is_empty() {
			backend.read_exact(&mut reply).unwrap();
		}
		reply
	}

	#[test]
	fn records_frames_per_flush() {
		let mut backend = Simulated::new(Script::new(["ACK1;"]));
		backend.write_all(b"@@@230").unwrap();
		backend.write_all(b"FS?;E8").unwrap();
		assert!(backend.written().is_empty());
		backend.flush().unwrap();
		assert_eq!(backend.written(), [b"@@@230FS?;E8".to_vec()]);
		assert_eq!(backend.bytes_to_read().unwrap(), 5);
		backend.clear_written();
		assert!(backend.written().is_empty());
	}

	#[test]
	fn script_runs_dry() {
		let mut backend = Simulated::new(Script::new(["ACK1;", "NAK15;"]));
		assert_eq!(send(&mut backend, b"a"), b"ACK1;");
		assert_eq!(send(&mut backend, b"b"), b"NAK15;");
		assert_eq!(send(&mut backend, b"c"), b"");
		assert_eq!(backend.written().len(), 3);

		let mut buf = [0; 4];
		let err = backend.read(&mut buf).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::TimedOut);
	}

	#[test]
	fn closures_respond() {
		let mut backend = Simulated::new(|frame: &[u8]| frame.to_ascii_lowercase());
		assert_eq!(send(&mut backend, b"ABC"), b"abc");
	}

	#[test]
	fn injected_errors_surface_once() {
		let mut backend = Simulated::silent();
		backend.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
		assert!(backend.write(b"x").is_err());
		assert!(backend.write(b"x").is_ok());

		backend.append_data(b"xy");
		backend.read_error(Some(io::Error::new(io::ErrorKind::Other, "noise")));
		let mut buf = [0; 2];
		assert!(backend.read(&mut buf).is_err());
		assert_eq!(backend.read(&mut buf).unwrap(), 2);
		assert_eq!(&buf, b"xy");
	}

	#[test]
	fn mks_bus() {
		let mks = &Dialect::MKS;
		let bus = MksBus::new().with_instrument(230, MksInstrument::new(100.0, "SCCM", "A1"));
		let mut backend = Simulated::new(bus);
		let mut ask = |command: Command, address: u16| {
			let reply = send(&mut backend, &encode(&command, address, mks).unwrap());
			decode(&reply, mks)
		};

		assert_eq!(ask(Command::ReadFullScale, 230), Reply::Ack("100".into()));
		assert_eq!(ask(Command::ReadUnit, 230), Reply::Ack("SCCM".into()));
		assert_eq!(ask(Command::ReadSerialNumber, 230), Reply::Ack("A1".into()));
		assert_eq!(ask(Command::SetFlow(42.5), 230), Reply::Ack("42.50".into()));
		assert_eq!(ask(Command::ReadFlow, 230), Reply::Ack("42.50".into()));
		assert_eq!(ask(Command::SetFlow(150.0), 230), Reply::Nak("12".into()));
		assert_eq!(ask(Command::Raw("XX?".into()), 230), Reply::Nak("17".into()));
		assert_eq!(ask(Command::ReadFlow, 231), Reply::Absent);
	}

	#[test]
	fn mks_bus_ignores_corrupt_frames() {
		let mut bus = MksBus::new().with_instrument(230, MksInstrument::new(1.0, "SLM", "B2"));
		assert!(bus.respond(b"@@@230FS?;E9").is_empty());
		assert!(!bus.respond(b"@@@230FS?;E8").is_empty());
	}

	#[test]
	fn ultraflex_unit() {
		let ultraflex = &Dialect::ULTRAFLEX;
		let unit = UltraflexUnit::new(3).with_current(0xFF).with_frequency(25_000);
		let mut backend = Simulated::new(unit);
		let mut ask = |command: Command, address: u16| {
			let reply = send(&mut backend, &encode(&command, address, ultraflex).unwrap());
			decode(&reply, ultraflex)
		};

		assert_eq!(ask(Command::ReadCurrent, 3), Reply::Ack("255".into()));
		assert_eq!(ask(Command::ReadFrequency, 3), Reply::Ack("25000".into()));
		assert_eq!(ask(Command::ReadCurrent, 4), Reply::Absent);
		assert_eq!(ask(Command::Raw("E".into()), 3), Reply::Absent);
	}
}
