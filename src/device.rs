//! Typed clients for each instrument role.
//!
//! * [`FlowController`] sets and reads MKS mass-flow controllers.
//! * [`PressureController`] sets and reads an MKS pressure controller.
//! * [`ThermalReader`] drives a one-shot thermocouple amplifier.
//! * [`HeaterMonitor`] reads an Ultraflex heater power supply.
//!
//! Clients bound to the same port share one
//! [`SharedTransport`](crate::transport::SharedTransport) and hold its lock for
//! the whole of each operation.

mod flow;
mod heater;
mod pressure;
mod thermal;

pub use flow::*;
pub use heater::*;
pub use pressure::*;
pub use thermal::*;

use crate::{
	backend::Backend,
	codec::{self, Reply},
	command::Command,
	dialect::Dialect,
	error::{Error, MalformedReplyError},
	journal::LogRecord,
	transport::Transport,
};
use std::time::Duration;

/// The result of a periodic read.
///
/// An instrument that does not answer within the settle window is
/// [`Unavailable`](Reading::Unavailable) rather than an error, so that a
/// poller can keep going. Its `Display` renders `N/A` in that case.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Reading<T> {
	/// The instrument answered with a value.
	Value(T),
	/// The instrument did not answer.
	Unavailable,
}

impl<T> Reading<T> {
	/// Convert the reading into an `Option`.
	pub fn value(self) -> Option<T> {
		match self {
			Reading::Value(value) => Some(value),
			Reading::Unavailable => None,
		}
	}

	/// Whether the instrument answered.
	pub fn is_available(&self) -> bool {
		matches!(self, Reading::Value(_))
	}

	/// Map the value, if there is one.
	pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
		match self {
			Reading::Value(value) => Reading::Value(f(value)),
			Reading::Unavailable => Reading::Unavailable,
		}
	}
}

impl<T: std::fmt::Display> std::fmt::Display for Reading<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Reading::Value(value) => value.fmt(f),
			Reading::Unavailable => f.write_str("N/A"),
		}
	}
}

/// Send `command` to the instrument at `address` and classify its reply.
///
/// Replies other than an acknowledgement, and I/O failures, are journaled as
/// errors.
pub(crate) fn exchange<B: Backend>(
	transport: &mut Transport<B>,
	dialect: &Dialect,
	settle_delay: Duration,
	command: &Command,
	address: u16,
) -> Result<Reply, Error> {
	let frame = codec::encode(command, address, dialect)?;
	let raw = match transport.transact(&frame, settle_delay) {
		Ok(raw) => raw,
		Err(e) => {
			log::warn!("{}: address {}: {}", dialect.name, address, e);
			transport.record(&LogRecord::error(format!("Address {address}: {e}")));
			return Err(e.into());
		}
	};
	let reply = codec::decode(&raw, dialect);
	match &reply {
		Reply::Ack(_) => {}
		Reply::Absent => {
			log::warn!("{}: no device found on address {}", dialect.name, address);
			transport.record(&LogRecord::error(format!(
				"No device found on address {address}"
			)));
		}
		Reply::Nak(_) | Reply::Malformed(_) => {
			if let Err(e) = reply.clone().check(&dialect.catalog) {
				log::warn!("{}: address {}: {}", dialect.name, address, e);
				transport.record(&LogRecord::error(format!("Address {address}: {e}")));
			}
		}
	}
	Ok(reply)
}

/// Like [`exchange`], but anything other than an acknowledgement is an error.
pub(crate) fn query<B: Backend>(
	transport: &mut Transport<B>,
	dialect: &Dialect,
	settle_delay: Duration,
	command: &Command,
	address: u16,
) -> Result<String, Error> {
	Ok(exchange(transport, dialect, settle_delay, command, address)?.check(&dialect.catalog)?)
}

/// Like [`query`], but an instrument that does not answer is
/// [`Reading::Unavailable`] and the payload is parsed as a number.
pub(crate) fn read_number<B: Backend>(
	transport: &mut Transport<B>,
	dialect: &Dialect,
	settle_delay: Duration,
	command: &Command,
	address: u16,
) -> Result<Reading<f64>, Error> {
	match exchange(transport, dialect, settle_delay, command, address)? {
		Reply::Absent => Ok(Reading::Unavailable),
		reply => Ok(Reading::Value(parse_number(&reply.check(&dialect.catalog)?)?)),
	}
}

/// Parse an acknowledged payload as a number.
pub(crate) fn parse_number(payload: &str) -> Result<f64, MalformedReplyError> {
	payload
		.trim()
		.parse::<f64>()
		.map_err(|_| MalformedReplyError::new(payload))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::backend::simulated::{Script, Simulated};
	use crate::journal::{SharedBuffer, TransactionLog};
	use std::io;

	#[test]
	fn reading_display() {
		assert_eq!(Reading::Value(12.5).to_string(), "12.5");
		assert_eq!(Reading::<f64>::Unavailable.to_string(), "N/A");
		assert_eq!(Reading::Value(3).map(|v| v * 2), Reading::Value(6));
		assert_eq!(Reading::<u8>::Unavailable.value(), None);
		assert!(!Reading::<u8>::Unavailable.is_available());
	}

	#[test]
	fn parse_numbers() {
		assert_eq!(parse_number("12.50").unwrap(), 12.5);
		assert_eq!(parse_number(" 7 ").unwrap(), 7.0);
		assert_eq!(parse_number("SCCM").unwrap_err().as_bytes(), b"SCCM");
	}

	#[test]
	fn failed_exchanges_are_journaled() {
		let buffer = SharedBuffer::default();
		let mut transport = Transport::from_backend(Simulated::new(Script::new(["", "NAK15;", "ACK1;"])));
		transport.set_journal(TransactionLog::writer(buffer.clone()));
		let mks = &Dialect::MKS;

		let reply = exchange(&mut transport, mks, Duration::ZERO, &Command::ReadFlow, 231).unwrap();
		assert_eq!(reply, Reply::Absent);
		let reply = exchange(&mut transport, mks, Duration::ZERO, &Command::ReadFlow, 231).unwrap();
		assert_eq!(reply, Reply::Nak("15".into()));
		let reply = exchange(&mut transport, mks, Duration::ZERO, &Command::ReadFlow, 231).unwrap();
		assert_eq!(reply, Reply::Ack("1".into()));

		let errors: Vec<_> = buffer
			.lines()
			.into_iter()
			.filter(|line| line.starts_with("ERROR "))
			.collect();
		assert_eq!(errors.len(), 2);
		assert!(errors[0].ends_with(" -- No device found on address 231"));
		assert!(errors[1].ends_with(" -- Address 231: device error 15: Invalid gas"));
	}

	#[test]
	fn io_failures_are_journaled() {
		let buffer = SharedBuffer::default();
		let mut backend = Simulated::new(Script::new(["ACK1;"]));
		backend.write_error(Some(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")));
		let mut transport = Transport::from_backend(backend);
		transport.set_journal(TransactionLog::writer(buffer.clone()));

		let err = read_number(&mut transport, &Dialect::MKS, Duration::ZERO, &Command::ReadFlow, 230)
			.unwrap_err();
		assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));

		let lines = buffer.lines();
		assert_eq!(lines.len(), 1);
		assert!(lines[0].starts_with("ERROR "));
		assert!(lines[0].ends_with(" -- Address 230: unplugged"));
	}

	#[test]
	fn absent_reads_are_unavailable() {
		let mut transport = Transport::from_backend(Simulated::new(Script::new(["", "NAK17;", "ACK4.25;"])));
		let mks = &Dialect::MKS;
		let read = |transport: &mut Transport<Simulated>| {
			read_number(transport, mks, Duration::ZERO, &Command::ReadFlow, 230)
		};
		assert_eq!(read(&mut transport).unwrap(), Reading::Unavailable);
		assert!(matches!(read(&mut transport), Err(Error::Device(_))));
		assert_eq!(read(&mut transport).unwrap(), Reading::Value(4.25));
	}
}
