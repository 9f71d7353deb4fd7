//! Mass-flow controllers.

use super::{parse_number, query, read_number, Reading};
use crate::{
	backend::Backend,
	command::Command,
	dialect::Dialect,
	error::{Error, SetpointRangeError},
	journal::LogRecord,
	transport::{lock, SharedTransport},
};
use std::time::Duration;

/// The identity and range of a flow controller.
///
/// The fields hold the instrument's replies verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Information {
	/// The serial number.
	pub serial_number: String,
	/// The upper bound of the flow range.
	pub full_scale: String,
	/// The engineering unit of the flow range.
	pub unit: String,
}

impl std::fmt::Display for Information {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Serial No: #{}\nScale: 0-{} {}",
			self.serial_number, self.full_scale, self.unit
		)
	}
}

/// A client for the mass-flow controllers on one bus.
///
/// Every method takes the address of the controller to talk to, so one client
/// serves the whole bus.
///
/// ## Example
///
/// ```rust
/// # use gasline::{device::FlowController, transport::OpenOptions};
/// # fn wrapper() -> Result<(), gasline::error::Error> {
/// let transport = OpenOptions::new().open("/dev/ttyUSB0")?.into_shared();
/// let flow = FlowController::new(transport);
/// flow.set_flow(42.5, 230)?;
/// println!("{}", flow.read_flow(230)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FlowController<B> {
	transport: SharedTransport<B>,
	dialect: Dialect,
	settle_delay: Duration,
}

impl<B: Backend> FlowController<B> {
	/// Create a client that speaks the MKS dialect over `transport`.
	pub fn new(transport: SharedTransport<B>) -> Self {
		FlowController::with_dialect(transport, Dialect::MKS)
	}

	/// Create a client that speaks `dialect` over `transport`.
	///
	/// The settle delay is the dialect's.
	pub fn with_dialect(transport: SharedTransport<B>, dialect: Dialect) -> Self {
		FlowController {
			transport,
			dialect,
			settle_delay: dialect.settle_delay,
		}
	}

	/// Use a custom settle delay instead of the dialect's.
	pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
		self.settle_delay = settle_delay;
		self
	}

	/// The transport the client is bound to.
	pub fn transport(&self) -> &SharedTransport<B> {
		&self.transport
	}

	/// Set the flow of the controller at `address`.
	///
	/// The value is rounded to two decimal places and checked against the
	/// controller's full scale, which is queried every time. A value outside
	/// `0..=full_scale` is journaled and rejected with
	/// [`SetpointRangeError`] without writing anything to the controller.
	pub fn set_flow(&self, value: f64, address: u16) -> Result<(), Error> {
		let mut transport = lock(&self.transport)?;
		let full_scale = parse_number(&query(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			&Command::ReadFullScale,
			address,
		)?)?;

		let value = (value * 100.0).round() / 100.0;
		if !(0.0..=full_scale).contains(&value) {
			log::warn!(
				"{}: flow of {} is outside 0-{} for address {}",
				self.dialect.name,
				value,
				full_scale,
				address
			);
			transport.record(&LogRecord::error(format!(
				"Flow of {value:.6} is out of range"
			)));
			return Err(SetpointRangeError::new(value, full_scale).into());
		}

		query(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			&Command::SetFlow(value),
			address,
		)?;
		Ok(())
	}

	/// Read the measured flow of the controller at `address`.
	pub fn read_flow(&self, address: u16) -> Result<Reading<f64>, Error> {
		let mut transport = lock(&self.transport)?;
		read_number(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			&Command::ReadFlow,
			address,
		)
	}

	/// Query the full scale, unit and serial number of the controller at
	/// `address`, in that order.
	///
	/// The first failing query aborts the rest.
	pub fn information(&self, address: u16) -> Result<Information, Error> {
		let mut transport = lock(&self.transport)?;
		let mut ask = |command: Command| {
			query(
				&mut transport,
				&self.dialect,
				self.settle_delay,
				&command,
				address,
			)
		};
		let full_scale = ask(Command::ReadFullScale)?;
		let unit = ask(Command::ReadUnit)?;
		let serial_number = ask(Command::ReadSerialNumber)?;
		Ok(Information {
			serial_number,
			full_scale,
			unit,
		})
	}

	/// Query the full scale of the controller at `address`.
	pub fn full_scale(&self, address: u16) -> Result<f64, Error> {
		Ok(parse_number(&self.query(&Command::ReadFullScale, address)?)?)
	}

	/// Query the engineering unit of the controller at `address`.
	pub fn unit(&self, address: u16) -> Result<String, Error> {
		self.query(&Command::ReadUnit, address)
	}

	/// Query the serial number of the controller at `address`.
	pub fn serial_number(&self, address: u16) -> Result<String, Error> {
		self.query(&Command::ReadSerialNumber, address)
	}

	fn query(&self, command: &Command, address: u16) -> Result<String, Error> {
		let mut transport = lock(&self.transport)?;
		query(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			command,
			address,
		)
	}
}
