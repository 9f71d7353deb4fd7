//! Pressure controllers.

use super::{query, read_number, Reading};
use crate::{
	backend::Backend,
	command::Command,
	dialect::Dialect,
	error::{Error, SetpointRangeError},
	journal::LogRecord,
	transport::{lock, SharedTransport},
};
use std::time::Duration;

/// A client for one MKS pressure controller.
#[derive(Debug)]
pub struct PressureController<B> {
	transport: SharedTransport<B>,
	dialect: Dialect,
	settle_delay: Duration,
	address: u16,
}

impl<B: Backend> PressureController<B> {
	/// The address pressure controllers are configured with by default.
	pub const DEFAULT_ADDRESS: u16 = 250;

	/// Create a client for the controller at [`DEFAULT_ADDRESS`](Self::DEFAULT_ADDRESS).
	pub fn new(transport: SharedTransport<B>) -> Self {
		let dialect = Dialect::MKS;
		PressureController {
			transport,
			dialect,
			settle_delay: dialect.settle_delay,
			address: Self::DEFAULT_ADDRESS,
		}
	}

	/// Talk to the controller at `address` instead.
	pub fn with_address(mut self, address: u16) -> Self {
		self.address = address;
		self
	}

	/// Use a custom settle delay instead of the dialect's.
	pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
		self.settle_delay = settle_delay;
		self
	}

	/// The address of the controller.
	pub fn address(&self) -> u16 {
		self.address
	}

	/// The transport the client is bound to.
	pub fn transport(&self) -> &SharedTransport<B> {
		&self.transport
	}

	/// Read the measured pressure, in torr.
	pub fn read_pressure(&self) -> Result<Reading<f64>, Error> {
		let mut transport = lock(&self.transport)?;
		read_number(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			&Command::ReadPressure,
			self.address,
		)
	}

	/// Set the pressure set point, in torr.
	///
	/// Negative and non-finite values are journaled and rejected with
	/// [`SetpointRangeError`] without writing anything to the controller.
	pub fn set_pressure(&self, value: f64) -> Result<(), Error> {
		let mut transport = lock(&self.transport)?;
		if !value.is_finite() || value < 0.0 {
			log::warn!(
				"{}: pressure of {} rejected for address {}",
				self.dialect.name,
				value,
				self.address
			);
			transport.record(&LogRecord::error(format!(
				"Pressure of {value:.6} is out of range"
			)));
			return Err(SetpointRangeError::new(value, f64::INFINITY).into());
		}
		query(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			&Command::SetPressure(value),
			self.address,
		)?;
		Ok(())
	}
}
