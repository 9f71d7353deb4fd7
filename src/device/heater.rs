//! Induction heater power supplies.

use super::{read_number, Reading};
use crate::{
	backend::Backend,
	codec,
	command::Command,
	dialect::Dialect,
	error::Error,
	transport::{lock, SharedTransport},
};
use std::time::Duration;

/// A client for one Ultraflex heater power supply.
#[derive(Debug)]
pub struct HeaterMonitor<B> {
	transport: SharedTransport<B>,
	dialect: Dialect,
	settle_delay: Duration,
	unit: u16,
}

impl<B: Backend> HeaterMonitor<B> {
	/// The unit number supplies are configured with by default.
	pub const DEFAULT_UNIT: u16 = 3;

	/// Create a client for the supply with unit number
	/// [`DEFAULT_UNIT`](Self::DEFAULT_UNIT).
	pub fn new(transport: SharedTransport<B>) -> Self {
		let dialect = Dialect::ULTRAFLEX;
		HeaterMonitor {
			transport,
			dialect,
			settle_delay: dialect.settle_delay,
			unit: Self::DEFAULT_UNIT,
		}
	}

	/// Talk to the supply with unit number `unit` instead.
	pub fn with_unit(mut self, unit: u16) -> Self {
		self.unit = unit;
		self
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

	/// Read the output current, in amperes.
	///
	/// The supply reports tenths of an ampere.
	pub fn read_current(&self) -> Result<Reading<f64>, Error> {
		Ok(self.read(&Command::ReadCurrent)?.map(|raw| raw / 10.0))
	}

	/// Read the output frequency, in hertz.
	pub fn read_frequency(&self) -> Result<Reading<f64>, Error> {
		self.read(&Command::ReadFrequency)
	}

	/// Send `body` to the supply and return the raw reply, unparsed.
	///
	/// The unit number is prepended to `body`. Meant for diagnostics.
	pub fn raw(&self, body: &str) -> Result<Vec<u8>, Error> {
		let frame = codec::encode(&Command::Raw(body.to_string()), self.unit, &self.dialect)?;
		let mut transport = lock(&self.transport)?;
		Ok(transport.transact(&frame, self.settle_delay)?)
	}

	fn read(&self, command: &Command) -> Result<Reading<f64>, Error> {
		let mut transport = lock(&self.transport)?;
		read_number(
			&mut transport,
			&self.dialect,
			self.settle_delay,
			command,
			self.unit,
		)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::backend::simulated::{Script, Simulated, UltraflexUnit};
	use crate::transport::Transport;

	fn monitor(backend: Simulated) -> HeaterMonitor<Simulated> {
		HeaterMonitor::new(Transport::from_backend(backend).into_shared())
			.with_settle_delay(Duration::ZERO)
	}

	fn written(heater: &HeaterMonitor<Simulated>) -> Vec<Vec<u8>> {
		lock(heater.transport()).unwrap().backend().written().to_vec()
	}

	#[test]
	fn default_settle_delay() {
		let heater = HeaterMonitor::new(Transport::from_backend(Simulated::silent()).into_shared());
		assert_eq!(heater.settle_delay, Duration::from_millis(200));
	}

	#[test]
	fn read_current() {
		let heater = monitor(Simulated::new(Script::new(["S3iFF00K", "S3i00K", ""])));
		assert_eq!(heater.read_current().unwrap(), Reading::Value(25.5));
		assert!(matches!(heater.read_current(), Err(Error::Malformed(_))));
		assert_eq!(heater.read_current().unwrap(), Reading::Unavailable);
		assert_eq!(written(&heater)[0], b"S3i11K");
	}

	#[test]
	fn simulated_unit() {
		let unit = UltraflexUnit::new(3).with_current(123).with_frequency(31_250);
		let heater = monitor(Simulated::new(unit));
		assert_eq!(heater.read_current().unwrap(), Reading::Value(12.3));
		assert_eq!(heater.read_frequency().unwrap(), Reading::Value(31_250.0));

		let other = monitor(Simulated::new(unit)).with_unit(4);
		assert_eq!(other.read_frequency().unwrap(), Reading::Unavailable);
	}

	#[test]
	fn raw_replies_are_not_parsed() {
		let heater = monitor(Simulated::new(Script::new(["S3E??K"])));
		assert_eq!(heater.raw("E").unwrap(), b"S3E??K");
		assert_eq!(written(&heater), [b"S3E35K".to_vec()]);
		assert!(heater.raw("E").unwrap().is_empty());
	}

	#[test]
	fn raw_rejects_invalid_units() {
		let heater = monitor(Simulated::silent()).with_unit(10);
		assert!(matches!(heater.raw("E"), Err(Error::InvalidAddress(_))));
	}
}
