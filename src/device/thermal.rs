//! One-shot thermocouple amplifiers.
//!
//! A conversion is started with [`ThermalReader::initiate`] and collected with
//! [`ThermalReader::get`] once the amplifier reports it complete. The reader
//! never blocks waiting for a conversion; polling is up to the caller.

use crate::error::{Error, MeasurementNotReadyError};

/// A thermocouple amplifier that performs one-shot conversions.
pub trait Thermocouple {
	/// Start a one-shot conversion.
	fn initiate_one_shot(&mut self) -> Result<(), Error>;

	/// Whether the last conversion is still in progress.
	fn oneshot_pending(&mut self) -> Result<bool, Error>;

	/// The result of the last conversion, in degrees Celsius.
	fn temperature(&mut self) -> Result<f64, Error>;
}

impl<T: Thermocouple + ?Sized> Thermocouple for &mut T {
	fn initiate_one_shot(&mut self) -> Result<(), Error> {
		(**self).initiate_one_shot()
	}
	fn oneshot_pending(&mut self) -> Result<bool, Error> {
		(**self).oneshot_pending()
	}
	fn temperature(&mut self) -> Result<f64, Error> {
		(**self).temperature()
	}
}

/// The state of a [`ThermalReader`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ThermalState {
	/// No conversion has been started.
	Idle,
	/// A conversion was started and has not been collected yet.
	MeasurementInitiated,
	/// The last conversion completed.
	Ready,
}

/// Reads temperatures from a [`Thermocouple`].
#[derive(Debug)]
pub struct ThermalReader<T> {
	device: T,
	state: ThermalState,
}

impl<T: Thermocouple> ThermalReader<T> {
	/// Create a reader for `device`.
	pub fn new(device: T) -> Self {
		ThermalReader {
			device,
			state: ThermalState::Idle,
		}
	}

	/// The current state.
	pub fn state(&self) -> ThermalState {
		self.state
	}

	/// Get a mutable reference to the underlying device.
	pub fn device_mut(&mut self) -> &mut T {
		&mut self.device
	}

	/// Start a new conversion.
	pub fn initiate(&mut self) -> Result<(), Error> {
		self.device.initiate_one_shot()?;
		self.state = ThermalState::MeasurementInitiated;
		Ok(())
	}

	/// Collect the temperature of the last conversion, in degrees Celsius.
	///
	/// Fails with [`MeasurementNotReadyError`] if no conversion was started or
	/// the conversion is still pending. Once a conversion completes, its
	/// result can be collected repeatedly until the next [`initiate`](Self::initiate).
	pub fn get(&mut self) -> Result<f64, Error> {
		match self.state {
			ThermalState::Idle => return Err(MeasurementNotReadyError::new().into()),
			ThermalState::MeasurementInitiated => {
				if self.device.oneshot_pending()? {
					log::debug!("thermocouple conversion still pending");
					return Err(MeasurementNotReadyError::new().into());
				}
				self.state = ThermalState::Ready;
			}
			ThermalState::Ready => {}
		}
		self.device.temperature()
	}
}

/// A deterministic stand-in for a thermocouple amplifier.
///
/// Each conversion stays pending for a configurable number of polls and then
/// yields the configured temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedThermocouple {
	temperature: f64,
	conversion_polls: u32,
	/// Polls left before the current conversion completes.
	remaining: u32,
	/// The number of conversions started.
	conversions: u32,
}

impl SimulatedThermocouple {
	/// Create an amplifier whose conversions complete immediately.
	pub fn new(temperature: f64) -> Self {
		SimulatedThermocouple {
			temperature,
			conversion_polls: 0,
			remaining: 0,
			conversions: 0,
		}
	}

	/// Keep each conversion pending for `polls` calls to `oneshot_pending`.
	pub fn with_conversion_polls(mut self, polls: u32) -> Self {
		self.conversion_polls = polls;
		self
	}

	/// Change the temperature reported by later conversions.
	pub fn set_temperature(&mut self, temperature: f64) {
		self.temperature = temperature;
	}

	/// The number of conversions started so far.
	pub fn conversions(&self) -> u32 {
		self.conversions
	}
}

impl Thermocouple for SimulatedThermocouple {
	fn initiate_one_shot(&mut self) -> Result<(), Error> {
		self.remaining = self.conversion_polls;
		self.conversions += 1;
		Ok(())
	}

	fn oneshot_pending(&mut self) -> Result<bool, Error> {
		if self.remaining > 0 {
			self.remaining -= 1;
			Ok(true)
		} else {
			Ok(false)
		}
	}

	fn temperature(&mut self) -> Result<f64, Error> {
		Ok(self.temperature)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn get_before_initiate() {
		let mut reader = ThermalReader::new(SimulatedThermocouple::new(21.5));
		assert_eq!(reader.state(), ThermalState::Idle);
		assert!(matches!(reader.get(), Err(Error::MeasurementNotReady(_))));
		assert_eq!(reader.device_mut().conversions(), 0);
	}

	#[test]
	fn get_while_pending() {
		let mut reader = ThermalReader::new(SimulatedThermocouple::new(21.5).with_conversion_polls(2));
		reader.initiate().unwrap();
		assert_eq!(reader.state(), ThermalState::MeasurementInitiated);
		assert!(matches!(reader.get(), Err(Error::MeasurementNotReady(_))));
		assert!(matches!(reader.get(), Err(Error::MeasurementNotReady(_))));
		assert_eq!(reader.state(), ThermalState::MeasurementInitiated);
		assert_eq!(reader.get().unwrap(), 21.5);
		assert_eq!(reader.state(), ThermalState::Ready);
	}

	#[test]
	fn ready_until_next_initiate() {
		let mut reader = ThermalReader::new(SimulatedThermocouple::new(100.0));
		reader.initiate().unwrap();
		assert_eq!(reader.get().unwrap(), 100.0);
		assert_eq!(reader.get().unwrap(), 100.0);

		reader.device_mut().set_temperature(250.0);
		reader.initiate().unwrap();
		assert_eq!(reader.state(), ThermalState::MeasurementInitiated);
		assert_eq!(reader.get().unwrap(), 250.0);
		assert_eq!(reader.device_mut().conversions(), 2);
	}

	#[test]
	fn borrowed_device() {
		let mut device = SimulatedThermocouple::new(5.0);
		{
			let mut reader = ThermalReader::new(&mut device);
			reader.initiate().unwrap();
			assert_eq!(reader.get().unwrap(), 5.0);
		}
		assert_eq!(device.conversions(), 1);
	}
}
