//! Polls flow, pressure, heater and thermocouple readings, against simulated
//! instruments or a serial MKS bus given on the command line.

use gasline::{
    backend::simulated::{MksBus, MksInstrument, UltraflexUnit},
    device::{FlowController, HeaterMonitor, PressureController, SimulatedThermocouple, ThermalReader},
    error::Error,
    transport::{BackendConfig, OpenOptions, SimulatedDevice},
};
use simple_logger::SimpleLogger;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable logging
    SimpleLogger::new().init().unwrap();

    // Pass a serial device path to talk to real controllers, otherwise a
    // simulated bus with two flow controllers and a pressure controller is used.
    let config = match std::env::args().nth(1) {
        Some(path) => BackendConfig::Serial { path },
        None => BackendConfig::Simulated(SimulatedDevice::Mks(
            MksBus::new()
                .with_instrument(230, MksInstrument::new(100.0, "SCCM", "A1234"))
                .with_instrument(231, MksInstrument::new(10.0, "SLM", "B5678"))
                .with_instrument(250, MksInstrument::new(1000.0, "Torr", "P0001")),
        )),
    };
    let mks = OpenOptions::new().journal("mfc.log").open_dyn(&config)?.into_shared();
    let flow = FlowController::new(mks.clone());
    let pressure = PressureController::new(mks);

    let heater = HeaterMonitor::new(
        OpenOptions::new()
            .open_simulated(UltraflexUnit::new(3).with_current(215).with_frequency(31_250))?
            .into_shared(),
    );
    let mut thermal = ThermalReader::new(SimulatedThermocouple::new(23.4).with_conversion_polls(1));

    for address in [230, 231, 232] {
        match flow.information(address) {
            Ok(info) => println!("{address}:\n{info}"),
            Err(e) => println!("{address}: {e}"),
        }
    }
    flow.set_flow(42.5, 230)?;
    if let Err(e) = flow.set_flow(150.0, 230) {
        println!("230: {e}");
    }
    pressure.set_pressure(760.0)?;

    for _ in 0..3 {
        thermal.initiate()?;
        std::thread::sleep(Duration::from_millis(100));
        let temperature = loop {
            match thermal.get() {
                Ok(temperature) => break temperature,
                Err(Error::MeasurementNotReady(_)) => std::thread::sleep(Duration::from_millis(10)),
                Err(e) => return Err(e.into()),
            }
        };
        println!(
            "flow 230: {} | flow 231: {} | pressure: {} torr | heater: {} A, {} Hz | T: {temperature} C",
            flow.read_flow(230)?,
            flow.read_flow(231)?,
            pressure.read_pressure()?,
            heater.read_current()?,
            heater.read_frequency()?,
        );
    }
    Ok(())
}
