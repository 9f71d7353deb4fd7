//! A library for talking to laboratory gas-flow instruments over serial ports.
//!
//! The instruments share a family of small, checksum-framed ASCII protocols
//! whose replies carry no length. Each protocol is described by a
//! [`Dialect`](dialect::Dialect) that drives one generic [`codec`]:
//!
//! * [`Dialect::MKS`](dialect::Dialect::MKS): MKS mass-flow and pressure
//!   controllers on an addressed bus.
//! * [`Dialect::ULTRAFLEX`](dialect::Dialect::ULTRAFLEX): Ultraflex induction
//!   heater power supplies.
//!
//! A [`Transport`](transport::Transport) exclusively owns a serial port (or a
//! [simulated](backend::simulated) one) and performs timed write-then-read
//! transactions. The typed clients in [`device`] build on top of it:
//!
//! ```rust
//! use gasline::backend::simulated::{MksBus, MksInstrument};
//! use gasline::device::{FlowController, Reading};
//! use gasline::transport::OpenOptions;
//! use std::time::Duration;
//!
//! # fn wrapper() -> Result<(), gasline::error::Error> {
//! let bus = MksBus::new().with_instrument(230, MksInstrument::new(100.0, "SCCM", "A1234"));
//! let transport = OpenOptions::new().open_simulated(bus)?.into_shared();
//! let flow = FlowController::new(transport).with_settle_delay(Duration::ZERO);
//!
//! flow.set_flow(42.5, 230)?;
//! assert_eq!(flow.read_flow(230)?, Reading::Value(42.5));
//! println!("{}", flow.information(230)?);
//! # Ok(())
//! # }
//! # wrapper().unwrap();
//! ```

pub mod backend;
pub mod catalog;
pub mod checksum;
pub mod codec;
pub mod command;
pub mod device;
pub mod dialect;
pub mod error;
pub mod journal;
pub mod transport;
