//! Types defining the different options when opening a transport.

use super::Transport;
use crate::{
    backend::{
        simulated::{MksBus, Responder, Script, Simulated, UltraflexUnit},
        Backend, Serial,
    },
    error::Error,
    journal::TransactionLog,
};
use serialport as sp;
use std::{path::PathBuf, time::Duration};

/// Options for configuring and opening a transport.
///
/// Both instrument families this crate supports use 9600 baud, 8 data bits,
/// no parity, one stop bit and no flow control.
///
/// ## Example
///
/// ```rust
/// # use gasline::transport::OpenOptions;
/// # use std::time::Duration;
/// # fn wrapper() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = OpenOptions::new()
///     .timeout(Some(Duration::from_millis(500)))
///     .journal("mfc.log")
///     .open("/dev/ttyUSB0")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// The custom baud rate
    baud_rate: u32,
    /// The custom timeout
    timeout: Option<Duration>,
    /// The file journal records are appended to, if any.
    journal: Option<PathBuf>,
}

impl OpenOptions {
    /// The default baud rate: 9600.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Create a blank set of options ready for configuration.
    ///
    /// The default baud rate and read timeout are 9600 and 3 seconds,
    /// respectively. The journal is disabled by default.
    ///
    /// Equivalent to [`default`](OpenOptions::default).
    pub fn new() -> Self {
        OpenOptions {
            baud_rate: OpenOptions::DEFAULT_BAUD_RATE,
            timeout: Some(Duration::from_secs(3)),
            journal: None,
        }
    }

    /// Set a custom baud rate.
    ///
    /// The default is 9600.
    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set a custom read timeout.
    ///
    /// If duration is `None`, reads will block indefinitely. The default is 3 seconds.
    pub fn timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.timeout = duration;
        self
    }

    /// Append journal records to the file at `path`.
    ///
    /// See [`TransactionLog::file`].
    pub fn journal<P: Into<PathBuf>>(&mut self, path: P) -> &mut Self {
        self.journal = Some(path.into());
        self
    }

    /// Wrap `backend` in a transport, applying the journal option.
    fn transport<B: Backend>(&self, backend: B) -> Transport<B> {
        let mut transport = Transport::from_backend(backend);
        if let Some(path) = &self.journal {
            transport.set_journal(TransactionLog::file(path.clone()));
        }
        transport
    }

    /// Open a [`Serial`] port at the specified path.
    fn open_serial_port(&self, path: &str) -> Result<Serial, Error> {
        // The baud rate passed to `new` is ignored by some platforms, so it is
        // set again with `baud_rate` below.
        sp::new(path, OpenOptions::DEFAULT_BAUD_RATE)
            .data_bits(sp::DataBits::Eight)
            .parity(sp::Parity::None)
            .flow_control(sp::FlowControl::None)
            .stop_bits(sp::StopBits::One)
            // serialport has no infinite timeout; Duration::MAX is close enough.
            .timeout(self.timeout.unwrap_or(Duration::MAX))
            .baud_rate(self.baud_rate)
            .open_native()
            .map(Serial)
            .map_err(Into::into)
    }

    /// Open the serial port at the specified path with the custom options.
    pub fn open(&self, path: &str) -> Result<Transport<Serial>, Error> {
        Ok(self.transport(self.open_serial_port(path)?))
    }

    /// Open a simulated backend answered by `responder`.
    pub fn open_simulated<R: Responder + 'static>(
        &self,
        responder: R,
    ) -> Result<Transport<Simulated>, Error> {
        let mut backend = Simulated::new(responder);
        backend.set_read_timeout(self.timeout)?;
        Ok(self.transport(backend))
    }

    /// Open the backend described by `config` with the custom options.
    ///
    /// The type of the underlying backend is erased via dynamic dispatch,
    /// which does have runtime overhead. [`OpenOptions::open`] should
    /// generally be used instead, except when the type of the underlying
    /// backend is only known at runtime.
    pub fn open_dyn(&self, config: &BackendConfig) -> Result<Transport<Box<dyn Backend>>, Error> {
        let backend: Box<dyn Backend> = match config {
            BackendConfig::Serial { path } => Box::new(self.open_serial_port(path)?),
            BackendConfig::Simulated(device) => {
                let mut backend = match device.clone() {
                    SimulatedDevice::Silent => Simulated::silent(),
                    SimulatedDevice::Script(script) => Simulated::new(script),
                    SimulatedDevice::Mks(bus) => Simulated::new(bus),
                    SimulatedDevice::Ultraflex(unit) => Simulated::new(unit),
                };
                backend.set_read_timeout(self.timeout)?;
                Box::new(backend)
            }
        };
        Ok(self.transport(backend))
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions::new()
    }
}

/// Which backend to open, as read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// A serial port.
    Serial {
        /// The path of the serial device, e.g. `/dev/ttyUSB0` or `COM3`.
        path: String,
    },
    /// A simulated instrument, for running without hardware.
    Simulated(SimulatedDevice),
}

/// The simulated instruments that can be selected through [`BackendConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedDevice {
    /// Nothing is connected.
    Silent,
    /// Canned replies.
    Script(Script),
    /// A bus of MKS controllers.
    Mks(MksBus),
    /// An Ultraflex heater power supply.
    Ultraflex(UltraflexUnit),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::backend::simulated::MksInstrument;

    #[test]
    fn open_dyn_simulated() {
        let bus = MksBus::new().with_instrument(230, MksInstrument::new(100.0, "SCCM", "1"));
        let config = BackendConfig::Simulated(SimulatedDevice::Mks(bus));
        let mut transport = OpenOptions::new().open_dyn(&config).unwrap();
        assert!(transport.backend().name().unwrap().starts_with("<simulated"));
        assert_eq!(
            transport.backend().read_timeout().unwrap(),
            Some(Duration::from_secs(3))
        );
        let reply = transport
            .transact(b"@@@230FS?;E8", Duration::ZERO)
            .unwrap();
        assert!(reply.starts_with(b"@@@230ACK100;"));
    }

    #[test]
    fn open_missing_serial_port() {
        let config = BackendConfig::Serial {
            path: "/dev/gasline-does-not-exist".to_string(),
        };
        assert!(OpenOptions::new().open_dyn(&config).is_err());
    }

    #[test]
    fn journal_option() {
        let mut options = OpenOptions::new();
        assert!(!options.open_simulated(Script::default()).unwrap().journal.is_enabled());
        options.journal(std::env::temp_dir().join("gasline-options.log"));
        assert!(options.open_simulated(Script::default()).unwrap().journal.is_enabled());
    }

    #[test]
    fn open_simulated_applies_the_timeout() {
        let transport = OpenOptions::new()
            .timeout(Some(Duration::from_millis(250)))
            .open_simulated(Script::default())
            .unwrap();
        assert_eq!(
            transport.backend().read_timeout().unwrap(),
            Some(Duration::from_millis(250))
        );
    }
}
