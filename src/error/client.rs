//! Errors raised locally, before or instead of talking to an instrument.

/// The lock guarding a shared transport was poisoned by a panicking thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LockPoisonedError(());

impl LockPoisonedError {
    /// Create a new instance of the error.
    pub(crate) const fn new() -> Self {
        LockPoisonedError(())
    }
}

impl_error_display! {
    LockPoisonedError,
    self => "the transport lock is poisoned"
}

/// A set point was outside the range the instrument accepts.
///
/// No write was sent to the instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointRangeError {
    value: f64,
    upper: f64,
}

impl SetpointRangeError {
    /// Create a new instance of the error.
    ///
    /// The lower bound is always zero.
    pub(crate) const fn new(value: f64, upper: f64) -> Self {
        SetpointRangeError { value, upper }
    }

    /// The rejected set point.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The upper bound of the accepted range.
    pub fn upper(&self) -> f64 {
        self.upper
    }
}

impl_error_display! {
    SetpointRangeError,
    self => "set point {:.6} is out of range 0-{}", self.value, self.upper
}

/// A temperature was requested before the one-shot conversion completed.
///
/// This is a usage error, the caller is responsible for polling again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MeasurementNotReadyError(());

impl MeasurementNotReadyError {
    /// Create a new instance of the error.
    pub(crate) const fn new() -> Self {
        MeasurementNotReadyError(())
    }
}

impl_error_display! {
    MeasurementNotReadyError,
    self => "the measurement has not been initiated or is still pending"
}

/// The dialect has no mnemonic for the command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsupportedCommandError(Box<(&'static str, &'static str)>);

impl UnsupportedCommandError {
    /// Create a new instance of the error.
    pub(crate) fn new(dialect: &'static str, command: &'static str) -> Self {
        UnsupportedCommandError(Box::new((dialect, command)))
    }

    /// The name of the dialect.
    pub fn dialect(&self) -> &'static str {
        self.0 .0
    }

    /// The name of the unsupported command.
    pub fn command(&self) -> &'static str {
        self.0 .1
    }
}

impl_error_display! {
    UnsupportedCommandError,
    self => "the {} dialect does not support the {} command", self.0 .0, self.0 .1
}

/// An address does not fit in the dialect's address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvalidAddressError {
    address: u16,
    width: usize,
}

impl InvalidAddressError {
    /// Create a new instance of the error.
    pub(crate) const fn new(address: u16, width: usize) -> Self {
        InvalidAddressError { address, width }
    }

    /// The rejected address.
    pub fn address(&self) -> u16 {
        self.address
    }
}

impl_error_display! {
    InvalidAddressError,
    self => "address {} does not fit in {} decimal digit(s)", self.address, self.width
}

/// A request frame did not follow the dialect's framing rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MalformedRequestError(Box<[u8]>);

impl MalformedRequestError {
    /// Create a instance of the error
    pub(crate) fn new<R: AsRef<[u8]>>(bytes: R) -> Self {
        MalformedRequestError(Box::from(bytes.as_ref()))
    }

    /// Get the bytes of the malformed request.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl_error_display! {
    MalformedRequestError,
    self => "malformed request frame: {:?}", String::from_utf8_lossy(&self.0)
}
