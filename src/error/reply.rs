//! Errors produced while classifying an instrument's reply.

/// No bytes were captured within the settle window.
///
/// The instrument is either not present on the bus or too slow to answer
/// within the configured settle delay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DeviceAbsentError(());

impl DeviceAbsentError {
    /// Create a new instance of the error.
    pub(crate) const fn new() -> Self {
        DeviceAbsentError(())
    }
}

impl_error_display! {
    DeviceAbsentError,
    self => "no reply was received within the settle window"
}

/// Bytes were captured but they have no recognizable reply structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MalformedReplyError(Box<[u8]>);

impl MalformedReplyError {
    /// Create a instance of the error
    pub(crate) fn new<R: AsRef<[u8]>>(bytes: R) -> Self {
        MalformedReplyError(Box::from(bytes.as_ref()))
    }

    /// Get the bytes of the malformed reply.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl_error_display! {
    MalformedReplyError,
    self => "malformed reply: {:?}", String::from_utf8_lossy(&self.0)
}

/// The instrument rejected the command with a known error code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceError(Box<(Box<str>, &'static str)>);

impl DeviceError {
    /// Create a new `DeviceError` from the reported code and its catalog message.
    pub(crate) fn new(code: &str, message: &'static str) -> Self {
        DeviceError(Box::new((code.into(), message)))
    }

    /// The error code reported by the instrument.
    pub fn code(&self) -> &str {
        &self.0 .0
    }

    /// The human-readable description of the error code.
    pub fn message(&self) -> &'static str {
        self.0 .1
    }
}

impl_error_display! {
    DeviceError,
    self => "device error {}: {}", self.code(), self.message()
}

/// The instrument rejected the command with a code that the dialect's
/// [`ErrorCatalog`](crate::catalog::ErrorCatalog) does not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownErrorCodeError(Box<str>);

impl UnknownErrorCodeError {
    /// Create a new instance of the error.
    pub(crate) fn new(code: &str) -> Self {
        UnknownErrorCodeError(code.into())
    }

    /// The unrecognized error code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl_error_display! {
    UnknownErrorCodeError,
    self => "device reported unknown error code {:?}", self.0
}

error_enum! {
    /// The reply to a command was not a successful acknowledgement.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum ReplyError {
        Absent(DeviceAbsentError),
        Malformed(MalformedReplyError),
        Device(DeviceError),
        UnknownErrorCode(UnknownErrorCodeError),
    }
}

impl ReplyError {
    /// Whether the error is because the instrument did not answer.
    pub fn is_absent(&self) -> bool {
        matches!(self, ReplyError::Absent(_))
    }
}
