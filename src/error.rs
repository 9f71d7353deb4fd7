//! Error types.
//!
//! Each error is represented by a unique type that implements [`std::error::Error`].
//! However, most APIs return more than one kind of error and so will return one
//! of the higher level [enums](#enums), such as [`ReplyError`] or [`Error`].
//! Where appropriate, the error types are convertible to the higher level
//! enums, allowing them to be used with `?`:
//!
//! ```
//! use gasline::error::{Error, ReplyError};
//!
//! fn foo() -> Result<(), ReplyError> {
//!     // ...
//! # unimplemented!();
//! }
//!
//! fn bar() -> Result<(), Error> {
//!     foo()?;
//!     // ...
//! # Ok(())
//! }
//! ```
//!
//! An instrument that does not answer is reported as [`DeviceAbsentError`],
//! which is distinct from an instrument that answers with an error code
//! ([`DeviceError`] or [`UnknownErrorCodeError`]). Periodic reads report the
//! former as [`Reading::Unavailable`](crate::device::Reading::Unavailable)
//! instead of an error.

/// Implement Error and Display traits for the specified type.
///
/// After the type define the format string and any arguments it should
/// reference after `self =>` (to abide by macro hygiene rules).
macro_rules! impl_error_display {
    (
        $name:path,
        $self:ident =>
        $display:literal
        $(,
            $($arg:expr),+
        )?
    ) => {
        impl std::error::Error for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&$self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(
                    f,
                    $display
                    $(,
                        $($arg),+
                    )?
                )
            }
        }
    };
}

macro_rules! impl_is_timeout {
    ($name:ident) => {
        impl $name {
            /// A convenience function for determining if the error is due to the
            /// port timing out.
            pub fn is_timeout(&self) -> bool {
                matches!(self, $name::Io(e) if e.kind() == std::io::ErrorKind::TimedOut)
            }
        }
    };
}

macro_rules! impl_from_serialport_error {
    ($name:ident) => {
        impl From<serialport::Error> for $name {
            fn from(other: serialport::Error) -> Self {
                use std::io;

                match other.kind() {
                    serialport::ErrorKind::NoDevice => $name::SerialDeviceInUseOrDisconnected(
                        SerialDeviceInUseOrDisconnectedError(other.description.into_boxed_str()),
                    ),
                    serialport::ErrorKind::InvalidInput => $name::Io(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        other.description,
                    )),
                    serialport::ErrorKind::Unknown => {
                        $name::Io(io::Error::new(io::ErrorKind::Other, other.description))
                    }
                    serialport::ErrorKind::Io(kind) => {
                        $name::Io(io::Error::new(kind, other.description))
                    }
                }
            }
        }
    };
}

/// Define error enums that contain concrete error types (not other error enums).
///
/// From and TryFrom traits will be implemented for the enum and it's underlying
/// errors. The enum's Display implementation will defer to the underlying errors'
/// Display implementations.
///
/// Simple implementations of From and TryFrom with other error enums can be
/// added by appending a succinct impl block, which assumes that:
///   * it is being implemented for this error enum,
///   * each variant has a single tuple value, and can be converted to the value
///     in this enum with its own From implementation.
///
/// ```compile_fail
/// # // This fails to compile because the macro is not exported.
/// error_enum!{
///     // This defines the enum and From/TryFrom between ThisError and A and B.
///     #[non_exhaustive]
///     pub enum ThisError {
///         VariantA(A),
///         VariantB(B),
///         // ...
///     }
///
///     // This implements a simple From/TryFrom between ThisError and OtherType.
///     impl From<OtherType> {
///         FromVariantA => VariantA,
///         // ...
///     }
/// }
/// ```
macro_rules! error_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $variant:ident($inner:path)
            ),+
            $(,)?
        }
        // Additional information for From/TryFrom impl blocks.
        $(
            impl From<$from_t:ident>
            {
                $($from_variant:ident => $to_variant:ident),+
                $(,)?
            }
        )*
    ) => {
        // Define the error enum itself
        $(
            #[$attr]
        )*
        #[allow(missing_docs)]
        pub enum $name {
            $(
                $variant($inner)
            ),+
        }

        impl std::error::Error for $name {}

        // Defer the display to the inner error type
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        $name::$variant(e) => std::fmt::Display::fmt(e, f)
                    ),+
                }
            }
        }

        // Allow the enum to be convertible from an infallible error
        impl From<std::convert::Infallible> for $name {
            fn from(_: std::convert::Infallible) -> Self {
                unreachable!();
            }
        }

        // Conversions with underlying errors
        $(
            impl From<$inner> for $name {
                fn from(other: $inner) -> Self {
                    $name::$variant(other)
                }
            }

            impl TryFrom<$name> for $inner {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $name::$variant(value) => Ok(value),
                        value => Err(value)
                    }
                }
            }
        )+

        // Conversions from other enum errors
        $(
            impl From<$from_t> for $name {
                fn from(other: $from_t) -> Self {
                    match other {
                        $($from_t::$from_variant(e) => $name::$to_variant(From::from(e))),+
                    }
                }
            }

            impl TryFrom<$name> for $from_t {
                type Error = $name;
                fn try_from(other: $name) -> Result<Self, Self::Error> {
                    match other {
                        $(
                            $name::$to_variant(e) => Ok($from_t::$from_variant(From::from(e)))
                        ),+
                        ,
                        _ => Err(other)
                    }
                }

            }
        )*
    };
}

mod client;
mod reply;

pub use client::*;
pub use reply::*;

/// The specified device is either disconnected or already in use by another process.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SerialDeviceInUseOrDisconnectedError(Box<str>);

impl_error_display! {
    SerialDeviceInUseOrDisconnectedError,
    self =>
    "the specified device is either disconnected or already in use by another process: {}", self.0
}

error_enum! {
    /// Any error returned by this library.
    #[derive(Debug)]
    #[non_exhaustive]
    pub enum Error {
        SerialDeviceInUseOrDisconnected(SerialDeviceInUseOrDisconnectedError),
        Io(std::io::Error),
        LockPoisoned(LockPoisonedError),
        Absent(DeviceAbsentError),
        Malformed(MalformedReplyError),
        Device(DeviceError),
        UnknownErrorCode(UnknownErrorCodeError),
        SetpointRange(SetpointRangeError),
        MeasurementNotReady(MeasurementNotReadyError),
        UnsupportedCommand(UnsupportedCommandError),
        InvalidAddress(InvalidAddressError),
        MalformedRequest(MalformedRequestError),
    }

    impl From<ReplyError> {
        Absent => Absent,
        Malformed => Malformed,
        Device => Device,
        UnknownErrorCode => UnknownErrorCode,
    }
}
impl_is_timeout! { Error }
impl_from_serialport_error! { Error }

impl Error {
    /// Whether the error is because the instrument did not answer within the
    /// settle window.
    pub fn is_absent(&self) -> bool {
        matches!(self, Error::Absent(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use static_assertions::{assert_impl_all, const_assert};

    // Keep the error enums no larger than a String to minimize the size of
    // Result<T, Error>.
    const _WORD_SIZE: usize = std::mem::size_of::<&usize>();
    const_assert!(std::mem::size_of::<Error>() <= 3 * _WORD_SIZE);
    const_assert!(std::mem::size_of::<ReplyError>() <= 3 * _WORD_SIZE);

    assert_impl_all!(Error: From<ReplyError>, Send, Sync);
    assert_impl_all!(ReplyError: TryFrom<Error>, Send, Sync);

    #[test]
    fn serialport_errors_convert() {
        let err = Error::from(serialport::Error::new(
            serialport::ErrorKind::NoDevice,
            "/dev/ttyUSB0",
        ));
        assert!(matches!(err, Error::SerialDeviceInUseOrDisconnected(_)));

        let err = Error::from(serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::TimedOut),
            "timed out",
        ));
        assert!(err.is_timeout());

        let err = Error::from(serialport::Error::new(
            serialport::ErrorKind::InvalidInput,
            "bad baud rate",
        ));
        assert!(matches!(err, Error::Io(e) if e.kind() == std::io::ErrorKind::InvalidInput));
    }

    #[test]
    fn reply_errors_round_trip_through_error() {
        let err: Error = ReplyError::from(DeviceAbsentError::new()).into();
        assert!(err.is_absent());
        let back = ReplyError::try_from(err).unwrap();
        assert!(matches!(back, ReplyError::Absent(_)));

        let err: Error = SetpointRangeError::new(150.0, 100.0).into();
        assert!(ReplyError::try_from(err).is_err());
    }
}
