//! Semantic instrument commands.
//!
//! A [`Command`] says *what* to ask an instrument. The [`Dialect`] it is sent
//! with decides the mnemonic it is spelled with and how its argument is
//! formatted.

use crate::{dialect::Dialect, error::UnsupportedCommandError};
use std::io;

/// The kind of a [`Command`], without its argument.
///
/// Dialects map each kind they support to a mnemonic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Query the instrument's full scale (upper bound).
    ReadFullScale,
    /// Query the instrument's engineering unit.
    ReadUnit,
    /// Query the instrument's serial number.
    ReadSerialNumber,
    /// Write a flow set point.
    SetFlow,
    /// Read the measured flow.
    ReadFlow,
    /// Read the measured pressure.
    ReadPressure,
    /// Write a pressure set point.
    SetPressure,
    /// Read the output current.
    ReadCurrent,
    /// Read the output frequency.
    ReadFrequency,
}

impl CommandKind {
    /// Whether commands of this kind carry a numeric argument.
    pub fn takes_argument(self) -> bool {
        matches!(self, CommandKind::SetFlow | CommandKind::SetPressure)
    }

    /// A human-readable name for the kind.
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::ReadFullScale => "read full scale",
            CommandKind::ReadUnit => "read unit",
            CommandKind::ReadSerialNumber => "read serial number",
            CommandKind::SetFlow => "set flow",
            CommandKind::ReadFlow => "read flow",
            CommandKind::ReadPressure => "read pressure",
            CommandKind::SetPressure => "set pressure",
            CommandKind::ReadCurrent => "read current",
            CommandKind::ReadFrequency => "read frequency",
        }
    }
}

/// A command to send to an instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Query the instrument's full scale (upper bound).
    ReadFullScale,
    /// Query the instrument's engineering unit.
    ReadUnit,
    /// Query the instrument's serial number.
    ReadSerialNumber,
    /// Write a flow set point.
    SetFlow(f64),
    /// Read the measured flow.
    ReadFlow,
    /// Read the measured pressure.
    ReadPressure,
    /// Write a pressure set point.
    SetPressure(f64),
    /// Read the output current.
    ReadCurrent,
    /// Read the output frequency.
    ReadFrequency,
    /// Send the body verbatim. Useful for diagnostics and commands without a
    /// semantic mapping.
    Raw(String),
}

impl Command {
    /// The kind of the command, or `None` for [`Command::Raw`].
    pub fn kind(&self) -> Option<CommandKind> {
        Some(match self {
            Command::ReadFullScale => CommandKind::ReadFullScale,
            Command::ReadUnit => CommandKind::ReadUnit,
            Command::ReadSerialNumber => CommandKind::ReadSerialNumber,
            Command::SetFlow(_) => CommandKind::SetFlow,
            Command::ReadFlow => CommandKind::ReadFlow,
            Command::ReadPressure => CommandKind::ReadPressure,
            Command::SetPressure(_) => CommandKind::SetPressure,
            Command::ReadCurrent => CommandKind::ReadCurrent,
            Command::ReadFrequency => CommandKind::ReadFrequency,
            Command::Raw(_) => return None,
        })
    }

    /// The command's numeric argument, if any.
    pub fn argument(&self) -> Option<f64> {
        match self {
            Command::SetFlow(value) | Command::SetPressure(value) => Some(*value),
            _ => None,
        }
    }

    /// Build the command from its kind and argument.
    ///
    /// Returns `None` if the presence of `argument` does not match the kind.
    pub fn from_parts(kind: CommandKind, argument: Option<f64>) -> Option<Command> {
        Some(match (kind, argument) {
            (CommandKind::ReadFullScale, None) => Command::ReadFullScale,
            (CommandKind::ReadUnit, None) => Command::ReadUnit,
            (CommandKind::ReadSerialNumber, None) => Command::ReadSerialNumber,
            (CommandKind::SetFlow, Some(value)) => Command::SetFlow(value),
            (CommandKind::ReadFlow, None) => Command::ReadFlow,
            (CommandKind::ReadPressure, None) => Command::ReadPressure,
            (CommandKind::SetPressure, Some(value)) => Command::SetPressure(value),
            (CommandKind::ReadCurrent, None) => Command::ReadCurrent,
            (CommandKind::ReadFrequency, None) => Command::ReadFrequency,
            _ => return None,
        })
    }

    /// Write the command body, as spelled in `dialect`, into `writer`.
    ///
    /// The body excludes any markers, address or checksum.
    pub(crate) fn write_body_into<W: io::Write + ?Sized>(
        &self,
        dialect: &Dialect,
        writer: &mut W,
    ) -> Result<(), BodyError> {
        let Some(kind) = self.kind() else {
            if let Command::Raw(body) = self {
                writer.write_all(body.as_bytes())?;
            }
            return Ok(());
        };
        let mnemonic = dialect
            .mnemonic(kind)
            .ok_or_else(|| UnsupportedCommandError::new(dialect.name, kind.name()))?;
        writer.write_all(mnemonic.as_bytes())?;
        if let Some(value) = self.argument() {
            write!(writer, "{:.*}", dialect.argument_precision, value)?;
        }
        Ok(())
    }

    /// The command body, as spelled in `dialect`.
    pub fn body(&self, dialect: &Dialect) -> Result<String, UnsupportedCommandError> {
        let mut buf = Vec::with_capacity(16);
        match self.write_body_into(dialect, &mut buf) {
            Ok(()) => {}
            Err(BodyError::Unsupported(err)) => return Err(err),
            // Writing into a Vec cannot fail.
            Err(BodyError::Io(_)) => unreachable!(),
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Failure to write a command body.
#[derive(Debug)]
pub(crate) enum BodyError {
    Unsupported(UnsupportedCommandError),
    Io(io::Error),
}

impl From<UnsupportedCommandError> for BodyError {
    fn from(other: UnsupportedCommandError) -> Self {
        BodyError::Unsupported(other)
    }
}

impl From<io::Error> for BodyError {
    fn from(other: io::Error) -> Self {
        BodyError::Io(other)
    }
}

impl From<BodyError> for crate::error::Error {
    fn from(other: BodyError) -> Self {
        match other {
            BodyError::Unsupported(e) => e.into(),
            BodyError::Io(e) => e.into(),
        }
    }
}
