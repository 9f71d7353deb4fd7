//! An append-only audit log of transactions.
//!
//! Every [`Transport`](crate::transport::Transport) carries a
//! [`TransactionLog`] that records each frame written and read, along with
//! local events such as rejected set points or instruments that did not
//! answer. Each record is one line:
//!
//! ```text
//! 2024-05-01 14:03:59 -- TX @@@230FS?;E8
//! ERROR 2024-05-01 14:04:00 -- No device found on address 231
//! ```

use chrono::{DateTime, Local};
use std::{
	fs::OpenOptions,
	io::{self, Write},
	path::PathBuf,
};

/// The format of the timestamp at the start of each line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The file the journal is written to unless configured otherwise.
pub const DEFAULT_PATH: &str = "mfc.log";

/// The direction a frame was sent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
	/// The frame was transmitted to an instrument.
	Tx,
	/// The frame was received from an instrument.
	Recv,
}

impl std::fmt::Display for Direction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Direction::Tx => f.write_str("TX"),
			Direction::Recv => f.write_str("RECV"),
		}
	}
}

/// One entry in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
	/// When the record was created.
	pub timestamp: DateTime<Local>,
	/// The direction of the frame, or `None` for a local event.
	pub direction: Option<Direction>,
	/// The frame, as text, or a description of the event.
	pub text: String,
	/// Whether the record reports a failure.
	pub is_error: bool,
}

impl LogRecord {
	/// A record of `frame` being sent in `direction`, timestamped now.
	pub fn frame(direction: Direction, frame: &[u8]) -> Self {
		LogRecord {
			timestamp: Local::now(),
			direction: Some(direction),
			text: String::from_utf8_lossy(frame).trim_end().to_string(),
			is_error: false,
		}
	}

	/// A record of a local event, timestamped now.
	pub fn event<S: Into<String>>(text: S) -> Self {
		LogRecord {
			timestamp: Local::now(),
			direction: None,
			text: text.into(),
			is_error: false,
		}
	}

	/// A record of a local failure, timestamped now.
	pub fn error<S: Into<String>>(text: S) -> Self {
		LogRecord {
			is_error: true,
			..LogRecord::event(text)
		}
	}

	/// Render the record as a line, without the trailing newline.
	pub fn line(&self) -> String {
		let prefix = if self.is_error { "ERROR " } else { "" };
		let timestamp = self.timestamp.format(TIMESTAMP_FORMAT);
		match self.direction {
			Some(direction) => format!("{prefix}{timestamp} -- {direction} {}", self.text),
			None => format!("{prefix}{timestamp} -- {}", self.text),
		}
	}
}

/// Where journal lines go.
enum Sink {
	Disabled,
	/// Opened in append mode for every record.
	File(PathBuf),
	Writer(Box<dyn Write + Send>),
}

/// The destination of journal records.
///
/// ## Example
///
/// ```rust
/// # use gasline::journal::TransactionLog;
/// let journal = TransactionLog::file("gasline.log");
/// # let _ = journal;
/// ```
pub struct TransactionLog {
	sink: Sink,
}

impl TransactionLog {
	/// A journal that discards every record.
	pub fn disabled() -> Self {
		TransactionLog {
			sink: Sink::Disabled,
		}
	}

	/// A journal appended to the file at `path`.
	///
	/// The file is created if it does not exist, and is opened anew for every
	/// record so that it can be rotated or removed while the program runs.
	pub fn file<P: Into<PathBuf>>(path: P) -> Self {
		TransactionLog {
			sink: Sink::File(path.into()),
		}
	}

	/// A journal written to an arbitrary writer.
	pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
		TransactionLog {
			sink: Sink::Writer(Box::new(writer)),
		}
	}

	/// Whether records are written anywhere.
	pub fn is_enabled(&self) -> bool {
		!matches!(self.sink, Sink::Disabled)
	}

	/// Append `record` as a single line.
	pub fn append(&mut self, record: &LogRecord) -> io::Result<()> {
		let mut line = record.line();
		line.push('\n');
		match &mut self.sink {
			Sink::Disabled => Ok(()),
			Sink::File(path) => OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)?
				.write_all(line.as_bytes()),
			Sink::Writer(writer) => {
				writer.write_all(line.as_bytes())?;
				writer.flush()
			}
		}
	}
}

impl Default for TransactionLog {
	/// The default journal is appended to [`DEFAULT_PATH`].
	fn default() -> Self {
		TransactionLog::file(DEFAULT_PATH)
	}
}

impl std::fmt::Debug for TransactionLog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let sink = match &self.sink {
			Sink::Disabled => "disabled".to_string(),
			Sink::File(path) => format!("{}", path.display()),
			Sink::Writer(_) => "<writer>".to_string(),
		};
		f.debug_struct("TransactionLog").field("sink", &sink).finish()
	}
}

/// A cloneable in-memory writer, for inspecting journal output in tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
	/// The lines written so far.
	pub fn lines(&self) -> Vec<String> {
		String::from_utf8_lossy(&self.0.lock().unwrap())
			.lines()
			.map(str::to_string)
			.collect()
	}
}

#[cfg(test)]
impl Write for SharedBuffer {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}
