//! Timed write-then-read transactions over a [`Backend`].
//!
//! The instruments this crate talks to do not frame their replies with a
//! length, so a transaction writes the whole request, waits a fixed settle
//! delay and then drains whatever the instrument managed to send. The
//! transport knows nothing about the content of the frames.

mod options;

pub use options::*;

use crate::{
	backend::{Backend, UNKNOWN_BACKEND_NAME},
	error::LockPoisonedError,
	journal::{Direction, LogRecord, TransactionLog},
};
use std::{
	io,
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

/// A [`Transport`] shared by every client bound to the same port.
///
/// Clients hold the lock for the whole of an operation, so the transactions
/// of one operation are never interleaved with those of another.
pub type SharedTransport<B> = Arc<Mutex<Transport<B>>>;

/// Exclusive owner of one open [`Backend`] and its [`TransactionLog`].
pub struct Transport<B> {
	/// The underlying backend
	backend: B,
	/// Where frames and events are recorded.
	journal: TransactionLog,
}

impl<B> std::fmt::Debug for Transport<B> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Transport")
			.field("journal", &self.journal)
			.finish_non_exhaustive()
	}
}

impl<B: Backend> Transport<B> {
	/// Create a transport over `backend` with the journal disabled.
	pub fn from_backend(backend: B) -> Self {
		Transport {
			backend,
			journal: TransactionLog::disabled(),
		}
	}

	/// Replace the journal.
	pub fn set_journal(&mut self, journal: TransactionLog) -> &mut Self {
		self.journal = journal;
		self
	}

	/// Get a reference to the underlying backend.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Get a mutable reference to the underlying backend.
	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}

	/// Consume the transport and return the underlying backend.
	pub fn into_inner(self) -> B {
		self.backend
	}

	/// Wrap the transport so it can be shared by several clients.
	pub fn into_shared(self) -> SharedTransport<B> {
		Arc::new(Mutex::new(self))
	}

	/// The name of the backend, for logging.
	fn backend_name(&self) -> String {
		self.backend
			.name()
			.unwrap_or_else(|| UNKNOWN_BACKEND_NAME.to_string())
	}

	/// Write `frame`, wait `settle_delay`, then read whatever has arrived.
	///
	/// The read happens exactly once and only if some bytes are buffered, so an
	/// instrument that does not answer in time yields an empty reply rather
	/// than an error. There is no retry.
	pub fn transact(&mut self, frame: &[u8], settle_delay: Duration) -> io::Result<Vec<u8>> {
		let backend_name = self.backend_name();
		log::debug!(
			"{} TX:   {}",
			backend_name,
			String::from_utf8_lossy(frame).trim_end()
		);
		self.backend.write_all(frame)?;
		self.backend.flush()?;
		self.record(&LogRecord::frame(Direction::Tx, frame));

		if !settle_delay.is_zero() {
			std::thread::sleep(settle_delay);
		}

		let available = self.backend.bytes_to_read()?;
		if available == 0 {
			log::debug!("{} RECV: <nothing>", backend_name);
			return Ok(Vec::new());
		}
		let mut reply = vec![0; available];
		let read = self.backend.read(&mut reply)?;
		reply.truncate(read);
		log::debug!(
			"{} RECV: {}",
			backend_name,
			String::from_utf8_lossy(&reply).trim_end()
		);
		self.record(&LogRecord::frame(Direction::Recv, &reply));
		Ok(reply)
	}

	/// Append `record` to the journal.
	///
	/// A journal that cannot be written is reported with `log::error!` and
	/// otherwise ignored.
	pub fn record(&mut self, record: &LogRecord) {
		if let Err(e) = self.journal.append(record) {
			log::error!(
				"{} failed to append to the transaction log: {}",
				self.backend_name(),
				e
			);
		}
	}
}

/// Lock a shared transport, reporting a poisoned lock as an error.
pub(crate) fn lock<B>(
	transport: &SharedTransport<B>,
) -> Result<MutexGuard<'_, Transport<B>>, LockPoisonedError> {
	transport.lock().map_err(|_| LockPoisonedError::new())
}
