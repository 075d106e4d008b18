//! NUL-delimited message transport over a raw byte stream.
//!
//! This is the framing the browser uses with `--remote-debugging-pipe`: every
//! JSON message is followed by a single `\0` byte. JSON text never contains a
//! raw NUL, so the delimiter is unambiguous.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::{TransportParts, TransportReceiver, TransportSender};
use crate::error::{Error, Result};

/// Byte terminating every message.
pub const MESSAGE_DELIMITER: u8 = 0;

/// Size of a single read from the underlying stream.
const READ_CHUNK: usize = 4096;

/// Upper bound on one message; a peer exceeding it is treated as broken.
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Reassembles complete messages from a byte stream.
///
/// A read may return part of a message, several messages, or exactly one
/// chunk's worth of bytes; none of these is taken as a boundary. Only the
/// delimiter ends a message.
pub struct MessageFramer<R> {
	reader: R,
	buffer: Vec<u8>,
	/// Prefix of `buffer` already known to contain no delimiter.
	scanned: usize,
	chunk: Box<[u8]>,
}

impl<R> MessageFramer<R>
where
	R: AsyncRead + Unpin + Send,
{
	pub fn new(reader: R) -> Self {
		Self::with_chunk_size(reader, READ_CHUNK)
	}

	/// Uses a custom read size.
	pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
		Self {
			reader,
			buffer: Vec::new(),
			scanned: 0,
			chunk: vec![0; chunk_size.max(1)].into_boxed_slice(),
		}
	}

	/// Reads until one complete message is buffered and returns it.
	///
	/// Returns `Ok(None)` on EOF at a message boundary. EOF in the middle of
	/// a message, a read error, or an oversized message is an error.
	pub async fn next_message(&mut self) -> Result<Option<Vec<u8>>> {
		loop {
			if let Some(offset) = self.buffer[self.scanned..]
				.iter()
				.position(|byte| *byte == MESSAGE_DELIMITER)
			{
				let end = self.scanned + offset;
				let mut message: Vec<u8> = self.buffer.drain(..=end).collect();
				message.pop();
				self.scanned = 0;

				if message.is_empty() {
					continue;
				}
				trace!(len = message.len(), "framed message");
				return Ok(Some(message));
			}

			self.scanned = self.buffer.len();
			if self.buffer.len() > MAX_MESSAGE_SIZE {
				return Err(Error::TransportError(format!(
					"message exceeds {MAX_MESSAGE_SIZE} bytes without a delimiter"
				)));
			}

			let read = self.reader.read(&mut *self.chunk).await?;
			if read == 0 {
				if self.buffer.is_empty() {
					return Ok(None);
				}
				return Err(Error::TransportError(format!(
					"stream closed inside a message ({} bytes buffered)",
					self.buffer.len()
				)));
			}
			self.buffer.extend_from_slice(&self.chunk[..read]);
		}
	}
}

impl<R> TransportReceiver for MessageFramer<R>
where
	R: AsyncRead + Unpin + Send,
{
	fn recv(&mut self) -> BoxFuture<'_, Result<Option<Vec<u8>>>> {
		self.next_message().boxed()
	}
}

/// Writes NUL-terminated messages.
pub struct PipeTransportSender<W> {
	writer: W,
}

impl<W> PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	pub fn new(writer: W) -> Self {
		Self { writer }
	}
}

impl<W> TransportSender for PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	fn send(&mut self, message: Vec<u8>) -> BoxFuture<'_, Result<()>> {
		async move {
			if message.contains(&MESSAGE_DELIMITER) {
				return Err(Error::TransportError(
					"outbound message contains the delimiter byte".to_string(),
				));
			}
			self.writer.write_all(&message).await?;
			self.writer.write_all(&[MESSAGE_DELIMITER]).await?;
			self.writer.flush().await?;
			Ok(())
		}
		.boxed()
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		async move {
			self.writer.shutdown().await?;
			Ok(())
		}
		.boxed()
	}
}

/// A transport over a writer/reader pair, e.g. a child's pipes or a socket.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: MessageFramer<R>,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	/// Creates a transport writing to `writer` and reading from `reader`.
	pub fn new(writer: W, reader: R) -> Self {
		Self {
			sender: PipeTransportSender::new(writer),
			receiver: MessageFramer::new(reader),
		}
	}

	/// Splits into the concrete halves.
	pub fn split(self) -> (PipeTransportSender<W>, MessageFramer<R>) {
		(self.sender, self.receiver)
	}

	/// Boxes both halves for [`Connection::new`](crate::Connection::new).
	pub fn into_parts(self) -> TransportParts {
		TransportParts {
			sender: Box::new(self.sender),
			receiver: Box::new(self.receiver),
		}
	}
}
