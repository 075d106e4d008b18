//! WebSocket transport: one protocol message per text or binary frame.

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::debug;

use super::{TransportParts, TransportReceiver, TransportSender};
use crate::error::{Error, Result};

/// Origin presented during the handshake; the browser rejects unknown origins.
const ORIGIN: &str = "http://localhost/";

/// Entry point for WebSocket transports.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Performs the WebSocket handshake against `url` (`ws://` or `wss://`).
	pub async fn connect(url: &str) -> Result<TransportParts> {
		let mut request = url
			.into_client_request()
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		request
			.headers_mut()
			.insert("Origin", HeaderValue::from_static(ORIGIN));

		let (stream, _response) = connect_async(request)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		debug!(url, "websocket connected");

		Ok(Self::from_stream(stream))
	}

	/// Wraps an already-established WebSocket stream.
	pub fn from_stream<S>(stream: WebSocketStream<S>) -> TransportParts
	where
		S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
	{
		let (sink, stream) = stream.split();
		TransportParts {
			sender: Box::new(WebSocketTransportSender { sink }),
			receiver: Box::new(WebSocketTransportReceiver { stream }),
		}
	}
}

pub struct WebSocketTransportSender<S> {
	sink: SplitSink<WebSocketStream<S>, Message>,
}

impl<S> TransportSender for WebSocketTransportSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
{
	fn send(&mut self, message: Vec<u8>) -> BoxFuture<'_, Result<()>> {
		async move {
			let text = String::from_utf8(message)
				.map_err(|e| Error::TransportError(format!("outbound message is not UTF-8: {e}")))?;
			self.sink
				.send(Message::Text(text))
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		}
		.boxed()
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		async move {
			match self.sink.close().await {
				Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
				Err(e) => Err(Error::TransportError(e.to_string())),
			}
		}
		.boxed()
	}
}

pub struct WebSocketTransportReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
}

impl<S> TransportReceiver for WebSocketTransportReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send,
{
	fn recv(&mut self) -> BoxFuture<'_, Result<Option<Vec<u8>>>> {
		async move {
			while let Some(frame) = self.stream.next().await {
				match frame {
					Ok(Message::Text(text)) => return Ok(Some(text.into_bytes())),
					Ok(Message::Binary(bytes)) => return Ok(Some(bytes)),
					Ok(Message::Close(frame)) => {
						debug!(?frame, "websocket closed by peer");
						return Ok(None);
					}
					// Ping/pong are answered by tungstenite itself.
					Ok(_) => continue,
					Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return Ok(None),
					Err(e) => return Err(Error::TransportError(e.to_string())),
				}
			}
			Ok(None)
		}
		.boxed()
	}
}
