//! WebSocket transport.
//!
//! Thin wrapper around `tokio-tungstenite` providing type-isolated
//! reader/writer halves. The rest of the crate talks to these halves through
//! the [`crate::transport`] traits and never touches `tokio-tungstenite`
//! directly.
//!
//! [`connect`] builds the handshake request, inserts headers, and returns a
//! ([`WsWriter`], [`WsReader`]) pair so the writer can live in the dispatcher
//! task while the reader lives in the read loop.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use crate::error::TransportError;

/// Concrete WebSocket stream type (avoids repeating the generic everywhere).
type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send a UTF-8 text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails (connection closed, I/O error).
    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(tungstenite::Message::Text(text))
            .await
            .map_err(TransportError::from)
    }

    /// Flush pending writes, send a close frame and close the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if closing fails.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        match self.sink.close().await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Receive the next text payload, returning `None` once the hub closes
    /// the connection or the stream ends.
    ///
    /// Binary frames are accepted when they hold UTF-8. Control frames are
    /// answered by tungstenite and skipped here.
    pub async fn recv_text(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => return Some(Ok(text)),
                Ok(tungstenite::Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => log::warn!("[Almond] Dropping non-UTF-8 binary frame: {}", e),
                },
                Ok(tungstenite::Message::Close(frame)) => {
                    match frame {
                        Some(frame) => log::info!(
                            "[Almond] Connection closed by hub ({} {})",
                            u16::from(frame.code),
                            frame.reason
                        ),
                        None => log::info!("[Almond] Connection closed by hub"),
                    }
                    return None;
                }
                Ok(
                    tungstenite::Message::Ping(_)
                    | tungstenite::Message::Pong(_)
                    | tungstenite::Message::Frame(_),
                ) => {}
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Connect to a WebSocket URL with optional headers.
///
/// Builds an HTTP request from `url`, inserts each `(name, value)` header,
/// then performs the WebSocket handshake. Returns split (writer, reader)
/// halves.
///
/// # Errors
///
/// Returns an error if the URL is invalid, header values are malformed,
/// or the WebSocket handshake fails.
pub async fn connect(
    url: &str,
    headers: &[(&str, &str)],
) -> Result<(WsWriter, WsReader), TransportError> {
    use tungstenite::client::IntoClientRequest;

    let mut request = url
        .into_client_request()
        .map_err(|e| TransportError::InvalidRequest(format!("invalid WebSocket URL: {e}")))?;

    for &(name, value) in headers {
        let header_name = tungstenite::http::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("invalid header name {name}: {e}")))?;
        let header_value = tungstenite::http::HeaderValue::from_str(value).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid header value for {name}: {e}"))
        })?;
        request.headers_mut().insert(header_name, header_value);
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request).await?;

    let (sink, stream) = ws_stream.split();

    Ok((WsWriter { sink }, WsReader { stream }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_invalid_url_returns_error() {
        let result = connect("not-a-url", &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connect_invalid_header_returns_error() {
        let result = connect("ws://127.0.0.1:1/", &[("Bad Header", "x")]).await;
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_connect_unreachable_host_returns_error() {
        let result = connect("ws://127.0.0.1:1/invalid", &[]).await;
        assert!(result.is_err());
    }
}
