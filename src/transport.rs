//! Frame transport seam.
//!
//! The session only ever sees text frames. [`FrameSink`] is owned by the
//! dispatcher (the single writer), [`FrameSource`] by the read loop. The
//! WebSocket implementation lives in [`crate::ws`]; any other pair of halves
//! can be plugged in through [`crate::Client::from_transport`].

use async_trait::async_trait;

use crate::error::TransportError;
use crate::ws::{WsReader, WsWriter};

/// Outbound half of a frame transport.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Terminate the connection. Called once, during session teardown.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Inbound half of a frame transport.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, `Some(Err(_))` on a read failure, `None` once the
    /// connection has ended.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
}

#[async_trait]
impl FrameSink for WsWriter {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.send_text(frame).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        WsWriter::close(self).await
    }
}

#[async_trait]
impl FrameSource for WsReader {
    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        self.recv_text().await
    }
}
