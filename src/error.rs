//! Error types for the hub client.
//!
//! Each layer has its own enum: [`TransportError`] for the WebSocket
//! connection, [`DecodeError`] for inbound frames, [`LookupError`] for the
//! device directory, and [`ClientError`] for everything a caller of
//! [`crate::Client`] can observe.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors surfaced by the public client API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured hub address could not be split into host and port.
    #[error("invalid hub address {host:?}: {reason}")]
    InvalidHost {
        /// Address as configured.
        host: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The initial connection to the hub failed.
    #[error("failed to connect to {host}: {source}")]
    Connect {
        /// `host:port` that was dialled (credentials are never included).
        host: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    /// The request frame could not be written to the connection.
    #[error("failed to send request {correlation_id}: {source}")]
    Send {
        /// Correlation id of the request that was lost.
        correlation_id: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The session has shut down, or shut down before a response arrived.
    #[error("client closed")]
    Closed,
}

/// Errors from the frame transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket URL or one of the handshake headers was rejected.
    #[error("invalid WebSocket request: {0}")]
    InvalidRequest(String),

    /// Protocol or I/O failure inside the WebSocket stack.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The connection is no longer usable.
    #[error("connection closed")]
    Closed,
}

/// Reasons an inbound frame could not be turned into a [`crate::Response`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not a JSON object.
    #[error("frame is not a JSON object: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The `CommandType` tag is missing or not one the client understands.
    #[error("unsupported command type: {0:?}")]
    UnsupportedCommandType(String),

    /// A field required by the command type is absent.
    #[error("{command_type} frame is missing field {field:?}")]
    MissingField {
        /// Command type being decoded.
        command_type: &'static str,
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A field is present but has the wrong shape.
    #[error("{command_type} frame has invalid field {field:?}: {source}")]
    InvalidField {
        /// Command type being decoded.
        command_type: &'static str,
        /// Wire name of the offending field.
        field: &'static str,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from resolving a device resource path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The resource path does not have one, two or three segments.
    #[error("resource must have 1, 2 or 3 parts: {0:?}")]
    InvalidResource(String),

    /// No device in the current snapshot matches.
    #[error("could not find device {0:?}")]
    DeviceNotFound(String),
}

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
