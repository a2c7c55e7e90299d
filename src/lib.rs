//! Almond Hub - WebSocket client for the Securifi Almond local API.
//!
//! This crate talks to an Almond home-automation hub over its JSON
//! WebSocket interface: it sends requests, correlates replies, and fans
//! unsolicited events out to subscribers.
//!
//! # Architecture
//!
//! The crate follows a single-owner session pattern:
//!
//! - **Client** - Public handle; allocates correlation ids and enqueues work
//! - **Dispatcher** - Task that owns pending requests and subscribers
//! - **Read loop** - Task that decodes incoming frames
//! - **Transport** - WebSocket adapter (replaceable in tests)
//!
//! # Modules
//!
//! - [`client`] - Session handle, response handles, subscriptions
//! - [`protocol`] - Message types and frame decoding
//! - [`directory`] - Resource-path device lookup and value encoding
//! - [`config`] - Connection settings and configuration loading

// Library modules
pub mod client;
pub mod directory;
pub mod protocol;
pub mod transport;
pub mod ws;

pub mod config;
pub mod constants;
pub mod error;

// Re-export commonly used types
pub use client::{Client, EventFilter, ResponseHandle, Subscription};
pub use config::{ClientConfig, Config};
pub use directory::{encode_value, DeviceDirectory, DeviceQuery, DeviceTarget};
pub use error::{ClientError, DecodeError, LookupError, TransportError};
pub use protocol::{decode_response, CommandType, Device, DeviceList, Request, Response};
