//! Protocol and session constants.

use std::time::Duration;

/// Host used when the configured address leaves it empty.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the Almond WebSocket API listens on.
pub const DEFAULT_PORT: &str = "7681";

/// `Origin` header value the hub expects during the handshake.
pub const ORIGIN: &str = "local.host";

/// Capacity of every subscriber queue. Deliveries beyond this are dropped.
pub const SUBSCRIBER_CAPACITY: usize = 10;

/// Capacity of the caller → dispatcher command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Capacity of the read loop → dispatcher response queue.
pub const RESPONSE_QUEUE_CAPACITY: usize = 64;

/// How often long-running consumers refresh the full device list.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How long the CLI waits for a reply to a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on closing the connection during teardown. A peer that has
/// stopped reading can stall the close handshake forever.
pub const SINK_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);
