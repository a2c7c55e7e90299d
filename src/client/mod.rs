//! Hub client: public API over one session.
//!
//! A [`Client`] owns two background tasks:
//!
//! - the **read loop** ([`reader`]), which decodes inbound frames, and
//! - the **dispatcher** ([`dispatcher`]), the only code that touches the
//!   pending-request table and the subscriber registry.
//!
//! Callers on any task talk to the dispatcher through a bounded command
//! queue. Every enqueue races the session's shutdown token, so a caller never
//! blocks on a dispatcher that has already stopped.
//!
//! # Example
//!
//! ```no_run
//! use almond_hub::{Client, ClientConfig, CommandType, Request};
//!
//! # async fn demo() -> Result<(), almond_hub::ClientError> {
//! let client = Client::connect(&ClientConfig::new("10.0.0.2:7681", "admin", "secret")).await?;
//!
//! let mut events = client.subscribe(CommandType::DynamicIndexUpdated).await?;
//!
//! let ack = client
//!     .submit(Request::update_device_index("12", "1", "100"))
//!     .await?
//!     .recv()
//!     .await?;
//! println!("hub replied {:?}", ack);
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}", event.command_type());
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod correlation;
mod dispatcher;
mod reader;

pub use correlation::CorrelationIds;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::constants::{COMMAND_QUEUE_CAPACITY, ORIGIN, RESPONSE_QUEUE_CAPACITY, SUBSCRIBER_CAPACITY};
use crate::error::{ClientError, DecodeError, Result};
use crate::protocol::{CommandType, Request, Response};
use crate::transport::{FrameSink, FrameSource};
use dispatcher::{Dispatcher, SessionCommand};

/// Which responses a [`Subscription`] receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    /// Every decoded response.
    #[default]
    All,
    /// Only responses of one command type.
    Only(CommandType),
}

impl EventFilter {
    /// Whether a response of `command_type` passes this filter.
    #[must_use]
    pub fn matches(self, command_type: CommandType) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == command_type,
        }
    }
}

impl From<CommandType> for EventFilter {
    fn from(command_type: CommandType) -> Self {
        Self::Only(command_type)
    }
}

impl FromStr for EventFilter {
    type Err = DecodeError;

    /// The empty string means every command type.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all command types"),
            Self::Only(command_type) => write!(f, "{command_type}"),
        }
    }
}

/// Pending reply to one submitted request.
///
/// Dropping the handle is fine: the reply is discarded when it arrives.
#[derive(Debug)]
pub struct ResponseHandle {
    correlation_id: String,
    response_rx: oneshot::Receiver<Result<Arc<Response>>>,
}

impl ResponseHandle {
    /// Correlation id stamped into the request.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Wait for the matching response.
    ///
    /// # Errors
    ///
    /// [`ClientError::Send`] if the request could not be written, or
    /// [`ClientError::Closed`] if the session ended first.
    pub async fn recv(self) -> Result<Arc<Response>> {
        self.response_rx.await.unwrap_or(Err(ClientError::Closed))
    }
}

/// Live feed of responses matching an [`EventFilter`].
///
/// Delivery is best-effort: if more than
/// [`SUBSCRIBER_CAPACITY`](crate::constants::SUBSCRIBER_CAPACITY) responses
/// are waiting, newer ones are dropped for this subscriber only. The feed
/// ends (`recv` returns `None`) when the session closes.
#[derive(Debug)]
pub struct Subscription {
    filter: EventFilter,
    rx: mpsc::Receiver<Arc<Response>>,
}

impl Subscription {
    /// Filter this subscription was registered with.
    #[must_use]
    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    /// Next response, or `None` once the session has closed.
    pub async fn recv(&mut self) -> Option<Arc<Response>> {
        self.rx.recv().await
    }

    /// Next response if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<Response>> {
        self.rx.try_recv().ok()
    }
}

/// Background tasks of a running session.
#[derive(Debug)]
struct SessionTasks {
    dispatcher: JoinHandle<()>,
    reader: JoinHandle<()>,
}

/// Concurrent client for one hub connection.
///
/// All methods take `&self`; share the client between tasks with an `Arc`.
#[derive(Debug)]
pub struct Client {
    commands: mpsc::Sender<SessionCommand>,
    ids: CorrelationIds,
    shutdown: CancellationToken,
    tasks: Mutex<Option<SessionTasks>>,
}

impl Client {
    /// Connect to the hub and start the session.
    ///
    /// The connection is attempted once; failure is returned immediately.
    /// Must be called from within a Tokio runtime.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let host = config.authority()?;
        let url = config.url()?;

        log::info!("[Almond] Connecting to {}", host);
        let (writer, reader) = crate::ws::connect(&url, &[("Origin", ORIGIN)])
            .await
            .map_err(|source| ClientError::Connect {
                host: host.clone(),
                source,
            })?;
        log::info!("[Almond] Connected to {}", host);

        Ok(Self::from_transport(writer, reader))
    }

    /// Start a session over an already-established transport.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_transport<W, R>(sink: W, source: R) -> Self
    where
        W: FrameSink + 'static,
        R: FrameSource + 'static,
    {
        let shutdown = CancellationToken::new();
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(RESPONSE_QUEUE_CAPACITY);

        let reader = tokio::spawn(reader::run_read_loop(source, response_tx, shutdown.clone()));
        let dispatcher = tokio::spawn(Dispatcher::new(sink).run(
            command_rx,
            response_rx,
            shutdown.clone(),
        ));

        Self {
            commands,
            ids: CorrelationIds::new(),
            shutdown,
            tasks: Mutex::new(Some(SessionTasks { dispatcher, reader })),
        }
    }

    /// Send a request and return a handle for its single reply.
    ///
    /// # Errors
    ///
    /// [`ClientError::Closed`] if the session is shut down or shuts down
    /// while the request is being queued.
    pub async fn submit(&self, mut request: Request) -> Result<ResponseHandle> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let correlation_id = self.ids.next_id();
        request.set_correlation_id(&correlation_id);
        let frame = serde_json::to_string(&request)?;

        let (delivery, response_rx) = oneshot::channel();
        self.enqueue(SessionCommand::Submit {
            correlation_id: correlation_id.clone(),
            frame,
            delivery,
        })
        .await?;

        log::debug!(
            "[Almond] Submitted {} (MobileInternalIndex={})",
            request.command_type(),
            correlation_id
        );
        Ok(ResponseHandle {
            correlation_id,
            response_rx,
        })
    }

    /// Send a request without waiting for its reply.
    ///
    /// # Errors
    ///
    /// [`ClientError::Closed`] if the session is shut down.
    pub async fn request(&self, request: Request) -> Result<()> {
        self.submit(request).await.map(|_| ())
    }

    /// Register for every future response passing `filter`.
    ///
    /// The subscription is live when this returns; earlier responses are not
    /// replayed.
    ///
    /// # Errors
    ///
    /// [`ClientError::Closed`] if the session is shut down.
    pub async fn subscribe(&self, filter: impl Into<EventFilter>) -> Result<Subscription> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let filter = filter.into();
        let (queue, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        let (registered, registered_rx) = oneshot::channel();
        self.enqueue(SessionCommand::Subscribe {
            filter,
            queue,
            registered,
        })
        .await?;
        registered_rx.await.map_err(|_| ClientError::Closed)?;

        Ok(Subscription { filter, rx })
    }

    /// Stop the session and wait for teardown to finish.
    ///
    /// Pending requests resolve to [`ClientError::Closed`] and subscriptions
    /// end. Safe to call repeatedly and from several tasks at once; every call
    /// returns after teardown is complete.
    pub async fn close(&self) {
        self.shutdown.cancel();

        let mut tasks = self.tasks.lock().await;
        if let Some(SessionTasks { dispatcher, reader }) = tasks.take() {
            if let Err(e) = dispatcher.await {
                log::error!("[Almond] Dispatcher task failed: {}", e);
            }
            if let Err(e) = reader.await {
                log::error!("[Almond] Read loop task failed: {}", e);
            }
            log::info!("[Almond] Client closed");
        }
    }

    /// Whether the session has been shut down (by `close`, or because the
    /// connection ended).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn enqueue(&self, command: SessionCommand) -> Result<()> {
        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => Err(ClientError::Closed),
            sent = self.commands.send(command) => sent.map_err(|_| ClientError::Closed),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::TransportError;
    use crate::protocol::UpdateAck;

    /// In-memory transport: frames written by the client land in `sent`,
    /// frames pushed into `inbound` are read by the client.
    struct MockSink {
        sent: mpsc::UnboundedSender<String>,
        closes: Arc<AtomicUsize>,
        fail_sends: bool,
    }

    #[async_trait]
    impl FrameSink for MockSink {
        async fn send(&mut self, frame: String) -> std::result::Result<(), TransportError> {
            if self.fail_sends {
                return Err(TransportError::Closed);
            }
            let _ = self.sent.send(frame);
            Ok(())
        }

        async fn close(&mut self) -> std::result::Result<(), TransportError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockSource {
        inbound: mpsc::UnboundedReceiver<std::result::Result<String, TransportError>>,
    }

    #[async_trait]
    impl FrameSource for MockSource {
        async fn recv(&mut self) -> Option<std::result::Result<String, TransportError>> {
            self.inbound.recv().await
        }
    }

    /// The hub side of a mock session.
    struct MockHub {
        sent: mpsc::UnboundedReceiver<String>,
        inbound: mpsc::UnboundedSender<std::result::Result<String, TransportError>>,
        closes: Arc<AtomicUsize>,
    }

    impl MockHub {
        /// Next frame the client wrote, parsed.
        async fn next_request(&mut self) -> serde_json::Value {
            let frame = within(self.sent.recv()).await.expect("client wrote a frame");
            serde_json::from_str(&frame).expect("request is JSON")
        }

        fn push(&self, frame: serde_json::Value) {
            self.inbound.send(Ok(frame.to_string())).expect("read loop alive");
        }

        fn push_raw(&self, frame: &str) {
            self.inbound.send(Ok(frame.to_string())).expect("read loop alive");
        }

        fn ack(&self, correlation_id: &str, success: &str) {
            self.push(serde_json::json!({
                "MobileInternalIndex": correlation_id,
                "CommandType": "UpdateDeviceIndex",
                "Success": success,
            }));
        }
    }

    fn mock_session(fail_sends: bool) -> (Client, MockHub) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));

        let client = Client::from_transport(
            MockSink {
                sent: sent_tx,
                closes: Arc::clone(&closes),
                fail_sends,
            },
            MockSource { inbound: inbound_rx },
        );
        let hub = MockHub {
            sent: sent_rx,
            inbound: inbound_tx,
            closes,
        };
        (client, hub)
    }

    async fn within<F: std::future::Future>(future: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(5), future)
            .await
            .expect("timed out")
    }

    fn device_list_frame() -> serde_json::Value {
        serde_json::json!({
            "CommandType": "DeviceList",
            "Devices": {"1": {"Data": {"ID": "1", "Name": "Lamp"}, "DeviceValues": {}}}
        })
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let (client, mut hub) = mock_session(false);

        let handle = client
            .submit(Request::update_device_index("dev1", "1", "100"))
            .await
            .unwrap();

        let request = hub.next_request().await;
        assert_eq!(request["CommandType"], "UpdateDeviceIndex");
        assert_eq!(request["ID"], "dev1");
        assert_eq!(request["Index"], "1");
        assert_eq!(request["Value"], "100");
        assert_eq!(request["MobileInternalIndex"], handle.correlation_id());

        hub.ack(handle.correlation_id(), "true");

        let response = within(handle.recv()).await.unwrap();
        let Response::UpdateAck(UpdateAck { meta, success }) = &*response else {
            panic!("expected UpdateAck, got {response:?}");
        };
        assert_eq!(meta.correlation_id, "1");
        assert_eq!(success, "true");
    }

    #[tokio::test]
    async fn test_repeated_response_is_not_misdelivered() {
        let (client, mut hub) = mock_session(false);

        let first = client.submit(Request::device_list()).await.unwrap();
        hub.next_request().await;
        hub.ack("1", "true");
        hub.ack("1", "false");
        let first = within(first.recv()).await.unwrap();
        assert!(matches!(&*first, Response::UpdateAck(a) if a.succeeded()));

        let second = client.submit(Request::device_list()).await.unwrap();
        assert_eq!(second.correlation_id(), "2");
        hub.next_request().await;
        hub.ack("2", "true");

        let second = within(second.recv()).await.unwrap();
        assert_eq!(second.correlation_id(), "2");
        assert!(matches!(&*second, Response::UpdateAck(a) if a.succeeded()));
    }

    #[tokio::test]
    async fn test_typed_and_wildcard_subscribers() {
        let (client, hub) = mock_session(false);

        let mut lists = client.subscribe(CommandType::DeviceList).await.unwrap();
        let mut acks = client.subscribe(CommandType::UpdateDeviceIndex).await.unwrap();
        let mut everything = client.subscribe(EventFilter::All).await.unwrap();

        hub.push(device_list_frame());
        hub.ack("", "true");

        let list = within(lists.recv()).await.unwrap();
        assert_eq!(list.command_type(), CommandType::DeviceList);

        let ack = within(acks.recv()).await.unwrap();
        assert_eq!(ack.command_type(), CommandType::UpdateDeviceIndex);

        let first = within(everything.recv()).await.unwrap();
        let second = within(everything.recv()).await.unwrap();
        assert_eq!(first.command_type(), CommandType::DeviceList);
        assert_eq!(second.command_type(), CommandType::UpdateDeviceIndex);

        // Wire order is preserved, so once the ack has arrived nothing else is
        // queued for the typed subscribers.
        assert!(lists.try_recv().is_none());
        assert!(acks.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_device_list_reaches_typed_and_wildcard_once_each() {
        let (client, hub) = mock_session(false);

        let mut typed = client.subscribe(CommandType::DeviceList).await.unwrap();
        let mut wildcard = client.subscribe("".parse::<EventFilter>().unwrap()).await.unwrap();

        hub.push(device_list_frame());

        let a = within(typed.recv()).await.unwrap();
        let b = within(wildcard.recv()).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        // Push a marker so we know the dispatcher has moved past the list.
        hub.ack("", "true");
        let marker = within(wildcard.recv()).await.unwrap();
        assert_eq!(marker.command_type(), CommandType::UpdateDeviceIndex);
        assert!(typed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_waiter_is_not_counted_as_subscriber() {
        let (client, mut hub) = mock_session(false);

        let mut acks = client.subscribe(CommandType::UpdateDeviceIndex).await.unwrap();
        let handle = client
            .submit(Request::update_device_index("dev1", "1", "0"))
            .await
            .unwrap();
        hub.next_request().await;
        hub.ack(handle.correlation_id(), "true");

        let from_waiter = within(handle.recv()).await.unwrap();
        let from_subscriber = within(acks.recv()).await.unwrap();
        assert!(Arc::ptr_eq(&from_waiter, &from_subscriber));
        assert!(acks.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_full_subscriber_does_not_stall_session() {
        let (client, mut hub) = mock_session(false);

        let mut slow = client.subscribe(CommandType::DeviceList).await.unwrap();
        let mut acks = client.subscribe(CommandType::UpdateDeviceIndex).await.unwrap();

        for _ in 0..(SUBSCRIBER_CAPACITY + 5) {
            hub.push(device_list_frame());
        }

        // The dispatcher keeps serving requests while `slow` is full.
        let handle = client.submit(Request::device_list()).await.unwrap();
        hub.next_request().await;
        hub.ack(handle.correlation_id(), "true");
        within(handle.recv()).await.unwrap();
        within(acks.recv()).await.unwrap();

        let mut received = 0;
        while slow.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_CAPACITY);
    }

    #[tokio::test]
    async fn test_undecodable_frames_are_skipped() {
        let (client, hub) = mock_session(false);
        let mut everything = client.subscribe(EventFilter::All).await.unwrap();

        hub.push_raw("{not json");
        hub.push(serde_json::json!({"CommandType": "SomethingNew"}));
        hub.push(device_list_frame());

        let response = within(everything.recv()).await.unwrap();
        assert_eq!(response.command_type(), CommandType::DeviceList);
        assert!(!client.is_closed());
    }

    #[tokio::test]
    async fn test_send_failure_fails_waiter() {
        let (client, _hub) = mock_session(true);

        let handle = client.submit(Request::device_list()).await.unwrap();
        let err = within(handle.recv()).await.unwrap_err();
        assert!(matches!(err, ClientError::Send { ref correlation_id, .. } if correlation_id == "1"));

        // The session itself survives a failed write.
        assert!(!client.is_closed());
    }

    #[tokio::test]
    async fn test_connection_loss_ends_waiters_and_subscriptions() {
        let (client, mut hub) = mock_session(false);

        let mut events = client.subscribe(EventFilter::All).await.unwrap();
        let handle = client.submit(Request::device_list()).await.unwrap();
        hub.next_request().await;

        // Hub hangs up.
        drop(hub.inbound);

        assert!(matches!(within(handle.recv()).await, Err(ClientError::Closed)));
        assert!(within(events.recv()).await.is_none());
        assert!(client.is_closed());
        assert!(matches!(
            client.submit(Request::device_list()).await,
            Err(ClientError::Closed)
        ));
        assert_eq!(hub.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_error_ends_session() {
        let (client, hub) = mock_session(false);
        let mut events = client.subscribe(EventFilter::All).await.unwrap();

        hub.inbound.send(Err(TransportError::Closed)).unwrap();

        assert!(within(events.recv()).await.is_none());
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn test_close_resolves_pending_and_rejects_new_work() {
        let (client, mut hub) = mock_session(false);

        let mut events = client.subscribe(EventFilter::All).await.unwrap();
        let handle = client.submit(Request::device_list()).await.unwrap();
        hub.next_request().await;

        within(client.close()).await;

        assert!(matches!(handle.recv().await, Err(ClientError::Closed)));
        assert!(events.recv().await.is_none());
        assert!(matches!(
            client.submit(Request::device_list()).await,
            Err(ClientError::Closed)
        ));
        assert!(matches!(
            client.request(Request::device_list()).await,
            Err(ClientError::Closed)
        ));
        assert!(matches!(
            client.subscribe(EventFilter::All).await,
            Err(ClientError::Closed)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_close_closes_transport_once() {
        let (client, hub) = mock_session(false);
        let client = Arc::new(client);

        let a = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.close().await }
        });
        let b = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.close().await }
        });
        within(a).await.unwrap();
        within(b).await.unwrap();

        assert!(client.is_closed());
        assert_eq!(hub.closes.load(Ordering::SeqCst), 1);

        within(client.close()).await;
        assert_eq!(hub.closes.load(Ordering::SeqCst), 1);
    }

    /// Sink whose writes never complete, like a socket the hub stopped reading.
    struct StalledSink {
        write_started: Option<oneshot::Sender<()>>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FrameSink for StalledSink {
        async fn send(&mut self, _frame: String) -> std::result::Result<(), TransportError> {
            if let Some(started) = self.write_started.take() {
                let _ = started.send(());
            }
            std::future::pending().await
        }

        async fn close(&mut self) -> std::result::Result<(), TransportError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_close_interrupts_stalled_write() {
        let (started_tx, started_rx) = oneshot::channel();
        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let closes = Arc::new(AtomicUsize::new(0));
        let client = Client::from_transport(
            StalledSink {
                write_started: Some(started_tx),
                closes: Arc::clone(&closes),
            },
            MockSource { inbound: inbound_rx },
        );

        let handle = client.submit(Request::device_list()).await.unwrap();
        within(started_rx).await.unwrap();

        within(client.close()).await;

        assert!(matches!(within(handle.recv()).await, Err(ClientError::Closed)));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_get_distinct_ids() {
        let (client, mut hub) = mock_session(false);
        let client = Arc::new(client);

        let submitters: Vec<_> = (0..16)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move {
                    let mut ids = Vec::new();
                    for _ in 0..20 {
                        let handle = client.submit(Request::device_list()).await.unwrap();
                        ids.push(handle.correlation_id().to_string());
                    }
                    ids
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for submitter in submitters {
            for id in within(submitter).await.unwrap() {
                assert!(ids.insert(id), "duplicate correlation id");
            }
        }
        assert_eq!(ids.len(), 16 * 20);

        let mut written = HashSet::new();
        for _ in 0..ids.len() {
            let request = hub.next_request().await;
            let id = request["MobileInternalIndex"].as_str().unwrap().to_string();
            assert!(written.insert(id));
        }
        assert_eq!(written, ids);
    }

    #[tokio::test]
    async fn test_dropped_handle_discards_reply() {
        let (client, mut hub) = mock_session(false);
        let mut acks = client.subscribe(CommandType::UpdateDeviceIndex).await.unwrap();

        client.request(Request::update_device_index("dev1", "1", "0")).await.unwrap();
        let request = hub.next_request().await;
        hub.ack(request["MobileInternalIndex"].as_str().unwrap(), "true");

        // The reply still reaches subscribers even though nobody awaits it.
        let ack = within(acks.recv()).await.unwrap();
        assert_eq!(ack.correlation_id(), "1");
        assert!(!client.is_closed());
    }

    #[test]
    fn test_event_filter_parsing() {
        assert_eq!("".parse::<EventFilter>().unwrap(), EventFilter::All);
        assert_eq!(
            "DeviceList".parse::<EventFilter>().unwrap(),
            EventFilter::Only(CommandType::DeviceList)
        );
        assert!("Nope".parse::<EventFilter>().is_err());
        assert!(EventFilter::All.matches(CommandType::DynamicClientLeft));
        assert!(!EventFilter::Only(CommandType::DeviceList).matches(CommandType::DynamicClientLeft));
    }
}
