//! Session dispatcher.
//!
//! The dispatcher task is the only owner of the pending-request table and the
//! subscriber registry. Callers reach it through [`SessionCommand`]s on a
//! bounded queue, the read loop through decoded [`Response`]s on another, and
//! shutdown arrives through the session's cancellation token. One event is
//! processed at a time, so none of this state needs a lock.
//!
//! ```text
//!   Client::submit ──┐
//!   Client::subscribe┼─► commands ─┐
//!                    │             ├─► Dispatcher ──► FrameSink (writes)
//!   read loop ───────┴─► responses ┘        │
//!                                           ├─► pending waiter (oneshot, once)
//!                                           └─► subscribers (try_send, lossy)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::EventFilter;
use crate::constants::SINK_CLOSE_TIMEOUT;
use crate::error::ClientError;
use crate::protocol::{CommandType, Response};
use crate::transport::FrameSink;

/// One-shot delivery of the reply to a single request.
pub(crate) type Delivery = oneshot::Sender<Result<Arc<Response>, ClientError>>;

/// Work submitted by callers.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    /// Write a request and remember who is waiting for its reply.
    Submit {
        /// Correlation id already stamped into `frame`.
        correlation_id: String,
        /// Serialized request.
        frame: String,
        /// Where the matching response goes.
        delivery: Delivery,
    },
    /// Register a subscriber queue.
    Subscribe {
        /// Which responses the subscriber wants.
        filter: EventFilter,
        /// The subscriber's bounded queue.
        queue: mpsc::Sender<Arc<Response>>,
        /// Signalled once the queue is registered.
        registered: oneshot::Sender<()>,
    },
}

/// Why the dispatcher loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// `close()` or drop of the client.
    Shutdown,
    /// The read loop ended: transport failure or hub hung up.
    ConnectionLost,
}

/// Sole owner of session state.
pub(crate) struct Dispatcher<W> {
    sink: W,
    pending: HashMap<String, Delivery>,
    by_type: HashMap<CommandType, Vec<mpsc::Sender<Arc<Response>>>>,
    wildcard: Vec<mpsc::Sender<Arc<Response>>>,
}

impl<W: FrameSink> Dispatcher<W> {
    pub(crate) fn new(sink: W) -> Self {
        Self {
            sink,
            pending: HashMap::new(),
            by_type: HashMap::new(),
            wildcard: Vec::new(),
        }
    }

    /// Process events until shutdown or until the read loop goes away, then
    /// tear the session down.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut responses: mpsc::Receiver<Response>,
        shutdown: CancellationToken,
    ) {
        let exit = loop {
            tokio::select! {
                () = shutdown.cancelled() => break Exit::Shutdown,

                Some(command) = commands.recv() => self.handle_command(command, &shutdown).await,

                response = responses.recv() => match response {
                    Some(response) => self.route(response),
                    None => break Exit::ConnectionLost,
                },
            }
        };

        if exit == Exit::ConnectionLost {
            log::warn!("[Almond] Read loop ended, closing session");
            // Fails later submissions fast instead of queueing them.
            shutdown.cancel();
        } else {
            log::info!("[Almond] Shutdown requested, closing session");
        }

        // Dropping the receiver drops every queued command and with it the
        // delivery/registration senders, so those callers observe Closed too.
        drop(commands);
        self.teardown().await;
    }

    async fn handle_command(&mut self, command: SessionCommand, shutdown: &CancellationToken) {
        match command {
            SessionCommand::Submit {
                correlation_id,
                frame,
                delivery,
            } => self.submit(correlation_id, frame, delivery, shutdown).await,
            SessionCommand::Subscribe {
                filter,
                queue,
                registered,
            } => {
                match filter {
                    EventFilter::All => self.wildcard.push(queue),
                    EventFilter::Only(command_type) => {
                        self.by_type.entry(command_type).or_default().push(queue);
                    }
                }
                log::debug!("[Almond] Registered subscriber for {}", filter);
                let _ = registered.send(());
            }
        }
    }

    async fn submit(
        &mut self,
        correlation_id: String,
        frame: String,
        delivery: Delivery,
        shutdown: &CancellationToken,
    ) {
        debug_assert!(
            !self.pending.contains_key(&correlation_id),
            "correlation id {correlation_id} already pending"
        );
        self.pending.insert(correlation_id.clone(), delivery);

        // A stalled write must not hold up shutdown; teardown drops the
        // pending entry, so the waiter sees Closed.
        let sent = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                log::debug!("[Almond] Shutdown interrupted write of {}", correlation_id);
                return;
            }
            sent = self.sink.send(frame) => sent,
        };

        if let Err(source) = sent {
            log::error!(
                "[Almond] Failed to write request. MobileInternalIndex: {} Error: {}",
                correlation_id,
                source
            );
            if let Some(delivery) = self.pending.remove(&correlation_id) {
                let _ = delivery.send(Err(ClientError::Send {
                    correlation_id,
                    source,
                }));
            }
            return;
        }
        log::trace!("[Almond] Sent request {}", correlation_id);
    }

    /// Hand a decoded response to its waiter (if any) and to every matching
    /// subscriber.
    fn route(&mut self, response: Response) {
        let response = Arc::new(response);

        let correlation_id = response.correlation_id();
        if !correlation_id.is_empty() {
            if let Some(delivery) = self.pending.remove(correlation_id) {
                if delivery.send(Ok(Arc::clone(&response))).is_err() {
                    log::trace!("[Almond] No live waiter for {}", correlation_id);
                }
            }
        }

        if let Some(subscribers) = self.by_type.get_mut(&response.command_type()) {
            fan_out(subscribers, &response);
        }
        fan_out(&mut self.wildcard, &response);
    }

    async fn teardown(mut self) {
        match tokio::time::timeout(SINK_CLOSE_TIMEOUT, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("[Almond] Error closing connection: {}", e),
            Err(_) => log::warn!("[Almond] Timed out closing connection, dropping it"),
        }

        let abandoned = self.pending.len();
        if abandoned > 0 {
            log::info!("[Almond] Abandoning {} pending request(s)", abandoned);
        }
        // Dropped senders surface as ClientError::Closed / end of stream.
        self.pending.clear();
        self.by_type.clear();
        self.wildcard.clear();
    }
}

/// Best-effort delivery: a full queue loses this response, a dropped
/// subscriber is pruned. Never waits.
fn fan_out(subscribers: &mut Vec<mpsc::Sender<Arc<Response>>>, response: &Arc<Response>) {
    subscribers.retain(|queue| match queue.try_send(Arc::clone(response)) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::trace!(
                "[Almond] Subscriber queue full, dropping {}",
                response.command_type()
            );
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}
