/**
 * Connection Handles
 *
 * A `ConnectionHandle` is the sending side of one live WebSocket. The socket
 * itself is owned by a single writer task (see `hub::socket`) that drains a
 * bounded queue, so every frame written to a socket goes through that queue
 * and writes from different producers (direct messages, presence events) are
 * serialized without an explicit write lock.
 *
 * Handles are cheap to clone and compare by connection id, never by user.
 */

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Queue depth per socket before sends start failing with `QueueFull`
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Identifier of one physical connection
pub type ConnectionId = Uuid;

/// Reasons a frame could not be queued for a connection
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The writer task has exited (socket closed or errored)
    #[error("connection closed")]
    Closed,
    /// The client is not draining its queue fast enough
    #[error("connection outbound queue is full")]
    QueueFull,
}

/// Sending half of one live connection
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its writer task drains
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        Self::with_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: Uuid::new_v4(),
                outbound,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a text frame without waiting
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        self.outbound.try_send(text.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Whether the writer side has gone away
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}
