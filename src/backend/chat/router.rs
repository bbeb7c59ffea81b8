/**
 * Direct Message Router
 *
 * Point-to-point delivery between online users. Delivery is gated on
 * presence and best-effort: if the recipient has no live connection the
 * message is dropped, and a failed write is logged. Neither case is reported
 * back to the sender. Nothing is queued, stored or retried here.
 *
 * Independently of delivery, every accepted frame produces a durable
 * direct-message notification through the persistence collaborator.
 */

use std::sync::Arc;

use crate::backend::hub::ConnectionRegistry;
use crate::backend::persistence::{NewNotification, Persistence};
use crate::shared::{ClientFrame, DirectMessage};

/// What happened to one routed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on one of the recipient's connections
    Delivered,
    /// Recipient had no live connection; dropped
    Offline,
    /// Recipient was online but the write failed; dropped
    Failed,
}

pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
    persistence: Arc<dyn Persistence>,
}

impl MessageRouter {
    pub fn new(registry: Arc<ConnectionRegistry>, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            registry,
            persistence,
        }
    }

    /// Deliver `content` from `from_id` to any live connection of `to_id`
    pub async fn route(&self, from_id: &str, to_id: &str, content: &str) -> Delivery {
        let message = DirectMessage::new(from_id, content);
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("[Chat] Failed to encode direct message: {}", e);
                return Delivery::Failed;
            }
        };

        let Some(conn) = self.registry.get_any_connection(to_id).await else {
            tracing::debug!("[Chat] {} is offline, dropping message from {}", to_id, from_id);
            return Delivery::Offline;
        };

        match conn.send_text(json) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                tracing::error!("[Chat] Write to {} failed: {}", to_id, e);
                Delivery::Failed
            }
        }
    }

    /// Process one inbound text frame from `from_id`
    ///
    /// Returns `None` when the frame was ignored (undecodable, wrong type,
    /// missing recipient or content).
    pub async fn handle_frame(&self, from_id: &str, text: &str) -> Option<Delivery> {
        let outgoing = match ClientFrame::parse(text) {
            Ok(frame) => frame.into_outgoing()?,
            Err(e) => {
                tracing::debug!("[Chat] Ignoring malformed frame from {}: {}", from_id, e);
                return None;
            }
        };

        let delivery = self.route(from_id, &outgoing.to, &outgoing.content).await;

        let notification = NewNotification::direct_message(&outgoing.to, from_id, &outgoing.content);
        if let Err(e) = self.persistence.create_notification(notification).await {
            tracing::error!("[Chat] Failed to create direct message notification: {}", e);
        }

        Some(delivery)
    }
}
