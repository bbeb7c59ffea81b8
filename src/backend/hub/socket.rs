/**
 * WebSocket Pump
 *
 * Drives one upgraded socket: a spawned writer task forwards queued frames from
 * the connection's `ConnectionHandle` to the socket, while the calling task
 * runs the inbound read loop until the peer closes or a read fails.
 *
 * Ping/pong is answered by axum itself; only text and UTF-8 binary frames
 * reach the frame callback.
 */

use std::future::Future;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// Run a socket until it closes
///
/// `on_frame` is awaited for every inbound text frame, in arrival order. The
/// writer task is stopped once the read side ends.
pub async fn run_socket<F, Fut>(socket: WebSocket, mut outbound: mpsc::Receiver<String>, mut on_frame: F)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ()>,
{
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                tracing::warn!("[Hub] Socket write failed, stopping writer: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => on_frame(text.as_str().to_owned()).await,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => on_frame(text).await,
                Err(_) => tracing::debug!("[Hub] Dropping non-UTF-8 binary frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Hub] Socket read ended: {}", e);
                break;
            }
        }
    }

    writer.abort();
}
