//! Observer WebSocket endpoint.
//!
//! # Design
//! - The socket is split. A relay [`Connection`] reads text frames from one
//!   half while a writer drains the outbound channel into the other.
//! - Binary, ping and pong frames are ignored. A close frame or a read error
//!   ends the session.
//! - The writer closes the socket once every relay sender has gone away.

use std::fmt::Display;
use std::pin::pin;
use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use seedwire_relay::Connection;
use tokio::sync::mpsc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::state::ApiState;

pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        relay_socket(sink, stream, &state).await;
    })
}

/// Run one relay session over a split socket.
pub(crate) async fn relay_socket<Tx, Rx, E>(sink: Tx, stream: Rx, state: &ApiState)
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
    Rx: Stream<Item = Result<Message, E>>,
    E: Display,
{
    let connection = Connection::new(
        Arc::clone(&state.registry),
        state.settings,
        state.telemetry.clone(),
    );
    let connection_id = connection.id();
    let (outbound, frames) = mpsc::channel(state.settings.outbound_buffer.max(1));
    let inbound = pin!(text_frames(stream, connection_id));

    let (outcome, ()) = tokio::join!(
        connection.run(inbound, outbound),
        write_frames(sink, frames, connection_id)
    );
    if let Err(err) = outcome {
        error!(%connection_id, error = %err, "closing observer connection");
    }
}

fn text_frames<Rx, E>(stream: Rx, connection_id: Uuid) -> impl Stream<Item = String>
where
    Rx: Stream<Item = Result<Message, E>>,
    E: Display,
{
    stream
        .take_while(move |frame| {
            let open = match frame {
                Ok(Message::Close(_)) => {
                    debug!(%connection_id, "observer sent close");
                    false
                }
                Ok(_) => true,
                Err(err) => {
                    debug!(%connection_id, error = %err, "observer socket read failed");
                    false
                }
            };
            future::ready(open)
        })
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                _ => None,
            })
        })
}

async fn write_frames<Tx>(mut sink: Tx, mut frames: mpsc::Receiver<String>, connection_id: Uuid)
where
    Tx: Sink<Message> + Unpin,
    Tx::Error: Display,
{
    while let Some(frame) = frames.recv().await {
        if let Err(err) = sink.send(Message::Text(frame.into())).await {
            debug!(%connection_id, error = %err, "observer socket write failed");
            return;
        }
    }
    if let Err(err) = sink.close().await {
        debug!(%connection_id, error = %err, "observer socket close failed");
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use seedwire_relay::RelaySettings;
    use seedwire_test_support::FrameLog;
    use seedwire_test_support::fixtures::{relay_metrics, sample_metadata, settle};
    use seedwire_torrent_core::{MemoryRegistry, MemoryWorker, TorrentWorker, WorkerRegistry};
    use tokio_stream::wrappers::ReceiverStream;

    use super::*;

    fn texts(sent: Vec<Message>) -> FrameLog {
        FrameLog::parse(
            sent.into_iter()
                .filter_map(|message| match message {
                    Message::Text(text) => Some(text.as_str().to_owned()),
                    _ => None,
                })
                .collect(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn socket_frames_drive_the_relay() {
        let registry = Arc::new(MemoryRegistry::new());
        let state = ApiState::new(
            Arc::clone(&registry) as Arc<dyn WorkerRegistry>,
            RelaySettings::default(),
            relay_metrics(),
        );
        let worker = MemoryWorker::new("abc");
        let (inbound, frames) = mpsc::channel::<Result<Message, Infallible>>(8);
        let mut sent = Vec::new();

        let script = async {
            settle().await;
            registry.insert(Arc::clone(&worker) as Arc<dyn TorrentWorker>);
            worker.begin_verifying(sample_metadata());
            worker.mark_ready();
            settle().await;
            inbound
                .send(Ok(Message::Binary(vec![1, 2, 3].into())))
                .await
                .expect("binary frame");
            inbound
                .send(Ok(Message::Text(r#"{"type":"pause","args":["abc"]}"#.into())))
                .await
                .expect("pause frame");
            settle().await;
            inbound
                .send(Ok(Message::Close(None)))
                .await
                .expect("close frame");
        };
        tokio::join!(
            relay_socket(&mut sent, ReceiverStream::new(frames), &state),
            script
        );

        assert!(worker.is_paused());
        assert_eq!(texts(sent).types(), vec!["verifying", "ready"]);
        assert_eq!(state.telemetry.snapshot().connections_active, 0);
        assert_eq!(state.telemetry.snapshot().subscriptions_active, 0);
    }

    #[tokio::test]
    async fn read_errors_end_the_session() {
        let state = ApiState::new(
            Arc::new(MemoryRegistry::new()),
            RelaySettings::default(),
            relay_metrics(),
        );
        let frames = futures_util::stream::iter([Err::<Message, &str>("reset by peer")]);
        let mut sent = Vec::new();

        relay_socket(&mut sent, frames, &state).await;
        assert!(sent.is_empty());
        assert_eq!(state.telemetry.snapshot().connections_active, 0);
    }
}
