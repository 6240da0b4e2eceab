use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant};

use crate::actions::ClientRequest;
use crate::errors::{NetworkError, NetworkResult, SugorokuError};
use crate::game::{ErrorMessage, GameManager};
use crate::hub::{Outbound, SessionHandle, DEFAULT_QUEUE_CAPACITY};
use crate::PlayerId;

/// Per-connection limits and heartbeat timing.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub queue_capacity: usize,
    pub ping_interval: Duration,
    /// Longest silence tolerated from the client; any frame resets it.
    pub pong_wait: Duration,
    pub write_wait: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ping_interval: pong_wait * 9 / 10,
            pong_wait,
            write_wait: Duration::from_secs(10),
        }
    }
}

/// Drives an upgraded socket until either side gives up.
pub async fn serve_socket(
    socket: WebSocket,
    player_id: PlayerId,
    manager: Arc<GameManager>,
    settings: SessionSettings,
) {
    let (sink, stream) = socket.split();
    run_session(sink, stream, player_id, manager, settings).await;
}

/// Joins the player, runs the inbound and outbound loops, and leaves once
/// either loop ends.
///
/// The outbound loop may be aborted at any point. The inbound loop is only
/// ever asked to stop, and it checks between frames, so a request it already
/// handed to the engine always resolves completely.
pub async fn run_session<S, R, E>(
    sink: S,
    stream: R,
    player_id: PlayerId,
    manager: Arc<GameManager>,
    settings: SessionSettings,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let (session, outbound) = SessionHandle::new(player_id.clone(), settings.queue_capacity);
    let session_id = session.id();
    manager.join(session).await;
    log::info!("🔌 WebSocket connected: {} (session {})", player_id, session_id);

    let mut write_task = tokio::spawn(write_pump(
        sink,
        outbound,
        settings.ping_interval,
        settings.write_wait,
    ));
    let (stop_reader, shutdown) = oneshot::channel();
    let mut read_task = tokio::spawn(read_pump(
        stream,
        player_id.clone(),
        Arc::clone(&manager),
        settings.pong_wait,
        shutdown,
    ));

    let ended = tokio::select! {
        result = &mut write_task => {
            let _ = stop_reader.send(());
            if let Err(e) = read_task.await {
                log::error!("❌ Read task for {} failed: {}", player_id, e);
            }
            result
        }
        result = &mut read_task => {
            write_task.abort();
            result
        }
    };
    match ended {
        Ok(Ok(())) => log::info!("👋 WebSocket closed for {}", player_id),
        Ok(Err(e)) => log::warn!("⚠️ WebSocket for {} ended: {}", player_id, e),
        Err(e) => log::error!("❌ Session task for {} failed: {}", player_id, e),
    }

    manager.leave(&player_id, session_id).await;
}

/// Inbound loop: decodes text frames and hands them to the engine. Stops
/// before the next frame once `shutdown` fires or its sender is dropped.
pub async fn read_pump<R, E>(
    mut stream: R,
    player_id: PlayerId,
    manager: Arc<GameManager>,
    pong_wait: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> NetworkResult<()>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let next = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            next = timeout(pong_wait, stream.next()) => next,
        };
        let frame = match next {
            Err(_) => {
                return Err(NetworkError::ConnectionClosed {
                    details: format!("no frame from {player_id} within {pong_wait:?}"),
                })
            }
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => {
                return Err(NetworkError::ConnectionClosed {
                    details: e.to_string(),
                })
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => dispatch_text(&manager, &player_id, text.as_str()).await,
            Message::Close(_) => return Ok(()),
            // Pings, pongs and binary frames only keep the connection alive
            _ => {}
        }
    }
}

/// Outbound loop: forwards queued messages and keeps the client alive with pings.
/// A closed queue ends the loop with a close frame.
pub async fn write_pump<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Outbound>,
    ping_interval: Duration,
    write_wait: Duration,
) -> NetworkResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + ping_interval, ping_interval);
    loop {
        tokio::select! {
            message = outbound.recv() => match message {
                Some(text) => send_with_deadline(&mut sink, Message::Text(text.as_ref().into()), write_wait).await?,
                None => {
                    let _ = send_with_deadline(&mut sink, Message::Close(None), write_wait).await;
                    return Ok(());
                }
            },
            _ = ticker.tick() => {
                send_with_deadline(&mut sink, Message::Ping(Default::default()), write_wait).await?;
            }
        }
    }
}

async fn send_with_deadline<S>(sink: &mut S, message: Message, write_wait: Duration) -> NetworkResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match timeout(write_wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(NetworkError::ConnectionClosed {
            details: e.to_string(),
        }),
        Err(_) => Err(NetworkError::ConnectionClosed {
            details: format!("write did not finish within {write_wait:?}"),
        }),
    }
}

/// Failures go back to the sender only.
async fn dispatch_text(manager: &GameManager, player_id: &str, text: &str) {
    let result = match ClientRequest::parse(text) {
        Ok(request) => manager.handle_request(player_id, request).await,
        Err(e) => Err(SugorokuError::from(e)),
    };
    if let Err(e) = result {
        log::warn!("❌ Request from {} failed: {}", player_id, e);
        if let Err(send_error) = manager
            .hub()
            .send_to_player(player_id, &ErrorMessage::from(&e))
            .await
        {
            log::debug!("📭 Could not report error to {}: {}", player_id, send_error);
        }
    }
}
