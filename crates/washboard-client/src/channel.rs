//! Realtime status channel.
//!
//! One WebSocket per session, authenticated with a Bearer header on the
//! upgrade request. Inbound text frames are forwarded verbatim to the
//! application, which owns parsing and routing; this module only keeps the
//! socket alive (pong replies) and reports the close.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{client::IntoClientRequest, protocol::Message},
};
use washboard_core::BoardError;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Event from an open status channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A raw text frame arrived.
    Message(String),
    /// The channel closed. Always the final event.
    Closed,
}

/// Connect the status channel and spawn its reader.
///
/// Returns once the upgrade completes; frames then arrive on the returned
/// receiver until a [`ChannelEvent::Closed`].
///
/// # Errors
///
/// Returns a transport error when the URL is invalid or the connection or
/// upgrade fails.
pub async fn connect(url: &str, token: &str) -> Result<UnboundedReceiver<ChannelEvent>, BoardError> {
    let request = authenticated_request(url, token)?;
    let (ws, _response) =
        connect_async(request).await.map_err(|err| BoardError::Transport(err.to_string()))?;
    tracing::info!(%url, "status channel connected");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(read_loop(ws, tx));
    Ok(rx)
}

fn authenticated_request(
    url: &str,
    token: &str,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, BoardError> {
    let mut request = url
        .into_client_request()
        .map_err(|err| BoardError::Transport(format!("invalid channel URL '{url}': {err}")))?;
    let header = format!("Bearer {token}")
        .parse()
        .map_err(|err| BoardError::Transport(format!("invalid auth header: {err}")))?;
    request.headers_mut().insert("Authorization", header);
    Ok(request)
}

async fn read_loop(mut ws: WsStream, tx: UnboundedSender<ChannelEvent>) {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                if tx.send(ChannelEvent::Message(text.to_string())).is_err() {
                    // Receiver dropped; the session is over.
                    break;
                }
            }
            Some(Ok(Message::Ping(data))) => {
                let _ = ws.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                tracing::warn!(%err, "status channel read failed");
                break;
            }
        }
    }
    let _ = tx.send(ChannelEvent::Closed);
}
