use crate::error::ClientError;
use beam_core::{ClientMessage, PeerId, ServerMessage};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const WELCOME_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket link to the signaling relay, split into two channels.
///
/// Dropping `outbound` closes the socket, which the relay treats as a leave.
pub struct RelayConnection {
    pub peer_id: PeerId,
    pub outbound: mpsc::UnboundedSender<ClientMessage>,
    pub inbound: mpsc::UnboundedReceiver<ServerMessage>,
}

impl RelayConnection {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(url).await?;
        let (mut write, mut read) = stream.split();

        let peer_id = tokio::time::timeout(WELCOME_TIMEOUT, async {
            while let Some(frame) = read.next().await {
                let Message::Text(text) = frame? else { continue };
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::Welcome { peer_id }) => return Ok(peer_id),
                    Ok(other) => debug!("Ignoring {:?} before welcome", other),
                    Err(e) => warn!("Invalid relay frame: {}", e),
                }
            }
            Err(ClientError::Relay("closed before welcome".to_string()))
        })
        .await
        .map_err(|_| ClientError::Relay("timed out waiting for welcome".to_string()))??;
        info!("Connected to relay as {}", peer_id);

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode relay frame: {}", e);
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.send(Message::Close(None)).await;
            debug!("Relay writer stopped");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid relay frame: {}", e),
                }
            }
            debug!("Relay reader stopped");
        });

        Ok(Self {
            peer_id,
            outbound,
            inbound,
        })
    }
}
