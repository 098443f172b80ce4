use crate::{RelayCommand, SignalingService};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use beam_core::{ClientMessage, PeerId, ServerMessage};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let peer_id = PeerId::new();
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    service.add_peer(peer_id.clone(), tx);
    service.send_message(
        &peer_id,
        ServerMessage::Welcome {
            peer_id: peer_id.clone(),
        },
    );
    service.send_message(
        &peer_id,
        ServerMessage::IceConfig {
            ice_servers: service.get_ice_servers(),
        },
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::JoinRoom { room_id }) => {
                            let cmd = RelayCommand::Join {
                                peer_id: peer_id.clone(),
                                room_id,
                            };
                            if !service.relay(cmd).await {
                                break;
                            }
                        }
                        Ok(ClientMessage::Signal { room_id, envelope }) => {
                            let cmd = RelayCommand::Signal {
                                peer_id: peer_id.clone(),
                                room_id,
                                envelope,
                            };
                            if !service.relay(cmd).await {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", peer_id.short(), e),
                    },
                    Message::Binary(_) => {
                        warn!("Ignoring binary frame from {}", peer_id.short());
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.remove_peer(&peer_id);
    service
        .relay(RelayCommand::Leave {
            peer_id: peer_id.clone(),
        })
        .await;
    info!("WebSocket disconnected: {}", peer_id);
}
