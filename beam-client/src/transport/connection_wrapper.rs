use crate::transport::{
    LinkState, PeerTransport, RemoteDescription, TransportConfig, TransportEvent, TransportFactory,
};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use beam_core::{IceCandidate, IceServerConfig, PeerId};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::setting_engine::SettingEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// SCTP refuses any single message above this size.
pub const MAX_MESSAGE_SIZE: usize = 65_536;

type ChannelSlot = Arc<Mutex<Option<Arc<RTCDataChannel>>>>;

impl From<RTCPeerConnectionState> for LinkState {
    fn from(state: RTCPeerConnectionState) -> Self {
        match state {
            RTCPeerConnectionState::Unspecified | RTCPeerConnectionState::New => LinkState::New,
            RTCPeerConnectionState::Connecting => LinkState::Connecting,
            RTCPeerConnectionState::Connected => LinkState::Connected,
            RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
            RTCPeerConnectionState::Failed => LinkState::Failed,
            RTCPeerConnectionState::Closed => LinkState::Closed,
        }
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

/// WebRTC peer connection with a single data channel.
pub struct ConnectionWrapper {
    pub peer_id: PeerId,
    pub peer_connection: Arc<RTCPeerConnection>,
    channel: ChannelSlot,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl ConnectionWrapper {
    pub async fn new(
        peer_id: PeerId,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let mut settings = SettingEngine::default();
        settings.set_include_loopback_candidate(config.include_loopback);

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .with_setting_engine(settings)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);
        let channel: ChannelSlot = Arc::new(Mutex::new(None));

        let state_tx = event_tx.clone();
        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {}", uid.short(), s);
                    let _ = tx
                        .send(TransportEvent::StateChanged(uid, LinkState::from(s)))
                        .await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(uid, candidate))
                    .await;
            })
        }));

        // Responder side: the channel is announced by the remote peer.
        let dc_tx = event_tx.clone();
        let uid_dc = peer_id.clone();
        let dc_slot = channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let uid = uid_dc.clone();
            let slot = dc_slot.clone();

            Box::pin(async move {
                debug!("Remote data channel '{}' from {}", dc.label(), uid.short());
                Self::attach_channel(dc, uid, tx, slot).await;
            })
        }));

        Ok(Self {
            peer_id,
            peer_connection,
            channel,
            event_tx,
        })
    }

    async fn attach_channel(
        dc: Arc<RTCDataChannel>,
        peer_id: PeerId,
        event_tx: mpsc::Sender<TransportEvent>,
        slot: ChannelSlot,
    ) {
        let tx_open = event_tx.clone();
        let uid_open = peer_id.clone();
        dc.on_open(Box::new(move || {
            let tx = tx_open.clone();
            let uid = uid_open.clone();

            Box::pin(async move {
                info!("Data channel open for {}", uid.short());
                let _ = tx.send(TransportEvent::ChannelOpen(uid)).await;
            })
        }));

        let tx_msg = event_tx.clone();
        let uid_msg = peer_id.clone();
        dc.on_message(Box::new(move |msg: DataChannelMessage| {
            let tx = tx_msg.clone();
            let uid = uid_msg.clone();

            Box::pin(async move {
                let _ = tx
                    .send(TransportEvent::Message {
                        peer_id: uid,
                        is_text: msg.is_string,
                        data: msg.data,
                    })
                    .await;
            })
        }));

        let tx_close = event_tx;
        let uid_close = peer_id;
        dc.on_close(Box::new(move || {
            let tx = tx_close.clone();
            let uid = uid_close.clone();

            Box::pin(async move {
                debug!("Data channel closed for {}", uid.short());
                let _ = tx.send(TransportEvent::ChannelClosed(uid)).await;
            })
        }));

        *slot.lock().await = Some(dc);
    }

    async fn open_channel(&self) -> Result<Arc<RTCDataChannel>> {
        self.channel
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("no data channel with {}", self.peer_id))
    }
}

#[async_trait]
impl PeerTransport for ConnectionWrapper {
    async fn open_data_channel(&self, label: &str) -> Result<()> {
        let dc = self.peer_connection.create_data_channel(label, None).await?;
        Self::attach_channel(
            dc,
            self.peer_id.clone(),
            self.event_tx.clone(),
            self.channel.clone(),
        )
        .await;
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn apply_remote_description(&self, description: RemoteDescription) -> Result<()> {
        let desc = match description {
            RemoteDescription::Offer(sdp) => RTCSessionDescription::offer(sdp)?,
            RemoteDescription::Answer(sdp) => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add remote ICE candidate")?;
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<()> {
        self.open_channel().await?.send_text(text).await?;
        Ok(())
    }

    async fn send_binary(&self, data: Bytes) -> Result<()> {
        self.open_channel().await?.send(&data).await?;
        Ok(())
    }

    fn max_message_size(&self) -> usize {
        MAX_MESSAGE_SIZE
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Builds [`ConnectionWrapper`]s from a shared, updatable [`TransportConfig`].
pub struct WebRtcTransportFactory {
    config: RwLock<TransportConfig>,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub async fn config(&self) -> TransportConfig {
        self.config.read().await.clone()
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn connect(
        &self,
        peer_id: PeerId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Arc<dyn PeerTransport>> {
        let config = self.config().await;
        let wrapper = ConnectionWrapper::new(peer_id, &config, events).await?;
        Ok(Arc::new(wrapper))
    }

    async fn set_ice_servers(&self, ice_servers: Vec<IceServerConfig>) {
        self.config.write().await.ice_servers = ice_servers;
    }
}
