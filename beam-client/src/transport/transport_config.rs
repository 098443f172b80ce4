use beam_core::IceServerConfig;
use beam_core::utils::DEFAULT_STUN_ADDR;

/// WebRTC settings for every peer connection the client opens.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Gather 127.0.0.1 host candidates, needed when both peers share a host.
    pub include_loopback: bool,
}

impl TransportConfig {
    pub fn local() -> Self {
        Self {
            ice_servers: Vec::new(),
            include_loopback: true,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            include_loopback: false,
        }
    }
}
