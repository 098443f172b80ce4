use beam_core::IceServerConfig;
use beam_core::utils::{DEFAULT_ROOM_CAPACITY, DEFAULT_STUN_ADDR};
use std::net::SocketAddr;

/// Relay settings. The CLI fills these from flags and environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub room_capacity: usize,
    /// Handed to every client right after it connects.
    pub ice_servers: Vec<IceServerConfig>,
}

impl ServerConfig {
    pub fn with_ice_server(mut self, server: IceServerConfig) -> Self {
        self.ice_servers.push(server);
        self
    }

    pub fn without_ice_servers(mut self) -> Self {
        self.ice_servers.clear();
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            room_capacity: DEFAULT_ROOM_CAPACITY,
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
        }
    }
}
