pub use beam_core::{PeerId, RoomId};

pub mod model {
    pub use beam_core::FrameError;
    pub use beam_core::model::*;
    pub use beam_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use beam_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use beam_client::*;
}
