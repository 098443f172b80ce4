mod app;
mod config;
mod relay;
mod room;
mod signaling;

pub use app::*;
pub use config::*;
pub use relay::*;
pub use room::*;
pub use signaling::*;
