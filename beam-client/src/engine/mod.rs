mod beam_engine;
mod engine_command;
mod relay_connection;

pub use beam_engine::*;
pub use engine_command::*;
pub use relay_connection::*;
