mod engine;
mod error;
mod negotiation;
mod transfer;
mod transport;

pub use engine::*;
pub use error::ClientError;
pub use negotiation::*;
pub use transfer::*;
pub use transport::*;
