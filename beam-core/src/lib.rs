pub mod error;
pub mod model;
pub mod utils;

pub use error::FrameError;
pub use model::*;
