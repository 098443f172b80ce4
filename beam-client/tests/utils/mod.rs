pub mod recording_observer;

pub use fake_transport::*;
pub use recording_observer::*;
