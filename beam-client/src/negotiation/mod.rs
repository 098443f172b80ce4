mod negotiator;
mod observer;
mod session;

pub use negotiator::*;
pub use observer::*;
pub use session::*;
