mod file;
mod mime;
mod transfer_state;

pub use file::*;
pub use mime::mime_type_for;
pub use transfer_state::*;
