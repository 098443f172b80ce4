pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Two participants per room: one initiator, one responder.
pub const DEFAULT_ROOM_CAPACITY: usize = 2;

/// Name given to a payload that arrived without preceding metadata.
pub const DEFAULT_FILE_NAME: &str = "received_file";

/// Label of the data channel opened by the initiator.
pub const FILE_CHANNEL_LABEL: &str = "fileTransfer";
