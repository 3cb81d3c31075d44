
/// Command parsing for every supported packet.
pub mod commands;

/// Packet framing, checksum failures, and retransmission.
pub mod packet;


/// Stop classification and watchpoint fields.
pub mod signal;
