//! RSP packet framing.
//!
//! This module implements the `$payload#cs` framing of the GDB remote serial
//! protocol. It provides:
//! 1. **Receive:** Discards noise until `$`, captures the payload, validates the
//!    checksum, and acknowledges with `+` or `-`.
//! 2. **Transmit:** Frames a payload and resends it until the peer acknowledges.
//! 3. **Cancellation:** A newer packet arriving behind an acknowledged one replaces it.

use super::buffer::{Buffer, hex_char, hex_value};
use super::comm::{Comm, CommError};

const PACKET_START: u8 = b'$';
const CHECKSUM_START: u8 = b'#';
const ACK: u8 = b'+';
const NAK: u8 = b'-';
const INTERRUPT: u8 = 0x03;

/// State of one receive or transmit in progress.
struct Packet<'a> {
    buffer: &'a mut Buffer,
    last_char: u8,
    calculated_checksum: u8,
    expected_checksum: Option<u8>,
}

impl<'a> Packet<'a> {
    fn new(buffer: &'a mut Buffer) -> Self {
        Self {
            buffer,
            last_char: 0,
            calculated_checksum: 0,
            expected_checksum: None,
        }
    }

    fn restart(&mut self) {
        self.buffer.reset();
        self.calculated_checksum = 0;
        self.expected_checksum = None;
    }

    fn wait_for_start<C: Comm + ?Sized>(&mut self, comm: &mut C) -> Result<(), CommError> {
        loop {
            self.last_char = comm.receive_char()?;
            if self.last_char == PACKET_START {
                return Ok(());
            }
        }
    }

    /// Captures payload bytes until `#`. A `$` restarts the capture.
    fn capture<C: Comm + ?Sized>(&mut self, comm: &mut C) -> Result<(), CommError> {
        self.restart();
        loop {
            self.last_char = comm.receive_char()?;
            match self.last_char {
                CHECKSUM_START => return Ok(()),
                PACKET_START => self.restart(),
                c => {
                    // A full buffer records the overrun and keeps summing.
                    let _ = self.buffer.write_byte(c);
                    self.calculated_checksum = self.calculated_checksum.wrapping_add(c);
                }
            }
        }
    }

    /// Reads the two checksum characters. Non-hex digits leave no expected checksum.
    fn read_checksum<C: Comm + ?Sized>(&mut self, comm: &mut C) -> Result<(), CommError> {
        let hi = comm.receive_char()?;
        let lo = comm.receive_char()?;
        self.expected_checksum = match (hex_value(hi), hex_value(lo)) {
            (Some(h), Some(l)) => Some((h << 4) | l),
            _ => None,
        };
        Ok(())
    }

    fn checksum_valid(&self) -> bool {
        self.expected_checksum == Some(self.calculated_checksum)
    }
}

/// Frames, checksums, and acknowledges RSP packets.
#[derive(Clone, Copy, Debug, Default)]
pub struct PacketEngine {
    /// Packets rejected for a bad checksum.
    pub checksum_failures: u64,
    /// Packets resent because the peer did not acknowledge them.
    pub retransmits: u64,
    /// The peer's `$` was consumed while waiting for an acknowledgement.
    start_consumed: bool,
}

impl PacketEngine {
    /// Creates an engine with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Receives the most recent valid packet into `buffer`.
    ///
    /// On return the buffer holds the payload, rewound for reading. If the
    /// payload outgrew the buffer, [`Buffer::overrun`] is set.
    ///
    /// # Errors
    ///
    /// Propagates transport errors from `comm`; nothing else ends the call early.
    pub fn get<C: Comm + ?Sized>(
        &mut self,
        comm: &mut C,
        buffer: &mut Buffer,
    ) -> Result<(), CommError> {
        let mut packet = Packet::new(buffer);
        loop {
            if !std::mem::take(&mut self.start_consumed) {
                packet.wait_for_start(comm)?;
            }
            packet.capture(comm)?;
            packet.read_checksum(comm)?;
            if !packet.checksum_valid() {
                self.checksum_failures += 1;
                tracing::debug!(
                    expected = ?packet.expected_checksum,
                    calculated = packet.calculated_checksum,
                    "packet checksum mismatch"
                );
                comm.send_char(NAK)?;
                comm.flush()?;
                continue;
            }
            comm.send_char(ACK)?;
            comm.flush()?;
            if comm.has_receive_data() {
                continue;
            }
            packet.buffer.set_end_of_data();
            tracing::debug!("<- {}", String::from_utf8_lossy(packet.buffer.remaining()));
            return Ok(());
        }
    }

    /// Sends the bytes written to `buffer` as one packet.
    ///
    /// Resends until the peer answers `+`. A `$` from the peer also ends the
    /// wait: it is consumed and the peer's packet is read by the next [`get`].
    /// An interrupt byte (`0x03`) is ignored.
    ///
    /// [`get`]: PacketEngine::get
    ///
    /// # Errors
    ///
    /// Propagates transport errors from `comm`.
    pub fn send<C: Comm + ?Sized>(
        &mut self,
        comm: &mut C,
        buffer: &mut Buffer,
    ) -> Result<(), CommError> {
        let mut packet = Packet::new(buffer);
        packet.calculated_checksum = packet
            .buffer
            .written()
            .iter()
            .fold(0u8, |sum, &b| sum.wrapping_add(b));
        tracing::debug!("-> {}", String::from_utf8_lossy(packet.buffer.written()));
        loop {
            comm.send_char(PACKET_START)?;
            for &b in packet.buffer.written() {
                comm.send_char(b)?;
            }
            comm.send_char(CHECKSUM_START)?;
            comm.send_char(hex_char(packet.calculated_checksum >> 4))?;
            comm.send_char(hex_char(packet.calculated_checksum))?;
            comm.flush()?;
            loop {
                packet.last_char = comm.receive_char()?;
                match packet.last_char {
                    ACK => return Ok(()),
                    PACKET_START => {
                        self.start_consumed = true;
                        return Ok(());
                    }
                    INTERRUPT => {}
                    _ => break,
                }
            }
            self.retransmits += 1;
        }
    }
}
