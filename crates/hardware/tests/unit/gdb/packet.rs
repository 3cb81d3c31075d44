//! # Packet Engine Tests
//!
//! Receive-side validation and acknowledgement, transmit-side retransmission,
//! and the interplay between the two when the peer talks over the stub.

use mockall::Sequence;
use pinkysim_core::gdb::{Buffer, CommError, PacketEngine};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::builder::packet;
use crate::common::mocks::comm::{MockChannel, ScriptedComm};

fn receive(comm: &mut ScriptedComm) -> (PacketEngine, Buffer) {
    let mut engine = PacketEngine::new();
    let mut buffer = Buffer::new(64);
    engine.get(comm, &mut buffer).unwrap();
    (engine, buffer)
}

fn reply(text: &str) -> Buffer {
    let mut buffer = Buffer::new(64);
    buffer.write_str(text).unwrap();
    buffer
}

// ─── Receive ────────────────────────────────────────────────────────────────

#[test]
fn valid_packet_is_acknowledged() {
    let mut comm = ScriptedComm::new().packet("m20000000,4");
    let (engine, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"m20000000,4");
    assert_eq!(comm.output, b"+");
    assert_eq!(engine.checksum_failures, 0);
}

#[test]
fn empty_packet_is_acknowledged() {
    let mut comm = ScriptedComm::new().bytes(b"$#00");
    let (engine, buffer) = receive(&mut comm);
    assert!(buffer.remaining().is_empty());
    assert!(!buffer.overrun());
    assert_eq!(comm.output, b"+");
    assert_eq!(engine.checksum_failures, 0);
}

#[test]
fn noise_before_start_is_discarded() {
    let mut comm = ScriptedComm::new().bytes(b"+\x03junk").packet("g");
    let (_, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"g");
}

#[test]
fn bad_checksum_is_rejected_then_retried() {
    let mut comm = ScriptedComm::new()
        .bytes(&packet::frame_corrupt("g"))
        .packet("g");
    let (engine, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"g");
    assert_eq!(comm.output, b"-+");
    assert_eq!(engine.checksum_failures, 1);
}

#[test]
fn non_hex_checksum_is_rejected() {
    let mut comm = ScriptedComm::new().bytes(b"$g#zz").packet("?");
    let (engine, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"?");
    assert_eq!(engine.checksum_failures, 1);
}

#[test]
fn start_character_restarts_capture() {
    let mut comm = ScriptedComm::new().bytes(b"$m0,").packet("g");
    let (_, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"g");
    assert_eq!(comm.output, b"+");
}

#[test]
fn newer_packet_replaces_acknowledged_one() {
    let mut comm = ScriptedComm::new()
        .packet("c")
        .packet("?")
        .interrupt_on_poll(1);
    let (_, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"?");
    assert_eq!(comm.output, b"++");
}

#[test]
fn queued_packets_collapse_to_the_newest() {
    let mut comm = ScriptedComm::new()
        .eager()
        .packet("c")
        .packet("g")
        .packet("?");
    let (_, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"?");
    assert_eq!(comm.output, b"+++");
    assert_eq!(comm.polls(), 3);
}

#[test]
fn unarmed_polls_leave_queued_packets_alone() {
    let mut comm = ScriptedComm::new().packet("c").packet("?");
    let (_, buffer) = receive(&mut comm);
    assert_eq!(buffer.remaining(), b"c");
    assert_eq!(comm.polls(), 1);
    assert!(comm.unread() > 0);
}

#[test]
fn oversized_payload_sets_overrun() {
    let mut comm = ScriptedComm::new().packet("qSupported");
    let mut engine = PacketEngine::new();
    let mut buffer = Buffer::new(4);
    engine.get(&mut comm, &mut buffer).unwrap();
    assert!(buffer.overrun());
    assert_eq!(comm.output, b"+");
}

#[test]
fn disconnect_mid_packet_is_reported() {
    let mut comm = ScriptedComm::new().bytes(b"$m0,4");
    let mut buffer = Buffer::new(64);
    let err = PacketEngine::new().get(&mut comm, &mut buffer).unwrap_err();
    assert!(matches!(err, CommError::Disconnected));
}

#[test]
fn transport_errors_propagate() {
    let mut comm = MockChannel::new();
    let _ = comm
        .expect_receive_char()
        .times(1)
        .returning(|| Err(CommError::Timeout));
    let mut buffer = Buffer::new(64);
    let err = PacketEngine::new().get(&mut comm, &mut buffer).unwrap_err();
    assert!(matches!(err, CommError::Timeout));
}

// ─── Transmit ───────────────────────────────────────────────────────────────

#[test]
fn reply_is_framed_with_checksum() {
    let mut comm = ScriptedComm::new().ack();
    let mut buffer = reply("OK");
    PacketEngine::new().send(&mut comm, &mut buffer).unwrap();
    assert_eq!(comm.output, b"$OK#9a");
}

#[test]
fn empty_reply_has_zero_checksum() {
    let mut comm = ScriptedComm::new().ack();
    let mut buffer = Buffer::new(8);
    PacketEngine::new().send(&mut comm, &mut buffer).unwrap();
    assert_eq!(comm.output, b"$#00");
}

#[test]
fn nak_triggers_retransmit() {
    let mut comm = ScriptedComm::new().bytes(b"-").ack();
    let mut engine = PacketEngine::new();
    let mut buffer = reply("OK");
    engine.send(&mut comm, &mut buffer).unwrap();
    assert_eq!(comm.output, b"$OK#9a$OK#9a");
    assert_eq!(engine.retransmits, 1);
}

#[test]
fn interrupt_while_awaiting_ack_is_ignored() {
    let mut comm = ScriptedComm::new().bytes(b"\x03").ack();
    let mut engine = PacketEngine::new();
    let mut buffer = reply("S05");
    engine.send(&mut comm, &mut buffer).unwrap();
    assert_eq!(comm.sent(), vec!["S05"]);
    assert_eq!(engine.retransmits, 0);
}

#[test]
fn peer_packet_during_send_is_read_next() {
    let mut comm = ScriptedComm::new().packet("g");
    let mut engine = PacketEngine::new();
    let mut buffer = reply("OK");
    engine.send(&mut comm, &mut buffer).unwrap();
    assert_eq!(engine.retransmits, 0);

    buffer.reset();
    engine.get(&mut comm, &mut buffer).unwrap();
    assert_eq!(buffer.remaining(), b"g");
    assert_eq!(comm.unread(), 0);
}

#[test]
fn frame_is_flushed_before_waiting_for_ack() {
    let mut seq = Sequence::new();
    let mut comm = MockChannel::new();
    let _ = comm
        .expect_send_char()
        .times(6)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    let _ = comm
        .expect_flush()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(()));
    let _ = comm
        .expect_receive_char()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(b'+'));
    let mut buffer = reply("OK");
    PacketEngine::new().send(&mut comm, &mut buffer).unwrap();
}

// ─── Loopback ───────────────────────────────────────────────────────────────

const LOOPBACK_CAPACITY: usize = 64;

/// Payload bytes other than the framing characters.
fn payload_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("framing character", |&b| b != b'$' && b != b'#')
}

proptest! {
    #[test]
    fn sent_packet_is_received_intact(
        payload in proptest::collection::vec(payload_byte(), 0..=LOOPBACK_CAPACITY),
    ) {
        let mut tx = ScriptedComm::new().ack().ack();
        let mut buffer = Buffer::new(LOOPBACK_CAPACITY);
        for &b in &payload {
            buffer.write_byte(b).unwrap();
        }
        PacketEngine::new().send(&mut tx, &mut buffer).unwrap();
        prop_assert_eq!(tx.unread(), 1);

        let mut rx = ScriptedComm::new().bytes(&tx.output);
        let mut received = Buffer::new(LOOPBACK_CAPACITY);
        PacketEngine::new().get(&mut rx, &mut received).unwrap();
        prop_assert_eq!(received.remaining(), payload.as_slice());
        prop_assert!(!received.overrun());
        prop_assert_eq!(rx.output.clone(), b"+".to_vec());
        prop_assert_eq!(rx.unread(), 0);
    }
}
