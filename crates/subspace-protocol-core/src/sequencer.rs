use std::cmp::Reverse;
use std::collections::BinaryHeap;

use subspace_types::Tick;

use crate::envelope::{self, RELIABLE_HEADER_SIZE};

const RESEND_DELAY_TICKS: i32 = 30; // 300 ms at 100 Hz

/// A sink the sequencer hands fully-framed core packets to. Implemented by
/// the live UDP connection; tests can substitute a `Vec<Vec<u8>>` capture.
pub trait PacketSink {
    fn send_core(&mut self, bytes: &[u8]);
}

#[derive(Debug, Clone)]
struct SentMessage {
    id: u32,
    body: Vec<u8>,
    sent_at: Tick,
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct PendingMessage {
    id: u32,
    body: Vec<u8>,
}

impl Ord for PendingMessage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl PartialOrd for PendingMessage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
struct ChunkStore {
    data: Vec<u8>,
}

impl ChunkStore {
    fn push(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

/// Reliable delivery, ack bookkeeping, and small/huge chunk reassembly for
/// one connection.
///
/// Reliable ordering is enforced on the receive side with a min-heap keyed
/// by message id: out-of-order arrivals buffer until the missing id shows
/// up, then drain in a contiguous run.
#[derive(Default)]
pub struct PacketSequencer {
    next_reliable_process_id: u32,
    next_reliable_id: u32,

    reliable_sent: Vec<SentMessage>,
    process_queue: BinaryHeap<Reverse<PendingMessage>>,
    queued_ids: std::collections::HashSet<u32>,

    small_chunks: ChunkStore,
    huge_chunks: ChunkStore,
}

/// A fully reassembled packet ready for dispatch, produced either directly
/// or via reliable/chunk reassembly.
pub enum Reassembled {
    Ready(Vec<u8>),
    Pending,
}

impl PacketSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains any reliable messages now in order, resends anything that
    /// has timed out, and returns the in-order messages for dispatch.
    pub fn tick(&mut self, now: Tick, sink: &mut impl PacketSink) -> Vec<Vec<u8>> {
        let mut ready = Vec::new();
        while let Some(Reverse(top)) = self.process_queue.peek() {
            if top.id != self.next_reliable_process_id {
                break;
            }
            let Reverse(mesg) = self.process_queue.pop().unwrap();
            self.queued_ids.remove(&mesg.id);
            ready.push(mesg.body);
            self.next_reliable_process_id = self.next_reliable_process_id.wrapping_add(1);
        }

        for mesg in &mut self.reliable_sent {
            if now.diff(mesg.sent_at) >= RESEND_DELAY_TICKS {
                let frame = envelope::build_reliable(mesg.id, &mesg.body);
                sink.send_core(&frame);
                mesg.sent_at = now;
            }
        }

        ready
    }

    pub fn send_reliable(&mut self, now: Tick, body: &[u8], sink: &mut impl PacketSink) {
        let id = self.next_reliable_id;
        self.next_reliable_id = self.next_reliable_id.wrapping_add(1);

        let frame = envelope::build_reliable(id, body);
        sink.send_core(&frame);

        self.reliable_sent.push(SentMessage { id, body: body.to_vec(), sent_at: now });
    }

    /// Handles an inbound `{0x00, 0x03, id, body}` reliable frame: always
    /// acks, then queues the body for in-order dispatch if it's new.
    pub fn on_reliable_message(&mut self, now: Tick, pkt: &[u8], sink: &mut impl PacketSink) {
        if pkt.len() < RELIABLE_HEADER_SIZE {
            return;
        }
        let id = u32::from_le_bytes(pkt[2..6].try_into().unwrap());

        sink.send_core(&envelope::build_ack(id));

        if id < self.next_reliable_process_id || self.queued_ids.contains(&id) {
            return;
        }

        let body = pkt[RELIABLE_HEADER_SIZE..].to_vec();
        self.queued_ids.insert(id);
        self.process_queue.push(Reverse(PendingMessage { id, body }));
        let _ = now;
    }

    pub fn on_reliable_ack(&mut self, pkt: &[u8]) {
        if pkt.len() < RELIABLE_HEADER_SIZE {
            return;
        }
        let id = u32::from_le_bytes(pkt[2..6].try_into().unwrap());
        self.reliable_sent.retain(|m| m.id != id);
    }

    pub fn on_small_chunk_body(&mut self, pkt: &[u8]) {
        self.small_chunks.push(&pkt[2..]);
    }

    /// Tail completes the small-chunk reassembly and returns the combined
    /// packet for dispatch.
    pub fn on_small_chunk_tail(&mut self, pkt: &[u8]) -> Vec<u8> {
        self.small_chunks.push(&pkt[2..]);
        self.small_chunks.take()
    }

    pub fn on_huge_chunk(&mut self, pkt: &[u8]) {
        self.huge_chunks.push(&pkt[2..]);
    }

    pub fn on_cancel_huge_chunk(&mut self) {
        self.huge_chunks.clear();
    }

    pub fn take_huge_chunk(&mut self) -> Vec<u8> {
        self.huge_chunks.take()
    }

    /// Bytes buffered so far for the in-progress huge-chunk download, so a
    /// caller that knows the expected total size can decide when to call
    /// [`PacketSequencer::take_huge_chunk`].
    pub fn huge_chunk_len(&self) -> usize {
        self.huge_chunks.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Capture(Vec<Vec<u8>>);
    impl PacketSink for Capture {
        fn send_core(&mut self, bytes: &[u8]) {
            self.0.push(bytes.to_vec());
        }
    }

    #[test]
    fn out_of_order_reliable_messages_dispatch_in_order() {
        let mut seq = PacketSequencer::new();
        let mut sink = Capture::default();
        let now = Tick::new(0);

        let frame = |id: u32, byte: u8| envelope::build_reliable(id, &[byte]);

        seq.on_reliable_message(now, &frame(2, b'c'), &mut sink);
        seq.on_reliable_message(now, &frame(0, b'a'), &mut sink);
        seq.on_reliable_message(now, &frame(1, b'b'), &mut sink);

        let ready = seq.tick(now, &mut sink);
        assert_eq!(ready, vec![vec![b'a'], vec![b'b'], vec![b'c']]);
    }

    #[test]
    fn duplicate_reliable_message_is_not_requeued() {
        let mut seq = PacketSequencer::new();
        let mut sink = Capture::default();
        let now = Tick::new(0);
        let frame = envelope::build_reliable(5, b"x");

        seq.on_reliable_message(now, &frame, &mut sink);
        seq.on_reliable_message(now, &frame, &mut sink);

        assert_eq!(seq.process_queue.len(), 1);
    }

    #[test]
    fn ack_removes_sent_message_so_it_stops_resending() {
        let mut seq = PacketSequencer::new();
        let mut sink = Capture::default();
        let now = Tick::new(0);

        seq.send_reliable(now, b"payload", &mut sink);
        assert_eq!(seq.reliable_sent.len(), 1);

        seq.on_reliable_ack(&envelope::build_ack(0));
        assert!(seq.reliable_sent.is_empty());
    }

    #[test]
    fn timed_out_reliable_message_is_resent() {
        let mut seq = PacketSequencer::new();
        let mut sink = Capture::default();
        let start = Tick::new(0);
        seq.send_reliable(start, b"x", &mut sink);
        sink.0.clear();

        let later = start.advance(RESEND_DELAY_TICKS as u32);
        seq.tick(later, &mut sink);
        assert_eq!(sink.0.len(), 1);
    }

    #[test]
    fn small_chunk_reassembles_on_tail() {
        let mut seq = PacketSequencer::new();
        seq.on_small_chunk_body(&[0x00, 0x08, b'h', b'e']);
        let combined = seq.on_small_chunk_tail(&[0x00, 0x09, b'l', b'l', b'o']);
        assert_eq!(combined, b"hello");
    }
}
