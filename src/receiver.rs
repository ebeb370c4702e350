//! Receive-side coordination for one connection.
//!
//! [`Receiver`] is the piece a connection's event loop talks to: it takes
//! decoded inbound segments, translates their 32-bit sequence numbers into
//! 64-bit stream indices, delegates the payload to the [`Reassembler`],
//! and derives the two values every outbound segment needs:
//!
//! - [`ackno`](Receiver::ackno) — the next sequence number expected from
//!   the peer (`None` until the peer's SYN has been seen);
//! - [`window_size`](Receiver::window_size) — how many more payload bytes
//!   the peer may send before overrunning our buffering.
//!
//! The receiver does **not** send anything itself; the caller constructs
//! ACK segments from these values.  Socket I/O stays out of protocol
//! state entirely.
//!
//! # Sequence-number bookkeeping
//!
//! SYN and FIN each occupy one unit of sequence-number space without
//! contributing a stream byte.  The `checkpoint` kept here is the absolute
//! position of the next expected sequence number: 1 (for SYN) plus every
//! byte flushed contiguously into the flow buffer, plus 1 more once the
//! FIN has been consumed.  Because only *flushed* bytes advance it, the
//! checkpoint is always a position recently vouched for, which is exactly
//! what [`seqnum::unwrap`] needs to disambiguate wrapped sequence numbers.

use crate::flow_buffer::FlowBuffer;
use crate::reassembler::Reassembler;
use crate::segment::Segment;
use crate::seqnum::{self, SeqNum};

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Translation state that exists once the peer's SYN has been seen.
///
/// Modelled as a separate struct behind an `Option` so that "not yet
/// synced" cannot be confused with a checkpoint that legitimately sits at
/// the stream origin.
#[derive(Debug, Clone, Copy)]
struct SyncState {
    /// The peer's initial sequence number: the wire value of absolute
    /// position 0.
    isn: SeqNum,
    /// Absolute position of the next sequence number expected from the
    /// peer.  Only ever advances.
    checkpoint: u64,
}

/// Manages the receive side of a single connection.
#[derive(Debug)]
pub struct Receiver {
    reassembler: Reassembler,
    sync: Option<SyncState>,
}

impl Receiver {
    /// Create a receiver that buffers at most `capacity` bytes, both
    /// in-order (readable) and out-of-order (window).
    pub fn new(capacity: usize) -> Self {
        Self {
            reassembler: Reassembler::new(capacity),
            sync: None,
        }
    }

    /// Process one inbound segment.
    ///
    /// Tolerant of anything a lossy, reordering, duplicating network can
    /// deliver: segments before the SYN are ignored, duplicate SYNs do not
    /// reset the connection, and retransmitted data or FINs change nothing
    /// observable.
    pub fn on_segment(&mut self, seg: &Segment) {
        if seg.header.syn {
            match self.sync.as_mut() {
                // Retransmitted SYN: refresh the ISN, keep the checkpoint.
                Some(sync) => sync.isn = seg.header.seqno,
                None => {
                    // The SYN itself occupies position 0, so the next
                    // expected position is 1.
                    self.sync = Some(SyncState {
                        isn: seg.header.seqno,
                        checkpoint: 1,
                    });
                }
            }
        }

        // Without a SYN there is no addressable index space yet.
        let Some(mut sync) = self.sync else {
            return;
        };

        // Stream indices count payload bytes only.  A SYN segment's first
        // payload byte sits at index 0; otherwise the unwrapped position
        // is one ahead of the stream index because the SYN occupies
        // sequence-number space.  Wrapping: a stale segment carrying the
        // ISN itself decodes to index u64::MAX and falls outside the
        // window rather than panicking.
        let stream_index = if seg.header.syn {
            0
        } else {
            seqnum::unwrap(seg.header.seqno, sync.isn, sync.checkpoint).wrapping_sub(1)
        };

        let ended_before = self.reassembler.output().input_ended();
        let occupancy_before = self.reassembler.output().len();
        self.reassembler
            .push(&seg.payload, stream_index, seg.header.fin);

        // Bytes that appeared in the flow buffer were flushed contiguously,
        // so they advance the next expected position; out-of-order bytes
        // must not.
        let flushed = self.reassembler.output().len() - occupancy_before;
        sync.checkpoint += flushed as u64;

        // The FIN occupies one unit of sequence-number space.  Count it on
        // the ending transition only, so a retransmitted FIN after close
        // leaves the ackno unchanged.
        if !ended_before && self.reassembler.output().input_ended() {
            sync.checkpoint += 1;
        }

        self.sync = Some(sync);
    }

    /// The acknowledgment number to advertise: the sequence number of the
    /// next unit expected from the peer.
    ///
    /// `None` until the peer's SYN arrives, which is distinct from a
    /// legitimate raw value of 0.
    pub fn ackno(&self) -> Option<SeqNum> {
        self.sync
            .map(|sync| seqnum::wrap(sync.checkpoint, sync.isn))
    }

    /// The window to advertise: how many more payload bytes fit in the
    /// buffer the reader drains.  0 tells the peer to pause until the
    /// application catches up.
    pub fn window_size(&self) -> usize {
        self.reassembler.output().remaining_capacity()
    }

    /// Bytes buffered out-of-order, waiting for a gap to fill.
    pub fn unassembled_bytes(&self) -> usize {
        self.reassembler.unassembled_bytes()
    }

    /// The reassembled in-order stream.
    pub fn stream(&self) -> &FlowBuffer {
        self.reassembler.output()
    }

    /// Mutable access to the stream, for the reading application.
    pub fn stream_mut(&mut self) -> &mut FlowBuffer {
        self.reassembler.output_mut()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentHeader;

    #[test]
    fn no_ackno_before_syn() {
        let r = Receiver::new(64);
        assert_eq!(r.ackno(), None);
        assert_eq!(r.window_size(), 64);
    }

    #[test]
    fn data_before_syn_is_ignored() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::data(SeqNum::new(100), b"early"));
        assert_eq!(r.ackno(), None);
        assert_eq!(r.stream().len(), 0);
        assert_eq!(r.unassembled_bytes(), 0);
    }

    #[test]
    fn syn_establishes_ackno() {
        let mut r = Receiver::new(10);
        r.on_segment(&Segment::syn(SeqNum::new(5)));
        assert_eq!(r.ackno(), Some(SeqNum::new(6)));
        assert_eq!(r.window_size(), 10);
    }

    #[test]
    fn data_advances_ackno_and_shrinks_window() {
        let mut r = Receiver::new(10);
        r.on_segment(&Segment::syn(SeqNum::new(5)));
        r.on_segment(&Segment::data(SeqNum::new(6), b"hi"));
        assert_eq!(r.ackno(), Some(SeqNum::new(8)));
        assert_eq!(r.window_size(), 8);
        assert_eq!(r.stream_mut().read(2), b"hi");
        assert_eq!(r.window_size(), 10, "window recovers once the reader drains");
    }

    #[test]
    fn duplicate_syn_keeps_checkpoint() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(40)));
        r.on_segment(&Segment::data(SeqNum::new(41), b"abc"));
        let before = r.ackno();

        r.on_segment(&Segment::syn(SeqNum::new(40)));
        assert_eq!(r.ackno(), before);
        assert_eq!(r.stream().len(), 3);
    }

    #[test]
    fn out_of_order_data_does_not_advance_ackno() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(0)));
        // Bytes at stream indices 3.. arrive first.
        r.on_segment(&Segment::data(SeqNum::new(4), b"def"));
        assert_eq!(r.ackno(), Some(SeqNum::new(1)));
        assert_eq!(r.unassembled_bytes(), 3);

        // The gap fills; everything becomes contiguous at once.
        r.on_segment(&Segment::data(SeqNum::new(1), b"abc"));
        assert_eq!(r.ackno(), Some(SeqNum::new(7)));
        assert_eq!(r.stream_mut().read(6), b"abcdef");
    }

    #[test]
    fn fin_consumes_one_sequence_slot() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(5)));
        r.on_segment(&Segment::data(SeqNum::new(6), b"hi"));
        r.on_segment(&Segment::fin(SeqNum::new(8), b"!"));

        // syn@5, "hi!"@6..9, fin@9 — next expected is 10.
        assert_eq!(r.ackno(), Some(SeqNum::new(10)));
        assert!(r.stream().input_ended());
        assert_eq!(r.stream_mut().read(3), b"hi!");
        assert!(r.stream().is_closed());
    }

    #[test]
    fn retransmitted_fin_leaves_ackno_unchanged() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(5)));
        r.on_segment(&Segment::fin(SeqNum::new(6), b""));
        assert_eq!(r.ackno(), Some(SeqNum::new(7)));

        r.on_segment(&Segment::fin(SeqNum::new(6), b""));
        assert_eq!(r.ackno(), Some(SeqNum::new(7)));
    }

    #[test]
    fn fin_held_back_by_gap() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(0)));
        r.on_segment(&Segment::fin(SeqNum::new(4), b"d"));
        assert!(!r.stream().input_ended(), "bytes 0..3 still missing");
        assert_eq!(r.ackno(), Some(SeqNum::new(1)));

        r.on_segment(&Segment::data(SeqNum::new(1), b"abc"));
        assert!(r.stream().input_ended());
        // 4 payload bytes + SYN + FIN.
        assert_eq!(r.ackno(), Some(SeqNum::new(6)));
    }

    #[test]
    fn syn_with_payload_and_fin() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::new(
            SegmentHeader {
                seqno: SeqNum::new(99),
                syn: true,
                fin: true,
            },
            b"abc".to_vec(),
        ));
        assert_eq!(r.ackno(), Some(SeqNum::new(104)));
        assert_eq!(r.stream_mut().read(3), b"abc");
        assert!(r.stream().is_closed());
    }

    #[test]
    fn isn_near_wraparound() {
        let mut r = Receiver::new(64);
        let isn = SeqNum::new(u32::MAX - 1);
        r.on_segment(&Segment::syn(isn));
        assert_eq!(r.ackno(), Some(SeqNum::new(u32::MAX)));

        // First data byte sits at seqno u32::MAX; payload crosses zero.
        r.on_segment(&Segment::data(SeqNum::new(u32::MAX), b"abcd"));
        assert_eq!(r.ackno(), Some(SeqNum::new(3)));
        assert_eq!(r.stream_mut().read(4), b"abcd");
    }

    #[test]
    fn stale_segment_at_isn_is_dropped() {
        let mut r = Receiver::new(64);
        r.on_segment(&Segment::syn(SeqNum::new(20)));
        // A bogus data segment claiming the ISN's own sequence number maps
        // below stream index 0 and must vanish without effect.
        r.on_segment(&Segment::data(SeqNum::new(20), b"junk"));
        assert_eq!(r.ackno(), Some(SeqNum::new(21)));
        assert_eq!(r.stream().len(), 0);
        assert_eq!(r.unassembled_bytes(), 0);
    }

    #[test]
    fn window_floor_is_zero_when_full() {
        let mut r = Receiver::new(4);
        r.on_segment(&Segment::syn(SeqNum::new(0)));
        r.on_segment(&Segment::data(SeqNum::new(1), b"abcdef"));
        assert_eq!(r.window_size(), 0);
        // Only the 4 bytes that fit were accepted.
        assert_eq!(r.ackno(), Some(SeqNum::new(5)));
    }
}
