//! Out-of-order byte reassembly over a bounded window.
//!
//! The [`Reassembler`] accepts byte ranges addressed by 64-bit stream
//! index, in any order and chunking, with arbitrary overlap and
//! duplication, and feeds the longest contiguous prefix into its
//! [`FlowBuffer`] for the application to read.
//!
//! ```text
//!             next_index                    next_index + W
//!                 │                               │
//!   ──assembled──▶│■■□□■■■□□□□□□□□□□□□□□□□□□□□□□□□│◀──dropped (too far)──
//!                 └───────── window (W bytes) ────┘
//!                   ■ received, waiting for the gap at next_index
//! ```
//!
//! Storage is a `W`-byte arena with a parallel `received` bitmap, both
//! addressed by stream index modulo `W`.  A slot is freed the moment its
//! byte is flushed into the flow buffer, so the same physical slot serves
//! index `i`, then `i + W`, then `i + 2W`.  Memory therefore stays bounded
//! by `W` no matter how far ahead of the assembled point data arrives.

use crate::flow_buffer::FlowBuffer;

// ---------------------------------------------------------------------------
// Reassembler
// ---------------------------------------------------------------------------

/// Reorders byte ranges into the in-order stream consumed by the reader.
#[derive(Debug)]
pub struct Reassembler {
    /// Destination for assembled bytes; same capacity as the window.
    output: FlowBuffer,
    /// Byte arena, addressed by stream index modulo the capacity.
    window: Vec<u8>,
    /// Parallel flags marking which window slots hold a received byte.
    received: Vec<bool>,
    /// Stream index of the first byte not yet flushed into `output`:
    /// the left edge of the window.  Only ever increases.
    next_index: u64,
    /// One past the index of the stream's final byte, once a terminal
    /// range has been seen.
    end_index: Option<u64>,
}

impl Reassembler {
    /// Create a reassembler whose window and output buffer each hold
    /// `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            output: FlowBuffer::new(capacity),
            window: vec![0u8; capacity],
            received: vec![false; capacity],
            next_index: 0,
            end_index: None,
        }
    }

    /// Physical window slot for a stream index.
    fn slot(&self, index: u64) -> usize {
        if self.window.is_empty() {
            0
        } else {
            (index % self.window.len() as u64) as usize
        }
    }

    /// Accept the byte range `data` starting at stream `index`, then flush
    /// whatever has become contiguous.
    ///
    /// Bytes that fall before the window are stale duplicates; bytes past
    /// its right edge exceed buffering capacity.  Both are silently
    /// dropped — the sender retransmits based on the advertised ackno and
    /// window, so dropping is routine, not an error.
    ///
    /// `is_last` marks `index + data.len()` as the end of the stream (a
    /// retransmitted terminal range re-records the same value).  Once every
    /// byte up to that end has been flushed, the output's input is ended.
    pub fn push(&mut self, data: &[u8], index: u64, is_last: bool) {
        if !data.is_empty() {
            self.stage(data, index);
        }
        self.assemble();

        if is_last {
            self.end_index = Some(index.saturating_add(data.len() as u64));
        }
        if self.end_index == Some(self.next_index) {
            self.output.end_input();
        }
    }

    /// Copy the part of `data` that overlaps the current window into the
    /// arena, marking each copied slot received.  Returns the number of
    /// bytes staged (0 when there is no overlap).
    fn stage(&mut self, data: &[u8], index: u64) -> usize {
        let window_len = self.window.len() as u64;
        // Saturating: an index decoded from a stale wire value can sit at
        // the very top of the u64 space; it must fall outside the window,
        // not overflow.
        let begin = index.max(self.next_index);
        let end = index
            .saturating_add(data.len() as u64)
            .min(self.next_index + window_len);
        if begin >= end {
            return 0;
        }

        for stream_index in begin..end {
            let slot = self.slot(stream_index);
            self.window[slot] = data[(stream_index - index) as usize];
            self.received[slot] = true;
        }
        (end - begin) as usize
    }

    /// Length of the received run starting at `next_index`.
    fn contiguous_len(&self) -> usize {
        let mut run = 0;
        while run < self.window.len() && self.received[self.slot(self.next_index + run as u64)] {
            run += 1;
        }
        run
    }

    /// Flush the contiguous run at the left edge of the window into the
    /// output buffer.  Returns the number of bytes the output accepted.
    ///
    /// Only the accepted count is cleared and advanced past: the output
    /// may take fewer bytes than the run if it is momentarily fuller than
    /// the window, and the remainder must stay staged for a later flush.
    fn assemble(&mut self) -> usize {
        let run = self.contiguous_len();
        if run == 0 {
            return 0;
        }

        // The run may wrap the physical arena, so it is collected slot by
        // slot rather than sliced.
        let mut chunk = Vec::with_capacity(run);
        for offset in 0..run as u64 {
            chunk.push(self.window[self.slot(self.next_index + offset)]);
        }

        let accepted = self.output.write(&chunk);
        for offset in 0..accepted as u64 {
            let slot = self.slot(self.next_index + offset);
            self.received[slot] = false;
        }
        self.next_index += accepted as u64;
        accepted
    }

    /// Number of bytes buffered in the window but not yet contiguous from
    /// the left edge.  Each stream byte counts once however many times it
    /// was pushed.
    pub fn unassembled_bytes(&self) -> usize {
        self.received.iter().filter(|&&flag| flag).count()
    }

    /// `true` when no window slot holds a waiting byte.
    pub fn is_window_empty(&self) -> bool {
        !self.received.iter().any(|&flag| flag)
    }

    /// The in-order output stream.
    pub fn output(&self) -> &FlowBuffer {
        &self.output
    }

    /// Mutable access to the output stream, for the reading side.
    pub fn output_mut(&mut self) -> &mut FlowBuffer {
        &mut self.output
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
