//! Bounded in-order byte FIFO with end-of-input and error flags.
//!
//! [`FlowBuffer`] is the single point of backpressure in the receive
//! pipeline.  The reassembler writes contiguous bytes on the "input" side,
//! the application reads them from the "output" side, and the gap between
//! capacity and occupancy is the window the receiver advertises back to
//! the sender.
//!
//! Storage is a fixed-capacity ring: a `Vec<u8>` plus a start cursor and an
//! occupancy count, with physical positions computed modulo the capacity.
//! Nothing reallocates after construction.
//!
//! Single-writer / single-reader discipline: exactly one producer (the
//! reassembler) and one consumer (the application).  There is no internal
//! locking; a multi-threaded caller must serialize access itself.

// ---------------------------------------------------------------------------
// FlowBuffer
// ---------------------------------------------------------------------------

/// A bounded FIFO of bytes with an end-of-input marker and an error flag.
#[derive(Debug)]
pub struct FlowBuffer {
    /// Ring storage; its length is the fixed capacity.
    buf: Vec<u8>,
    /// Physical index of the first unread byte.  Always `< capacity`
    /// (0 for a zero-capacity buffer).
    start: usize,
    /// Current occupancy in bytes.  Never exceeds the capacity.
    len: usize,
    /// Set once the writer has no more bytes; never cleared.
    ended: bool,
    /// Set by an upper layer on protocol violation; never cleared.
    /// This buffer never sets it on its own.
    errored: bool,
    /// Lifetime total of bytes accepted by [`write`](FlowBuffer::write).
    total_written: u64,
    /// Lifetime total of bytes removed by [`pop`](FlowBuffer::pop).
    total_read: u64,
}

impl FlowBuffer {
    /// Create a buffer with room for `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            start: 0,
            len: 0,
            ended: false,
            errored: false,
            total_written: 0,
            total_read: 0,
        }
    }

    /// Physical slot for a logical position past `start`.
    fn wrap_index(&self, index: usize) -> usize {
        if self.buf.is_empty() {
            0
        } else {
            index % self.buf.len()
        }
    }

    // -- "Input" interface for the writer ----------------------------------

    /// Append as many bytes of `data` as fit, starting from its first byte.
    ///
    /// Returns the number of bytes accepted: `0` once the input has ended
    /// or the buffer is full, otherwise at most
    /// [`remaining_capacity`](FlowBuffer::remaining_capacity).
    pub fn write(&mut self, data: &[u8]) -> usize {
        if self.ended {
            return 0;
        }
        let accepted = data.len().min(self.remaining_capacity());

        // The accepted prefix lands in at most two physical runs: from the
        // write cursor to the end of storage, then wrapped to the front.
        let write_at = self.wrap_index(self.start + self.len);
        let first = accepted.min(self.buf.len() - write_at);
        self.buf[write_at..write_at + first].copy_from_slice(&data[..first]);
        self.buf[..accepted - first].copy_from_slice(&data[first..accepted]);

        self.len += accepted;
        self.total_written += accepted as u64;
        accepted
    }

    /// The number of additional bytes the buffer has space for.
    pub fn remaining_capacity(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Signal that the byte stream has reached its ending.  Idempotent.
    pub fn end_input(&mut self) {
        self.ended = true;
    }

    /// Mark the stream as permanently failed.
    ///
    /// Reserved for upper layers that detect a protocol violation; nothing
    /// in this crate calls it, and nothing ever clears it.
    pub fn set_error(&mut self) {
        self.errored = true;
    }

    // -- "Output" interface for the reader ---------------------------------

    /// Copy up to `n` front bytes without removing them.
    ///
    /// Returns fewer than `n` bytes (possibly none) when the occupancy is
    /// smaller.
    pub fn peek(&self, n: usize) -> Vec<u8> {
        let count = n.min(self.len);
        let mut out = Vec::with_capacity(count);
        let first = count.min(self.buf.len() - self.start);
        out.extend_from_slice(&self.buf[self.start..self.start + first]);
        out.extend_from_slice(&self.buf[..count - first]);
        out
    }

    /// Remove up to `n` bytes from the front, clamped to the occupancy.
    ///
    /// The read cursor and the total-read counter advance by the clamped
    /// count only.
    pub fn pop(&mut self, n: usize) {
        let count = n.min(self.len);
        self.start = self.wrap_index(self.start + count);
        self.len -= count;
        self.total_read += count as u64;
    }

    /// Copy and then remove the next `n` bytes ([`peek`](FlowBuffer::peek)
    /// followed by [`pop`](FlowBuffer::pop)).
    pub fn read(&mut self, n: usize) -> Vec<u8> {
        let data = self.peek(n);
        self.pop(n);
        data
    }

    // -- Accessors ----------------------------------------------------------

    /// `true` once the writer has signalled the end of the input.
    pub fn input_ended(&self) -> bool {
        self.ended
    }

    /// `true` once the stream has been marked as failed.
    pub fn error(&self) -> bool {
        self.errored
    }

    /// Current occupancy: the number of bytes available to the reader.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The fixed capacity chosen at construction.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// `true` once the input has ended *and* the reader has drained
    /// everything: end of stream.
    pub fn is_closed(&self) -> bool {
        self.ended && self.len == 0
    }

    /// Lifetime total of bytes ever accepted by the writer.
    pub fn bytes_written(&self) -> u64 {
        self.total_written
    }

    /// Lifetime total of bytes ever removed by the reader.
    pub fn bytes_read(&self) -> u64 {
        self.total_read
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
