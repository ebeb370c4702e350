//! 32-bit wrapping sequence numbers and 64-bit stream-index translation.
//!
//! On the wire every position in the stream is named by a 32-bit sequence
//! number that wraps modulo 2^32 and starts at an arbitrary per-connection
//! Initial Sequence Number (ISN).  Internally the receiver addresses bytes
//! by a 64-bit *stream index* that never wraps.  [`wrap`] and [`unwrap`]
//! convert between the two spaces:
//!
//! ```text
//!   absolute position (u64):  0      1      2      3      ...
//!   sequence number   (u32):  isn    isn+1  isn+2  isn+3  ... (mod 2^32)
//! ```
//!
//! Both functions are pure and stateless, so a sender-side counterpart can
//! reuse them unchanged.

use std::fmt;
use std::ops::{Add, Sub};

/// Size of one trip around the 32-bit sequence space.
const BLOCK: u64 = 1 << 32;

/// The upper 32 bits of a 64-bit absolute position.
const UPPER: u64 = !(u32::MAX as u64);

// ---------------------------------------------------------------------------
// SeqNum
// ---------------------------------------------------------------------------

/// A 32-bit sequence number, expressed relative to an arbitrary ISN.
///
/// Used for both sequence numbers and acknowledgment numbers.  All
/// arithmetic wraps modulo 2^32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqNum(u32);

impl SeqNum {
    /// Wrap a raw 32-bit value.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw stored value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The point `n` steps past `self`, wrapping modulo 2^32.
impl Add<u32> for SeqNum {
    type Output = SeqNum;

    fn add(self, n: u32) -> SeqNum {
        SeqNum(self.0.wrapping_add(n))
    }
}

/// The point `n` steps before `self`, wrapping modulo 2^32.
impl Sub<u32> for SeqNum {
    type Output = SeqNum;

    fn sub(self, n: u32) -> SeqNum {
        SeqNum(self.0.wrapping_sub(n))
    }
}

/// The signed circular offset of `self` relative to `rhs`: the number of
/// increments needed to get from `rhs` to `self`, negative if decrementing
/// is the shorter way around.
impl Sub for SeqNum {
    type Output = i32;

    fn sub(self, rhs: SeqNum) -> i32 {
        self.0.wrapping_sub(rhs.0) as i32
    }
}

// ---------------------------------------------------------------------------
// wrap / unwrap
// ---------------------------------------------------------------------------

/// Map a 64-bit absolute stream position into sequence-number space.
///
/// Adds the low 32 bits of `absolute` to `isn` with 32-bit wraparound.
/// Total: every input has a well-defined result.
pub fn wrap(absolute: u64, isn: SeqNum) -> SeqNum {
    isn + absolute as u32
}

/// Map a sequence number back to the 64-bit absolute position closest to
/// `checkpoint`.
///
/// Infinitely many absolute positions wrap to the same `seqno`; the caller
/// supplies `checkpoint` (the position most recently vouched for) to pick
/// between them.  Of the candidate in the checkpoint's own 2^32 block and
/// the candidates one block below and one block above, the one nearest to
/// `checkpoint` wins; on a tie the candidate sharing the checkpoint's
/// upper 32 bits is returned.
///
/// Callers must keep `checkpoint` within 2^31 of the true position.  A
/// violation is not detected: the result is then the wrong (but still
/// deterministic) nearest candidate.
pub fn unwrap(seqno: SeqNum, isn: SeqNum, checkpoint: u64) -> u64 {
    // The low 32 bits of the answer are fixed by the wire value.
    let low = u64::from(seqno.raw().wrapping_sub(isn.raw()));
    let upper = checkpoint & UPPER;

    let mid = upper | low;
    let mut best = mid;
    let mut best_dist = mid.abs_diff(checkpoint);

    // One block below only exists once the checkpoint has left block zero.
    if upper != 0 {
        let below = mid - BLOCK;
        let dist = checkpoint - below;
        if dist < best_dist {
            best = below;
            best_dist = dist;
        }
    }
    // One block above is unreachable once the upper word is saturated.
    if upper != UPPER {
        let above = mid + BLOCK;
        let dist = above - checkpoint;
        if dist < best_dist {
            best = above;
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
