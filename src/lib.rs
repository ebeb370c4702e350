//! `tcp-receive` — the receive side of a TCP-like reliable byte stream.
//!
//! # Architecture
//!
//! ```text
//!        segments (seq no, SYN/FIN, payload)
//!             │
//!        ┌────▼─────┐  (bytes, stream index, last?) ┌─────────────┐
//!        │ Receiver │──────────────────────────────▶│ Reassembler │
//!        └────┬─────┘                               └──────┬──────┘
//!             │                                            │ contiguous prefix
//!             ▼                                            ▼
//!      ackno / window_size                          ┌────────────┐
//!      (feedback for the sender)                    │ FlowBuffer │──▶ application
//!                                                   └────────────┘      read()
//! ```
//!
//! Each module has a single responsibility:
//! - [`seqnum`]      — 32-bit wrapping sequence numbers and the mapping to
//!   64-bit stream indices
//! - [`segment`]     — the in-memory inbound segment type
//! - [`flow_buffer`] — bounded in-order byte FIFO; the single point of
//!   backpressure
//! - [`reassembler`] — bounded out-of-order window feeding the flow buffer
//! - [`receiver`]    — per-connection coordination: ackno and advertised
//!   window
//!
//! Everything here is synchronous and deterministic: no sockets, no timers,
//! no checksums.  A caller decodes datagrams into [`segment::Segment`]s,
//! feeds them to [`receiver::Receiver::on_segment`], and reads the ordered
//! byte stream back out through [`receiver::Receiver::stream_mut`].  Lost,
//! duplicated and reordered segments are routine inputs, not errors: the
//! receiver stays permissive and idempotent, and the sender is expected to
//! retransmit based on the advertised ackno and window.

pub mod flow_buffer;
pub mod reassembler;
pub mod receiver;
pub mod segment;
pub mod seqnum;
