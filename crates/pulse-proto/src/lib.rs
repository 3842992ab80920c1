//! # Pulse Protocol
//!
//! The correlation protocol between a scheduling context and the timer
//! worker context that fires on its behalf:
//!
//! - a monotonic identifier scheme ([`TimerId`], [`TimerIdAllocator`])
//! - the message vocabulary crossing the channel ([`WorkerRequest`],
//!   [`MainNotification`])
//! - the tagged JSON wire encoding ([`wire`])
//!
//! The two sides of the protocol never share timer state directly; every
//! state change is driven by one of the messages defined here, keyed by a
//! [`TimerId`] that the scheduling side allocated.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod id;
pub mod message;
pub mod wire;

pub use id::{TimerId, TimerIdAllocator};
pub use message::{MainNotification, TimerKind, WorkerRequest};
pub use wire::WireError;
