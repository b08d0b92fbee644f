//! Shared-state concurrency primitives used between the ingest and
//! processor stages. Unlike the broadcast/seqlock bus this workspace's
//! sibling crates use for cross-process SPMC feeds, the engine here is a
//! single process with a handful of cooperating threads, so the ring is
//! built directly on `std::sync::{Mutex, Condvar}` rather than shared
//! memory.

pub mod message_ring;

pub use message_ring::MessageRing;
