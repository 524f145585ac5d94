//! Imagery stream guards.

mod dedup;

pub use dedup::{DedupGuard, FrameDecision};
