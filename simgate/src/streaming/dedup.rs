//! Duplicate-frame suppression.
//!
//! The simulator answers every imagery pull with whatever frame it rendered
//! last, so a poll loop running faster than the render rate sees the same
//! frame more than once. Frames carry no sequence number; the metadata
//! timestamp is the only identity a frame has, so two pulls with equal
//! timestamps are the same render and all but the first must be dropped.

/// Verdict for one pulled frame set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    /// First sighting of this timestamp, forward the frames.
    Publish,
    /// Same timestamp as the previously published set, drop silently.
    Duplicate,
}

/// Tracks the timestamp of the last published frame set.
///
/// Deciding and recording are separate steps: [`check`](Self::check) only
/// compares, and the caller calls [`commit`](Self::commit) once the frames
/// actually went out. A cycle that fails between the two leaves the guard
/// unchanged, so the same timestamp gets another chance on the next pull.
#[derive(Debug, Default)]
pub struct DedupGuard {
    last_published: Option<f64>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a frame set stamped `time` should go out.
    pub fn check(&self, time: f64) -> FrameDecision {
        if self.last_published == Some(time) {
            FrameDecision::Duplicate
        } else {
            FrameDecision::Publish
        }
    }

    /// Record that the frame set stamped `time` was published.
    pub fn commit(&mut self, time: f64) {
        self.last_published = Some(time);
    }

    /// Timestamp of the last frame set that was allowed through.
    pub fn last_published(&self) -> Option<f64> {
        self.last_published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_publishes() {
        let guard = DedupGuard::new();
        assert_eq!(guard.check(0.0), FrameDecision::Publish);
    }

    #[test]
    fn test_committed_timestamp_drops() {
        let mut guard = DedupGuard::new();
        assert_eq!(guard.check(1.5), FrameDecision::Publish);
        guard.commit(1.5);
        assert_eq!(guard.check(1.5), FrameDecision::Duplicate);
        assert_eq!(guard.check(1.5), FrameDecision::Duplicate);
        assert_eq!(guard.last_published(), Some(1.5));
    }

    #[test]
    fn test_new_timestamp_publishes_again() {
        let mut guard = DedupGuard::new();
        guard.commit(1.5);
        assert_eq!(guard.check(1.55), FrameDecision::Publish);
        guard.commit(1.55);
        assert_eq!(guard.last_published(), Some(1.55));
    }

    #[test]
    fn test_uncommitted_check_leaves_guard_unchanged() {
        // A failed cycle never commits; the same timestamp must still be
        // publishable on the retry.
        let mut guard = DedupGuard::new();
        guard.commit(1.0);
        assert_eq!(guard.check(2.0), FrameDecision::Publish);
        assert_eq!(guard.last_published(), Some(1.0));
        assert_eq!(guard.check(2.0), FrameDecision::Publish);
    }
}
