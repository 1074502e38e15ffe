use std::sync::atomic::{AtomicU64, Ordering};

/// Frame number used to tag output. Advanced after every frame-boundary call.
#[derive(Debug, Default)]
pub struct FrameCounter {
    frame: AtomicU64,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.frame.load(Ordering::Relaxed)
    }

    /// Returns the new frame number.
    pub fn advance(&self) -> u64 {
        self.frame.fetch_add(1, Ordering::Relaxed) + 1
    }
}
