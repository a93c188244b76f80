#![forbid(unsafe_code)]

//! Frame-cadence throttling for high-frequency pointer input.
//!
//! Pointer moves can arrive many times per frame. Applying each one would
//! re-layout redundantly, so throttled consumers push them through a
//! [`FrameThrottle`] which keeps only the most recent value and tells the
//! caller when a frame needs to be requested.
//!
//! # Design
//!
//! "Latest wins": at most one value is pending, and at most one frame request
//! is outstanding. Superseded values within a frame are dropped, never queued.
//!
//! ```
//! use grapple_core::frame_throttle::FrameThrottle;
//!
//! let mut throttle = FrameThrottle::new();
//! assert!(throttle.push(1));   // first value: caller schedules a frame
//! assert!(!throttle.push(2));  // frame already requested: coalesced
//! assert!(!throttle.push(3));
//! assert_eq!(throttle.take(), Some(3));
//! assert_eq!(throttle.coalesced(), 2);
//! ```

/// Single-slot, latest-wins coalescer.
///
/// # Thread Safety
///
/// Not thread-safe; use from the event loop that owns the gesture.
#[derive(Debug, Clone)]
pub struct FrameThrottle<T> {
    pending: Option<T>,
    scheduled: bool,
    coalesced: u64,
}

impl<T> Default for FrameThrottle<T> {
    fn default() -> Self {
        Self {
            pending: None,
            scheduled: false,
            coalesced: 0,
        }
    }
}

impl<T> FrameThrottle<T> {
    /// Create an empty throttle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` as the pending update.
    ///
    /// Returns `true` when no frame is outstanding yet, meaning the caller
    /// must request one. Returns `false` when the value replaced an earlier
    /// pending one inside the same frame.
    pub fn push(&mut self, value: T) -> bool {
        if self.pending.replace(value).is_some() {
            self.coalesced = self.coalesced.saturating_add(1);
        }
        if self.scheduled {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    /// Consume the pending value at frame time.
    pub fn take(&mut self) -> Option<T> {
        self.scheduled = false;
        self.pending.take()
    }

    /// Drop the pending value and forget the outstanding frame.
    ///
    /// Returns the value that was dropped, so callers that must not lose the
    /// final position can apply it synchronously.
    pub fn cancel(&mut self) -> Option<T> {
        self.take()
    }

    /// Whether a frame is outstanding.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Whether a value is waiting for the next frame.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total number of values superseded before reaching a frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
