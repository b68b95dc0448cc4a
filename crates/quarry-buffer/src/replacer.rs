//! Page replacement policies for the buffer pool.

use crate::frame::FrameId;
use parking_lot::Mutex;

/// Trait for page replacement algorithms.
pub trait Replacer: Send + Sync {
    /// Starts tracking a frame that just received a page.
    fn insert(&self, frame_id: FrameId);

    /// Records that the given frame was accessed.
    fn record_access(&self, frame_id: FrameId);

    /// Selects a victim among tracked frames for which `can_evict` holds.
    ///
    /// The victim stops being tracked. Returns None if no frame qualifies.
    fn evict(&self, can_evict: &dyn Fn(FrameId) -> bool) -> Option<FrameId>;

    /// Stops tracking a frame.
    fn remove(&self, frame_id: FrameId);

    /// Returns the number of tracked frames.
    fn size(&self) -> usize;
}

/// Clock (second chance) replacement.
///
/// Frames sit on a circular dial with a reference bit each. The hand skips
/// frames that are not tracked or not evictable, clears set reference bits,
/// and picks the first candidate whose bit is already clear.
pub struct ClockReplacer {
    inner: Mutex<ClockState>,
}

struct ClockState {
    tracked: Vec<bool>,
    reference_bits: Vec<bool>,
    hand: usize,
    size: usize,
}

impl ClockReplacer {
    /// Creates a new clock replacer with the given number of frames.
    pub fn new(num_frames: usize) -> Self {
        Self {
            inner: Mutex::new(ClockState {
                tracked: vec![false; num_frames],
                reference_bits: vec![false; num_frames],
                hand: 0,
                size: 0,
            }),
        }
    }

    /// Returns the total capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().tracked.len()
    }
}

impl Replacer for ClockReplacer {
    fn insert(&self, frame_id: FrameId) {
        let mut state = self.inner.lock();
        let idx = frame_id.0 as usize;
        if idx >= state.tracked.len() {
            return;
        }
        if !state.tracked[idx] {
            state.tracked[idx] = true;
            state.size += 1;
        }
        state.reference_bits[idx] = true;
    }

    fn record_access(&self, frame_id: FrameId) {
        let mut state = self.inner.lock();
        if let Some(bit) = state.reference_bits.get_mut(frame_id.0 as usize) {
            *bit = true;
        }
    }

    fn evict(&self, can_evict: &dyn Fn(FrameId) -> bool) -> Option<FrameId> {
        let mut state = self.inner.lock();
        let num_frames = state.tracked.len();
        if state.size == 0 {
            return None;
        }

        // The first sweep clears reference bits, the second finds them clear.
        for _ in 0..(2 * num_frames) {
            let hand = state.hand;
            state.hand = (hand + 1) % num_frames;

            if !state.tracked[hand] || !can_evict(FrameId(hand as u32)) {
                continue;
            }
            if state.reference_bits[hand] {
                state.reference_bits[hand] = false;
                continue;
            }

            state.tracked[hand] = false;
            state.size -= 1;
            return Some(FrameId(hand as u32));
        }

        None
    }

    fn remove(&self, frame_id: FrameId) {
        let mut state = self.inner.lock();
        let idx = frame_id.0 as usize;
        if idx < state.tracked.len() && state.tracked[idx] {
            state.tracked[idx] = false;
            state.reference_bits[idx] = false;
            state.size -= 1;
        }
    }

    fn size(&self) -> usize {
        self.inner.lock().size
    }
}
