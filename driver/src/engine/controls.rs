use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Master mute and gain, shared by both directions
///
/// Writers hold the driver's state lock so compare-and-set stays atomic
/// with respect to other property writes; the I/O thread reads without
/// locking and may see a change one cycle late.
#[derive(Debug)]
pub struct MasterControls {
    muted: AtomicBool,
    /// f32 bits of the linear gain
    gain: AtomicU32,
}

impl MasterControls {
    pub fn new(muted: bool, gain: f32) -> Self {
        Self {
            muted: AtomicBool::new(muted),
            gain: AtomicU32::new(gain.to_bits()),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    pub(crate) fn store_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub(crate) fn store_gain(&self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }
}

impl Default for MasterControls {
    fn default() -> Self {
        Self::new(false, 1.0)
    }
}
