//! Loopback ring buffer
//!
//! A fixed-capacity circular array of interleaved `f32` frames addressed by
//! absolute sample time rather than by read/write cursors: the writer and
//! the reader each land at `sample_time mod capacity`, so a read for a given
//! sample time returns whatever the writer stored for that time one or more
//! laps ago.
//!
//! Samples are held as `AtomicU32` bit patterns so the real-time thread can
//! copy in and out of a buffer shared through an `Arc` without locking.
//!
//! # Example
//!
//! ```
//! use loopdev_lib::engine::RingBuffer;
//!
//! let ring = RingBuffer::new(8, 2);
//! ring.write(6, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
//!
//! let mut out = [0.0f32; 4];
//! ring.read(8, &mut out);
//! assert_eq!(out, [3.0, 3.0, 4.0, 4.0]);
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

pub struct RingBuffer {
    frames: usize,
    channels: usize,
    samples: Box<[AtomicU32]>,
}

impl RingBuffer {
    /// Allocate a zeroed buffer of `frames` frames
    ///
    /// `frames` must be a power of two; the configuration layer enforces it.
    pub fn new(frames: usize, channels: usize) -> Self {
        debug_assert!(frames.is_power_of_two());
        let samples = (0..frames * channels).map(|_| AtomicU32::new(0)).collect();
        Self {
            frames,
            channels,
            samples,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frame index for `sample_time`; a mask because capacity is a power of two
    pub fn frame_offset(&self, sample_time: u64) -> usize {
        (sample_time & (self.frames as u64 - 1)) as usize
    }

    /// Split a transfer of `frames` starting at `start` into the part before
    /// the end of the buffer and the part that wraps to the front
    fn segments(&self, start: usize, frames: usize) -> (usize, usize) {
        let first = frames.min(self.frames - start);
        (first, frames - first)
    }

    /// Store interleaved frames starting at `sample_time`
    pub fn write(&self, sample_time: u64, input: &[f32]) {
        let start = self.frame_offset(sample_time);
        let frames = (input.len() / self.channels).min(self.frames);
        let (first, second) = self.segments(start, frames);
        let split = first * self.channels;

        store(&self.samples[start * self.channels..][..split], &input[..split]);
        store(
            &self.samples[..second * self.channels],
            &input[split..split + second * self.channels],
        );
    }

    /// Load interleaved frames starting at `sample_time`
    pub fn read(&self, sample_time: u64, output: &mut [f32]) {
        let start = self.frame_offset(sample_time);
        let frames = (output.len() / self.channels).min(self.frames);
        let (first, second) = self.segments(start, frames);
        let split = first * self.channels;

        let (head, tail) = output.split_at_mut(split);
        load(&self.samples[start * self.channels..][..split], head);
        load(
            &self.samples[..second * self.channels],
            &mut tail[..second * self.channels],
        );
    }

    pub fn clear(&self) {
        for sample in self.samples.iter() {
            sample.store(0, Ordering::Relaxed);
        }
    }
}

fn store(dst: &[AtomicU32], src: &[f32]) {
    for (slot, sample) in dst.iter().zip(src) {
        slot.store(sample.to_bits(), Ordering::Relaxed);
    }
}

fn load(src: &[AtomicU32], dst: &mut [f32]) {
    for (sample, slot) in dst.iter_mut().zip(src) {
        *sample = f32::from_bits(slot.load(Ordering::Relaxed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_is_silent() {
        let ring = RingBuffer::new(16, 2);
        let mut out = [1.0f32; 32];
        ring.read(0, &mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_write_then_read() {
        let ring = RingBuffer::new(16, 1);
        ring.write(3, &[0.1, 0.2, 0.3]);

        let mut out = [0.0f32; 3];
        ring.read(3, &mut out);
        assert_eq!(out, [0.1, 0.2, 0.3]);

        // one lap later lands on the same frames
        ring.read(19, &mut out);
        assert_eq!(out, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_wrapping_write() {
        let ring = RingBuffer::new(4, 1);
        ring.write(2, &[1.0, 2.0, 3.0, 4.0]);

        let mut out = [0.0f32; 4];
        ring.read(0, &mut out);
        assert_eq!(out, [3.0, 4.0, 1.0, 2.0]);
    }

    #[test]
    fn test_clear() {
        let ring = RingBuffer::new(4, 2);
        ring.write(0, &[0.5; 8]);
        ring.clear();

        let mut out = [1.0f32; 8];
        ring.read(0, &mut out);
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn test_oversized_transfer_is_clamped() {
        let ring = RingBuffer::new(4, 1);
        ring.write(0, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let mut out = [0.0f32; 6];
        ring.read(0, &mut out);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn offset_mask_equals_modulo(t in any::<u64>(), shift in 0u32..20) {
            let frames = 1usize << shift;
            let ring = RingBuffer::new(frames, 1);
            prop_assert_eq!(ring.frame_offset(t) as u64, t % frames as u64);
        }
    }
}
