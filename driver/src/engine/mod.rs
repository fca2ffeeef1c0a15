//! Real-time I/O engine
//!
//! Owns everything the host's I/O thread touches: the loopback ring buffer,
//! the zero-time-stamp anchor and the last-output bookkeeping. The transfer
//! path ([`IoEngine::transfer`]) takes no locks, does not allocate and does
//! not log.
//!
//! Start and stop are reference counted by the caller, which passes in the
//! counter it guards with the driver state lock.

/// Host clock and period anchor
pub mod clock;

/// Master mute and gain
pub mod controls;

/// Sample-time addressed ring buffer
pub mod ring;

pub use clock::{HostClock, ManualClock, MonotonicClock, TimeStamp, ZeroTimeStampAnchor};
pub use controls::MasterControls;
pub use ring::RingBuffer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config::DriverConfig;
use crate::object::fourcc;
use crate::utils::error::{HardwareError, HardwareResult};

/// I/O operation kinds the host may ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoOperation {
    /// Hand previously written audio to the host
    ReadInput,
    /// Take the host's mixed output
    WriteMix,
    Other(u32),
}

impl IoOperation {
    pub const READ_INPUT: u32 = fourcc(b"read");
    pub const WRITE_MIX: u32 = fourcc(b"rmix");

    pub fn code(self) -> u32 {
        match self {
            IoOperation::ReadInput => Self::READ_INPUT,
            IoOperation::WriteMix => Self::WRITE_MIX,
            IoOperation::Other(code) => code,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, IoOperation::Other(_))
    }
}

impl From<u32> for IoOperation {
    fn from(code: u32) -> Self {
        match code {
            Self::READ_INPUT => IoOperation::ReadInput,
            Self::WRITE_MIX => IoOperation::WriteMix,
            other => IoOperation::Other(other),
        }
    }
}

/// Answer to "will you do this operation"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoCapability {
    pub will_do: bool,
    pub in_place: bool,
}

/// Timing of one I/O cycle as the host describes it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IoCycleInfo {
    pub cycle_counter: u64,
    pub input_time: TimeStamp,
    pub output_time: TimeStamp,
}

impl IoCycleInfo {
    /// Cycle whose input and output both start at the given sample times
    pub fn at(input_sample_time: f64, output_sample_time: f64) -> Self {
        Self {
            cycle_counter: 0,
            input_time: TimeStamp {
                sample_time: input_sample_time,
                ..TimeStamp::default()
            },
            output_time: TimeStamp {
                sample_time: output_sample_time,
                ..TimeStamp::default()
            },
        }
    }
}

pub struct IoEngine {
    ring_frames: usize,
    channels: usize,
    clock: Arc<dyn HostClock>,
    /// Allocated while at least one client runs I/O
    ring: ArcSwapOption<RingBuffer>,
    /// I/O lock
    anchor: Mutex<ZeroTimeStampAnchor>,
    /// f64 bits of the output sample time of the latest write
    last_output_sample_time: AtomicU64,
    buffer_clear: AtomicBool,
}

impl IoEngine {
    pub fn new(config: &DriverConfig, clock: Arc<dyn HostClock>) -> Self {
        let ticks_per_frame = clock.ticks_per_second() / config.default_sample_rate;
        Self {
            ring_frames: config.ring_buffer_frames as usize,
            channels: config.channels as usize,
            clock,
            ring: ArcSwapOption::empty(),
            anchor: Mutex::new(ZeroTimeStampAnchor::new(
                config.zero_timestamp_period,
                ticks_per_frame,
            )),
            last_output_sample_time: AtomicU64::new(0.0f64.to_bits()),
            buffer_clear: AtomicBool::new(true),
        }
    }

    pub fn clock(&self) -> &Arc<dyn HostClock> {
        &self.clock
    }

    /// Recompute host ticks per frame for a new nominal rate
    pub fn set_sample_rate(&self, sample_rate: f64) {
        let ticks = self.clock.ticks_per_second() / sample_rate;
        self.anchor.lock().set_host_ticks_per_frame(ticks);
    }

    pub fn host_ticks_per_frame(&self) -> f64 {
        self.anchor.lock().host_ticks_per_frame()
    }

    pub fn is_allocated(&self) -> bool {
        self.ring.load().is_some()
    }

    /// Register one more I/O client; the first one allocates the buffer
    /// and restarts the time line
    pub fn start(&self, io_running: &mut u64) -> HardwareResult<()> {
        match *io_running {
            u64::MAX => Err(HardwareError::illegal("I/O client count overflow")),
            0 => {
                self.ring
                    .store(Some(Arc::new(RingBuffer::new(self.ring_frames, self.channels))));
                self.last_output_sample_time
                    .store(0.0f64.to_bits(), Ordering::Relaxed);
                self.buffer_clear.store(true, Ordering::Relaxed);
                self.anchor.lock().reset(self.clock.now());
                *io_running = 1;
                tracing::info!(frames = self.ring_frames, "I/O started");
                Ok(())
            }
            _ => {
                *io_running += 1;
                tracing::debug!(clients = *io_running, "I/O client added");
                Ok(())
            }
        }
    }

    /// Drop one I/O client; the last one frees the buffer
    pub fn stop(&self, io_running: &mut u64) -> HardwareResult<()> {
        match *io_running {
            0 => Err(HardwareError::illegal("I/O is not running")),
            1 => {
                self.ring.store(None);
                *io_running = 0;
                tracing::info!("I/O stopped");
                Ok(())
            }
            _ => {
                *io_running -= 1;
                tracing::debug!(clients = *io_running, "I/O client removed");
                Ok(())
            }
        }
    }

    /// Boundary of the current period, advancing it if the clock has moved
    /// past the next one
    pub fn zero_time_stamp(&self) -> TimeStamp {
        let mut anchor = self.anchor.lock();
        anchor.advance(self.clock.now())
    }

    pub fn will_do(&self, operation: IoOperation) -> IoCapability {
        IoCapability {
            will_do: operation.is_supported(),
            in_place: true,
        }
    }

    /// Move one cycle of audio between `buffer` and the ring
    ///
    /// Unsupported operations, and any call while I/O is stopped, leave
    /// `buffer` untouched. The window is clamped to the ring capacity and
    /// to the buffer's length.
    pub fn transfer(
        &self,
        operation: IoOperation,
        frames: u32,
        cycle: &IoCycleInfo,
        buffer: &mut [f32],
        controls: &MasterControls,
    ) {
        let guard = self.ring.load();
        let Some(ring) = Option::as_ref(&guard) else {
            return;
        };

        let window = (frames as usize)
            .min(ring.frames())
            .min(buffer.len() / ring.channels());
        let buffer = &mut buffer[..window * ring.channels()];

        match operation {
            IoOperation::ReadInput => {
                self.read_input(ring, frames, cycle.input_time.sample_time, buffer, controls)
            }
            IoOperation::WriteMix => self.write_mix(ring, cycle.output_time.sample_time, buffer),
            IoOperation::Other(_) => {}
        }
    }

    fn read_input(
        &self,
        ring: &RingBuffer,
        frames: u32,
        sample_time: f64,
        buffer: &mut [f32],
        controls: &MasterControls,
    ) {
        let last_output = f64::from_bits(self.last_output_sample_time.load(Ordering::Relaxed));

        // nothing has been written recently enough to cover this window
        if controls.is_muted() || last_output - f64::from(frames) < sample_time {
            buffer.fill(0.0);
            if !self.buffer_clear.swap(true, Ordering::Relaxed) {
                ring.clear();
            }
            return;
        }

        ring.read(sample_time as u64, buffer);
        let gain = controls.gain();
        for sample in buffer.iter_mut() {
            *sample *= gain;
        }
    }

    fn write_mix(&self, ring: &RingBuffer, sample_time: f64, buffer: &[f32]) {
        self.last_output_sample_time
            .store(sample_time.to_bits(), Ordering::Relaxed);
        self.buffer_clear.store(false, Ordering::Relaxed);
        ring.write(sample_time as u64, buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn engine(frames: u32) -> (IoEngine, Arc<ManualClock>) {
        let config = DriverConfig {
            ring_buffer_frames: frames,
            zero_timestamp_period: frames,
            ..DriverConfig::default()
        };
        let clock = Arc::new(ManualClock::new(48_000.0));
        (IoEngine::new(&config, clock.clone()), clock)
    }

    #[test]
    fn test_io_operation_codes() {
        assert_eq!(IoOperation::from(IoOperation::READ_INPUT), IoOperation::ReadInput);
        assert_eq!(IoOperation::from(IoOperation::WRITE_MIX), IoOperation::WriteMix);
        assert_eq!(IoOperation::from(fourcc(b"mixo")).code(), fourcc(b"mixo"));
    }

    #[test]
    fn test_will_do() {
        let (engine, _) = engine(64);
        assert!(engine.will_do(IoOperation::ReadInput).will_do);
        assert!(engine.will_do(IoOperation::WriteMix).will_do);
        let other = engine.will_do(IoOperation::Other(fourcc(b"cycl")));
        assert!(!other.will_do);
        assert!(other.in_place);
    }

    #[test]
    fn test_start_stop_refcount() {
        let (engine, _) = engine(64);
        let mut running = 0u64;

        engine.start(&mut running).unwrap();
        engine.start(&mut running).unwrap();
        assert_eq!(running, 2);
        assert!(engine.is_allocated());

        engine.stop(&mut running).unwrap();
        assert!(engine.is_allocated());
        engine.stop(&mut running).unwrap();
        assert_eq!(running, 0);
        assert!(!engine.is_allocated());

        assert!(matches!(
            engine.stop(&mut running),
            Err(HardwareError::IllegalOperation(_))
        ));
    }

    #[test]
    fn test_start_overflow() {
        let (engine, _) = engine(64);
        let mut running = u64::MAX;
        assert!(engine.start(&mut running).is_err());
        assert_eq!(running, u64::MAX);
    }

    #[test]
    fn test_start_resets_anchor() {
        let (engine, clock) = engine(64);
        let mut running = 0u64;

        clock.set(1_000);
        engine.start(&mut running).unwrap();
        let ts = engine.zero_time_stamp();
        assert_eq!(ts.sample_time, 0.0);
        assert_eq!(ts.host_time, 1_000);

        // one tick per frame at 48 kHz on a 48 kHz clock
        clock.advance(64);
        let ts = engine.zero_time_stamp();
        assert_eq!(ts.sample_time, 64.0);
        assert_eq!(ts.host_time, 1_064);
    }

    #[test]
    fn test_transfer_without_start_is_noop() {
        let (engine, _) = engine(64);
        let mut buffer = [0.7f32; 16];
        engine.transfer(
            IoOperation::ReadInput,
            8,
            &IoCycleInfo::default(),
            &mut buffer,
            &MasterControls::default(),
        );
        assert_eq!(buffer, [0.7; 16]);
    }

    #[test]
    fn test_loopback_with_gain() {
        let (engine, _) = engine(64);
        let mut running = 0;
        engine.start(&mut running).unwrap();
        let controls = MasterControls::new(false, 0.5);

        let mut mix = vec![0.8f32; 128];
        engine.transfer(
            IoOperation::WriteMix,
            64,
            &IoCycleInfo::at(0.0, 64.0),
            &mut mix,
            &controls,
        );

        let mut input = vec![0.0f32; 128];
        engine.transfer(
            IoOperation::ReadInput,
            64,
            &IoCycleInfo::at(0.0, 64.0),
            &mut input,
            &controls,
        );
        assert!(input.iter().all(|s| *s == 0.4));
    }

    #[test]
    fn test_stale_read_clears_ring() {
        let (engine, _) = engine(64);
        let mut running = 0;
        engine.start(&mut running).unwrap();
        let controls = MasterControls::default();

        let mut mix = vec![0.3f32; 32];
        engine.transfer(IoOperation::WriteMix, 16, &IoCycleInfo::at(0.0, 0.0), &mut mix, &controls);

        // last output 0 - 16 < 0: stale
        let mut input = vec![1.0f32; 32];
        engine.transfer(IoOperation::ReadInput, 16, &IoCycleInfo::at(0.0, 0.0), &mut input, &controls);
        assert!(input.iter().all(|s| *s == 0.0));

        // the ring itself was zeroed, not just the output
        let ring = engine.ring.load_full().unwrap();
        let mut raw = vec![1.0f32; 32];
        ring.read(0, &mut raw);
        assert!(raw.iter().all(|s| *s == 0.0));
    }

    proptest! {
        #[test]
        fn muted_read_is_exact_silence(frames in 1u32..=256, start in 0u64..10_000) {
            let (engine, _) = engine(256);
            let mut running = 0;
            engine.start(&mut running).unwrap();
            let controls = MasterControls::new(true, 1.0);

            let mut mix = vec![0.9f32; 512];
            let far_ahead = (start + 1_000) as f64;
            engine.transfer(IoOperation::WriteMix, 256, &IoCycleInfo::at(0.0, far_ahead), &mut mix, &controls);

            let mut input = vec![0.5f32; frames as usize * 2];
            engine.transfer(IoOperation::ReadInput, frames, &IoCycleInfo::at(start as f64, 0.0), &mut input, &controls);
            prop_assert!(input.iter().all(|s| *s == 0.0));
        }
    }
}
