use parking_lot::Mutex;

use super::phase::{ChangePhase, PhaseTracker};
use crate::driver::Driver;
use crate::host::HostMessage;
use crate::object::{AudioObjectId, ObjectId, expect_object};
use crate::utils::error::{HardwareError, HardwareResult};

/// A sample-rate change waiting for the host to call back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigChangeRequest {
    pub object: AudioObjectId,
    pub sample_rate: f64,
    /// Change action handed to the host and echoed back on perform/abort
    pub token: u64,
}

impl ConfigChangeRequest {
    pub fn for_rate(sample_rate: f64) -> Self {
        Self {
            object: ObjectId::Device.id(),
            sample_rate,
            token: sample_rate as u64,
        }
    }
}

/// Two-phase sample-rate changes
///
/// A property set only records the request and asks the host to begin a
/// configuration change. The rate is applied when the host, with I/O
/// stopped, calls [`perform`](Self::perform) with the same token.
pub struct ConfigChangeCoordinator {
    phase: PhaseTracker,
    /// Coordinator lock, taken before the driver state lock
    pending: Mutex<Vec<ConfigChangeRequest>>,
}

impl ConfigChangeCoordinator {
    pub fn new() -> Self {
        Self {
            phase: PhaseTracker::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn phase(&self) -> ChangePhase {
        self.phase.current()
    }

    pub fn pending(&self) -> Vec<ConfigChangeRequest> {
        self.pending.lock().clone()
    }

    fn check_rate(driver: &Driver, sample_rate: f64) -> HardwareResult<()> {
        if !driver.config().supports_sample_rate(sample_rate) {
            return Err(HardwareError::illegal(format!(
                "unsupported sample rate {sample_rate}"
            )));
        }
        Ok(())
    }

    /// Ask the host to change the nominal rate
    ///
    /// Returns as soon as the request is queued. Requesting the current
    /// rate does nothing.
    pub fn request_sample_rate(&self, driver: &Driver, sample_rate: f64) -> HardwareResult<()> {
        Self::check_rate(driver, sample_rate)?;

        let mut pending = self.pending.lock();
        if sample_rate == driver.sample_rate() {
            tracing::debug!(sample_rate, "Sample rate already current");
            return Ok(());
        }

        let request = ConfigChangeRequest::for_rate(sample_rate);
        driver.post(HostMessage::RequestConfigurationChange {
            device: request.object,
            change_action: request.token,
        })?;

        if !pending.iter().any(|r| r.token == request.token) {
            pending.push(request);
        }
        self.phase.transition(ChangePhase::Requested)?;

        tracing::info!(sample_rate, outstanding = pending.len(), "Sample rate change requested");
        Ok(())
    }

    /// Apply the change identified by `token`; the host has stopped I/O
    pub fn perform(&self, driver: &Driver, device: AudioObjectId, token: u64) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        let sample_rate = token as f64;
        Self::check_rate(driver, sample_rate)?;

        let mut pending = self.pending.lock();
        match pending.iter().position(|r| r.token == token) {
            Some(index) => {
                pending.remove(index);
            }
            None => tracing::warn!(token, "Performing a configuration change that was not requested"),
        }

        self.phase.transition(ChangePhase::Performing)?;
        driver.apply_sample_rate(sample_rate);
        self.phase.transition(Self::settled(&pending))?;

        tracing::info!(sample_rate, "Sample rate changed");
        Ok(())
    }

    /// Discard the change identified by `token`
    pub fn abort(&self, device: AudioObjectId, token: u64) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;

        let mut pending = self.pending.lock();
        let Some(index) = pending.iter().position(|r| r.token == token) else {
            tracing::debug!(token, "Abort for a configuration change that is not pending");
            return Ok(());
        };

        let request = pending.remove(index);
        self.phase.transition(ChangePhase::Aborting)?;
        self.phase.transition(Self::settled(&pending))?;

        tracing::info!(sample_rate = request.sample_rate, "Sample rate change aborted");
        Ok(())
    }

    fn settled(pending: &[ConfigChangeRequest]) -> ChangePhase {
        if pending.is_empty() {
            ChangePhase::Idle
        } else {
            ChangePhase::Requested
        }
    }
}

impl Default for ConfigChangeCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
