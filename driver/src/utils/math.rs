//! Decibel and scalar conversions used by the volume control
//!
//! The master gain is stored as linear amplitude. These helpers map it to
//! and from decibels and the normalized `[0, 1]` slider position.

/// Floor applied before taking a logarithm so silence maps to a finite value
const AMPLITUDE_FLOOR: f32 = 1.0e-23;

pub fn amplitude_to_decibels(amplitude: f32) -> f32 {
    20.0 * amplitude.max(AMPLITUDE_FLOOR).log10()
}

pub fn decibels_to_amplitude(decibels: f32) -> f32 {
    10.0_f32.powf(decibels / 20.0)
}

/// Decibel range of a level control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecibelRange {
    pub min: f32,
    pub max: f32,
}

impl DecibelRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn span(&self) -> f32 {
        self.max - self.min
    }

    pub fn clamp(&self, decibels: f32) -> f32 {
        decibels.clamp(self.min, self.max)
    }

    /// Smallest gain the control can produce
    pub fn min_amplitude(&self) -> f32 {
        decibels_to_amplitude(self.min)
    }

    /// Gain expressed in decibels, clamped to the range
    pub fn amplitude_to_decibels(&self, amplitude: f32) -> f32 {
        self.clamp(amplitude_to_decibels(amplitude))
    }

    /// Gain expressed as a linear position in decibel space
    pub fn amplitude_to_scalar(&self, amplitude: f32) -> f32 {
        (self.amplitude_to_decibels(amplitude) - self.min) / self.span()
    }

    pub fn scalar_to_amplitude(&self, scalar: f32) -> f32 {
        self.limit(decibels_to_amplitude(self.min + scalar.clamp(0.0, 1.0) * self.span()))
    }

    /// Gain for a decibel value, clamped to the range and never above unity
    pub fn decibels_to_clamped_amplitude(&self, decibels: f32) -> f32 {
        self.limit(decibels_to_amplitude(self.clamp(decibels)))
    }

    /// Keep a gain within `[min_amplitude, 1.0]`
    fn limit(&self, amplitude: f32) -> f32 {
        amplitude.min(1.0).max(self.min_amplitude())
    }

    /// Slider taper used by the convert-scalar-to-decibels query
    pub fn tapered_scalar_to_decibels(&self, scalar: f32) -> f32 {
        let scalar = scalar.clamp(0.0, 1.0);
        self.min + scalar * scalar * self.span()
    }

    /// Inverse of [`Self::tapered_scalar_to_decibels`]
    pub fn decibels_to_tapered_scalar(&self, decibels: f32) -> f32 {
        ((self.clamp(decibels) - self.min) / self.span()).sqrt()
    }
}
