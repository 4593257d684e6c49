//! Current sensor offset calibration
//!
//! Averages the phase ADC codes over a fixed number of control ticks while
//! no current flows, giving the zero-current offset of each channel.

use crate::hardware::PhaseAdc;

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationState {
    /// Accumulating samples
    Sampling,
    /// Offsets are valid
    Completed,
}

/// Zero-current ADC code of each phase
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurrentOffsets {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

/// Multi-tick ADC offset averager
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentOffsetCalibration {
    state: CalibrationState,
    /// Samples to average
    samples: u16,
    /// Samples accumulated so far
    count: u16,
    sum_u: u32,
    sum_v: u32,
    sum_w: u32,
    offsets: CurrentOffsets,
}

impl CurrentOffsetCalibration {
    /// # Arguments
    /// * `samples` - Number of ticks to average, at least one
    pub const fn new(samples: u16) -> Self {
        Self {
            state: CalibrationState::Sampling,
            samples: if samples == 0 { 1 } else { samples },
            count: 0,
            sum_u: 0,
            sum_v: 0,
            sum_w: 0,
            offsets: CurrentOffsets {
                u: 0.0,
                v: 0.0,
                w: 0.0,
            },
        }
    }

    /// Accumulate one sample
    ///
    /// # Returns
    /// `true` once the offsets are available
    pub fn update(&mut self, adc: PhaseAdc) -> bool {
        if self.state == CalibrationState::Completed {
            return true;
        }

        self.sum_u += adc.u as u32;
        self.sum_v += adc.v as u32;
        self.sum_w += adc.w as u32;
        self.count += 1;

        if self.count >= self.samples {
            let n = self.samples as f32;
            self.offsets = CurrentOffsets {
                u: self.sum_u as f32 / n,
                v: self.sum_v as f32 / n,
                w: self.sum_w as f32 / n,
            };
            self.state = CalibrationState::Completed;
            info!(
                "Current offsets: U={}, V={}, W={} ({} samples)",
                self.offsets.u, self.offsets.v, self.offsets.w, self.samples
            );
            return true;
        }

        false
    }

    /// Discard the offsets and start sampling again
    pub fn restart(&mut self) {
        *self = Self::new(self.samples);
    }

    pub fn is_completed(&self) -> bool {
        self.state == CalibrationState::Completed
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Samples accumulated so far
    pub fn progress(&self) -> u16 {
        self.count
    }

    pub fn offsets(&self) -> CurrentOffsets {
        self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adc(u: u16, v: u16, w: u16) -> PhaseAdc {
        PhaseAdc { u, v, w }
    }

    #[test]
    fn test_completes_after_sample_count() {
        let mut calibration = CurrentOffsetCalibration::new(4);
        assert!(!calibration.update(adc(2040, 2050, 2060)));
        assert!(!calibration.update(adc(2042, 2050, 2060)));
        assert!(!calibration.update(adc(2044, 2050, 2060)));
        assert!(calibration.update(adc(2046, 2050, 2060)));

        assert!(calibration.is_completed());
        let offsets = calibration.offsets();
        assert_eq!(offsets.u, 2043.0);
        assert_eq!(offsets.v, 2050.0);
        assert_eq!(offsets.w, 2060.0);
    }

    #[test]
    fn test_ignores_samples_after_completion() {
        let mut calibration = CurrentOffsetCalibration::new(1);
        assert!(calibration.update(adc(2000, 2000, 2000)));
        assert!(calibration.update(adc(0, 0, 0)));
        assert_eq!(calibration.offsets().u, 2000.0);
    }

    #[test]
    fn test_full_scale_does_not_overflow() {
        let mut calibration = CurrentOffsetCalibration::new(u16::MAX);
        for _ in 0..u16::MAX {
            calibration.update(adc(4095, 4095, 4095));
        }
        assert!(calibration.is_completed());
        assert_eq!(calibration.offsets().w, 4095.0);
    }

    #[test]
    fn test_restart() {
        let mut calibration = CurrentOffsetCalibration::new(2);
        calibration.update(adc(1, 1, 1));
        calibration.update(adc(1, 1, 1));
        calibration.restart();
        assert!(!calibration.is_completed());
        assert_eq!(calibration.progress(), 0);
    }
}
