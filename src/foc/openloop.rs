// V/f open-loop voltage generator
//
// Rotates a fixed q-axis voltage at a ramped electrical frequency without any
// angle feedback. Used to check the power stage and the encoder direction on
// the bench.

use core::f32::consts::TAU;

use super::angle::normalize_angle;

/// Open-loop drive parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenLoopConfig {
    /// Electrical frequency once ramped up [Hz]
    pub frequency_hz: f32,
    /// Frequency ramp [Hz/s]
    pub ramp_hz_per_s: f32,
    /// q-axis voltage [V]
    pub voltage: f32,
}

/// Open-loop angle and voltage generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenLoopDrive {
    config: OpenLoopConfig,
    /// Current electrical angle [rad]
    electrical_angle: f32,
    /// Current electrical frequency [Hz]
    frequency: f32,
}

impl OpenLoopDrive {
    pub const fn new(config: OpenLoopConfig) -> Self {
        Self {
            config,
            electrical_angle: 0.0,
            frequency: 0.0,
        }
    }

    /// Advance one control period
    ///
    /// # Arguments
    /// * `dt` - Control period [s]
    ///
    /// # Returns
    /// * `(electrical_angle, vq)` - Electrical angle [rad] and q-axis voltage [V]
    pub fn update(&mut self, dt: f32) -> (f32, f32) {
        let target = self.config.frequency_hz;
        let step = self.config.ramp_hz_per_s * dt;

        // Ramp towards the target in either direction
        if self.frequency < target {
            self.frequency = (self.frequency + step).min(target);
        } else if self.frequency > target {
            self.frequency = (self.frequency - step).max(target);
        }

        self.electrical_angle = normalize_angle(self.electrical_angle + TAU * self.frequency * dt);

        (self.electrical_angle, self.config.voltage)
    }

    /// Whether the ramp has reached the configured frequency
    pub fn is_target_reached(&self) -> bool {
        self.frequency == self.config.frequency_hz
    }

    /// Current electrical frequency [Hz]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn electrical_angle(&self) -> f32 {
        self.electrical_angle
    }

    pub fn set_config(&mut self, config: OpenLoopConfig) {
        self.config = config;
    }

    pub fn reset(&mut self) {
        self.electrical_angle = 0.0;
        self.frequency = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.000_05;

    fn config() -> OpenLoopConfig {
        OpenLoopConfig {
            frequency_hz: 10.0,
            ramp_hz_per_s: 20.0,
            voltage: 1.0,
        }
    }

    #[test]
    fn test_ramps_to_frequency() {
        let mut drive = OpenLoopDrive::new(config());
        // 0.5 s of ramp at 20 Hz/s
        for _ in 0..10_000 {
            drive.update(DT);
        }
        assert!((drive.frequency() - 10.0).abs() < 0.01);

        for _ in 0..1_000 {
            drive.update(DT);
        }
        assert!(drive.is_target_reached());
    }

    #[test]
    fn test_angle_stays_normalized_and_voltage_fixed() {
        let mut drive = OpenLoopDrive::new(config());
        for _ in 0..50_000 {
            let (angle, vq) = drive.update(DT);
            assert!((0.0..TAU).contains(&angle));
            assert_eq!(vq, 1.0);
        }
    }

    #[test]
    fn test_reset() {
        let mut drive = OpenLoopDrive::new(config());
        drive.update(DT);
        drive.reset();
        assert_eq!(drive.frequency(), 0.0);
        assert_eq!(drive.electrical_angle(), 0.0);
    }
}
