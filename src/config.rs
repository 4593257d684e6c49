//! Drive configuration
//!
//! [`DriveConfig`] gathers every tunable of the control core. Its defaults
//! come from [`params`] and it can be built in a `const` context so the
//! firmware can keep one in a static.

pub mod params;

pub use params::*;

use crate::bus_voltage::BusVoltageConfig;
use crate::foc::angle::Direction;
use crate::foc::openloop::OpenLoopConfig;
use crate::foc::position::PositionLimits;

/// Configuration rejected by [`DriveConfig::validate`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pole pair count of zero
    ZeroPolePairs,

    /// Control period not a positive finite number
    InvalidControlPeriod,

    /// PWM period of zero counts
    ZeroPwmPeriod,

    /// Bus voltage not a positive finite number
    InvalidBusVoltage,

    /// Speed or position loop divider of zero
    ZeroLoopDivider,

    /// Calibration sample count of zero
    ZeroCalibrationSamples,

    /// A PI output limit with min above max
    InvertedLimits,

    /// Position limits that are zero, negative or not finite
    InvalidPositionLimits,

    /// Current sense scaling that would divide by zero
    InvalidCurrentSense,
}

/// Gains and output clamp of one PI loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiGains {
    pub kp: f32,
    pub ki: f32,
    pub out_min: f32,
    pub out_max: f32,
}

impl PiGains {
    pub const fn symmetric(kp: f32, ki: f32, limit: f32) -> Self {
        Self {
            kp,
            ki,
            out_min: -limit,
            out_max: limit,
        }
    }
}

/// Shunt amplifier chain from ADC counts to amperes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentSense {
    pub adc_vref: f32,
    pub adc_full_scale: u16,
    pub amplifier_gain: f32,
    pub shunt_ohms: f32,
}

impl CurrentSense {
    /// Amperes per ADC count
    pub fn amps_per_count(&self) -> f32 {
        self.adc_vref / (self.amplifier_gain * self.shunt_ohms * self.adc_full_scale as f32)
    }
}

/// Complete configuration of the control core
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    /// Pole pairs of the motor
    pub pole_pairs: u8,
    /// Sign applied to the raw encoder angle
    pub encoder_direction: Direction,
    /// Mechanical angle of electrical zero [rad]
    pub zero_offset: f32,
    /// Control tick period [s]
    pub control_period: f32,
    /// PWM timer period Ts in counts
    pub pwm_period: u16,
    /// Initial DC bus voltage [V]
    pub bus_voltage: f32,
    /// d and q current loops, output in volts
    pub current_pi: PiGains,
    /// Speed loop, output is the q-axis current in amperes
    pub speed_pi: PiGains,
    pub pll_kp: f32,
    pub pll_ki: f32,
    pub position: PositionLimits,
    /// Speed loop runs once every N ticks
    pub speed_loop_divider: u16,
    /// Position loop runs once every N ticks
    pub position_loop_divider: u16,
    /// Samples averaged for the current offset
    pub calibration_samples: u16,
    pub current_sense: CurrentSense,
    pub openloop: OpenLoopConfig,
    pub bus: BusVoltageConfig,
}

impl DriveConfig {
    /// Defaults from [`params`]
    pub const fn default() -> Self {
        Self {
            pole_pairs: DEFAULT_POLE_PAIRS,
            encoder_direction: Direction::Forward,
            zero_offset: DEFAULT_ZERO_OFFSET,
            control_period: DEFAULT_CONTROL_PERIOD,
            pwm_period: DEFAULT_PWM_PERIOD,
            bus_voltage: DEFAULT_BUS_VOLTAGE,
            current_pi: PiGains::symmetric(
                DEFAULT_CURRENT_KP,
                DEFAULT_CURRENT_KI,
                DEFAULT_CURRENT_LIMIT,
            ),
            speed_pi: PiGains::symmetric(DEFAULT_SPEED_KP, DEFAULT_SPEED_KI, DEFAULT_SPEED_LIMIT),
            pll_kp: DEFAULT_PLL_KP,
            pll_ki: DEFAULT_PLL_KI,
            position: PositionLimits {
                max_rpm: position::DEFAULT_MAX_RPM,
                max_accel: position::DEFAULT_MAX_ACCEL,
                max_jerk_per_tick: position::DEFAULT_MAX_JERK_PER_TICK,
                landing_gain: position::DEFAULT_LANDING_GAIN,
                dead_band: position::DEFAULT_DEAD_BAND,
            },
            speed_loop_divider: DEFAULT_SPEED_LOOP_DIVIDER,
            position_loop_divider: DEFAULT_POSITION_LOOP_DIVIDER,
            calibration_samples: DEFAULT_CALIBRATION_SAMPLES,
            current_sense: CurrentSense {
                adc_vref: current_sense::DEFAULT_ADC_VREF,
                adc_full_scale: current_sense::DEFAULT_ADC_FULL_SCALE,
                amplifier_gain: current_sense::DEFAULT_AMPLIFIER_GAIN,
                shunt_ohms: current_sense::DEFAULT_SHUNT_OHMS,
            },
            openloop: OpenLoopConfig {
                frequency_hz: openloop::DEFAULT_FREQUENCY_HZ,
                ramp_hz_per_s: openloop::DEFAULT_RAMP_HZ_PER_S,
                voltage: openloop::DEFAULT_VOLTAGE,
            },
            bus: BusVoltageConfig::default(),
        }
    }

    /// Check the values that would make the control loops misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pole_pairs == 0 {
            return Err(ConfigError::ZeroPolePairs);
        }
        if !is_positive(self.control_period) {
            return Err(ConfigError::InvalidControlPeriod);
        }
        if self.pwm_period == 0 {
            return Err(ConfigError::ZeroPwmPeriod);
        }
        if !is_positive(self.bus_voltage) {
            return Err(ConfigError::InvalidBusVoltage);
        }
        if self.speed_loop_divider == 0 || self.position_loop_divider == 0 {
            return Err(ConfigError::ZeroLoopDivider);
        }
        if self.calibration_samples == 0 {
            return Err(ConfigError::ZeroCalibrationSamples);
        }
        if self.current_pi.out_min > self.current_pi.out_max
            || self.speed_pi.out_min > self.speed_pi.out_max
        {
            return Err(ConfigError::InvertedLimits);
        }

        let p = &self.position;
        if !is_positive(p.max_rpm)
            || !is_positive(p.max_accel)
            || !is_positive(p.max_jerk_per_tick)
            || !is_positive(p.landing_gain)
            || !p.dead_band.is_finite()
            || p.dead_band < 0.0
        {
            return Err(ConfigError::InvalidPositionLimits);
        }

        let cs = &self.current_sense;
        if cs.adc_full_scale == 0 || !is_positive(cs.amplifier_gain) || !is_positive(cs.shunt_ohms)
        {
            return Err(ConfigError::InvalidCurrentSense);
        }

        Ok(())
    }

    /// Period of the speed loop [s]
    pub fn speed_loop_dt(&self) -> f32 {
        self.control_period * self.speed_loop_divider as f32
    }

    /// Period of the position loop [s]
    pub fn position_loop_dt(&self) -> f32 {
        self.control_period * self.position_loop_divider as f32
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(DriveConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_loop_periods() {
        let config = DriveConfig::default();
        assert!((config.speed_loop_dt() - 0.001).abs() < 1e-7);
        assert!((config.position_loop_dt() - 0.001).abs() < 1e-7);
    }

    #[test]
    fn test_current_scale() {
        let scale = DriveConfig::default().current_sense.amps_per_count();
        // 3.3 / (20 * 0.005 * 4096)
        assert!((scale - 0.008_056_64).abs() < 1e-7);
    }

    #[test]
    fn test_rejects_zero_divider() {
        let mut config = DriveConfig::default();
        config.speed_loop_divider = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroLoopDivider));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = DriveConfig::default();
        config.pole_pairs = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroPolePairs));

        let mut config = DriveConfig::default();
        config.bus_voltage = -1.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidBusVoltage));

        let mut config = DriveConfig::default();
        config.control_period = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidControlPeriod));

        let mut config = DriveConfig::default();
        config.speed_pi.out_min = 5.0;
        assert_eq!(config.validate(), Err(ConfigError::InvertedLimits));

        let mut config = DriveConfig::default();
        config.position.max_accel = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPositionLimits));
    }
}
