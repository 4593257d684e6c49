//! Default control parameters for the 7-pole-pair test motor on a 12 V bus

/// Pole pairs of the motor
pub const DEFAULT_POLE_PAIRS: u8 = 7;

/// Mechanical angle at which the electrical angle is zero [rad]
pub const DEFAULT_ZERO_OFFSET: f32 = 0.386563;

/// Control period [s] (20 kHz)
pub const DEFAULT_CONTROL_PERIOD: f32 = 0.000_05;

/// Control period [µs]
pub const DEFAULT_CONTROL_PERIOD_US: u64 = 50;

/// PWM timer period in counts (20 kHz at 168 MHz, center aligned)
pub const DEFAULT_PWM_PERIOD: u16 = 4200;

/// DC bus voltage used until a measurement arrives [V]
pub const DEFAULT_BUS_VOLTAGE: f32 = 12.0;

/// Current loop gains and voltage limit [V]
pub const DEFAULT_CURRENT_KP: f32 = 0.07037;
pub const DEFAULT_CURRENT_KI: f32 = 0.01423;
pub const DEFAULT_CURRENT_LIMIT: f32 = 12.0;

/// Speed loop gains and q-axis current limit [A]
pub const DEFAULT_SPEED_KP: f32 = 0.006;
pub const DEFAULT_SPEED_KI: f32 = 0.000_01;
pub const DEFAULT_SPEED_LIMIT: f32 = 3.0;

/// Velocity PLL gains
pub const DEFAULT_PLL_KP: f32 = 200.0;
pub const DEFAULT_PLL_KI: f32 = 40_000.0;

/// The speed and position loops run once every N control ticks (1 kHz)
pub const DEFAULT_SPEED_LOOP_DIVIDER: u16 = 20;
pub const DEFAULT_POSITION_LOOP_DIVIDER: u16 = 20;

/// ADC samples averaged for the current offset
pub const DEFAULT_CALIBRATION_SAMPLES: u16 = 1000;

/// AS5047P counts per revolution (14 bit)
pub const ENCODER_CPR: u16 = 16384;
pub const ENCODER_MASK: u16 = 0x3FFF;

pub const RAD_S_TO_RPM: f32 = 9.549_296_6;
pub const RPM_TO_RAD_S: f32 = 0.104_719_76;

/// Position trajectory limits
pub mod position {
    /// Cruise speed [RPM]
    pub const DEFAULT_MAX_RPM: f32 = 2000.0;

    /// Braking deceleration [rad/s²]
    pub const DEFAULT_MAX_ACCEL: f32 = 500.0;

    /// Largest change of the speed command per position loop tick [RPM]
    pub const DEFAULT_MAX_JERK_PER_TICK: f32 = 50.0;

    /// Proportional speed near the target [1/s]
    pub const DEFAULT_LANDING_GAIN: f32 = 5.0;

    /// Position errors below this are treated as zero [rad]
    pub const DEFAULT_DEAD_BAND: f32 = 0.002;
}

/// Shunt current sensing (AD8418A, 5 mΩ)
pub mod current_sense {
    pub const DEFAULT_ADC_VREF: f32 = 3.3;
    pub const DEFAULT_ADC_FULL_SCALE: u16 = 4096;
    pub const DEFAULT_AMPLIFIER_GAIN: f32 = 20.0;
    pub const DEFAULT_SHUNT_OHMS: f32 = 0.005;
}

/// V/f open loop used for bench checks
pub mod openloop {
    /// Electrical frequency once ramped up [Hz]
    pub const DEFAULT_FREQUENCY_HZ: f32 = 10.0;

    /// Electrical frequency ramp [Hz/s]
    pub const DEFAULT_RAMP_HZ_PER_S: f32 = 20.0;

    /// q-axis voltage [V]
    pub const DEFAULT_VOLTAGE: f32 = 1.0;
}

/// DC bus measurement (33.3 kΩ / 3.3 kΩ divider)
pub mod bus {
    pub const DEFAULT_R_UPPER: f32 = 33_300.0;
    pub const DEFAULT_R_LOWER: f32 = 3_300.0;
    pub const DEFAULT_FILTER_ALPHA: f32 = 0.1;
    pub const DEFAULT_OVERVOLTAGE: f32 = 30.0;
    pub const DEFAULT_UNDERVOLTAGE: f32 = 10.0;
}
