//! DC bus voltage monitoring
//!
//! Converts the divider ADC reading into the bus voltage, low-pass filters it
//! and flags over- and under-voltage. The filtered voltage feeds the SVPWM
//! scaling; a fault is turned into an emergency stop by the caller.

use crate::config::bus::*;
use crate::config::current_sense::{DEFAULT_ADC_FULL_SCALE, DEFAULT_ADC_VREF};

/// Divider, filter and threshold settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusVoltageConfig {
    /// Upper divider resistor [Ω]
    pub r_upper: f32,
    /// Lower divider resistor [Ω]
    pub r_lower: f32,
    /// ADC full scale (4096 for 12 bit)
    pub adc_full_scale: u16,
    /// ADC reference voltage [V]
    pub vref: f32,
    /// Low-pass coefficient, 0.0-1.0, larger responds faster
    pub filter_alpha: f32,
    /// Over-voltage threshold [V]
    pub overvoltage_threshold: f32,
    /// Under-voltage threshold [V]
    pub undervoltage_threshold: f32,
}

impl BusVoltageConfig {
    pub const fn default() -> Self {
        Self {
            r_upper: DEFAULT_R_UPPER,
            r_lower: DEFAULT_R_LOWER,
            adc_full_scale: DEFAULT_ADC_FULL_SCALE,
            vref: DEFAULT_ADC_VREF,
            filter_alpha: DEFAULT_FILTER_ALPHA,
            overvoltage_threshold: DEFAULT_OVERVOLTAGE,
            undervoltage_threshold: DEFAULT_UNDERVOLTAGE,
        }
    }
}

/// Filtered bus voltage and fault flags
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusVoltageState {
    /// Filtered voltage [V]
    pub voltage: f32,
    pub overvoltage: bool,
    pub undervoltage: bool,
}

impl BusVoltageState {
    pub const fn new() -> Self {
        Self {
            voltage: 0.0,
            overvoltage: false,
            undervoltage: false,
        }
    }

    /// Voltage within both thresholds
    pub fn is_voltage_ok(&self) -> bool {
        !self.overvoltage && !self.undervoltage
    }
}

/// Bus voltage monitor
pub struct BusVoltageMonitor {
    config: BusVoltageConfig,
    state: BusVoltageState,
}

impl BusVoltageMonitor {
    pub const fn new(config: BusVoltageConfig) -> Self {
        Self {
            config,
            state: BusVoltageState::new(),
        }
    }

    /// Bus voltage for a raw ADC code, unfiltered [V]
    pub fn adc_to_voltage(&self, adc_raw: u16) -> f32 {
        let v_adc = (adc_raw as f32 / self.config.adc_full_scale as f32) * self.config.vref;

        // V_bus = V_adc * (R_upper + R_lower) / R_lower
        let divider_ratio = (self.config.r_upper + self.config.r_lower) / self.config.r_lower;
        v_adc * divider_ratio
    }

    /// Filter one ADC sample and re-evaluate the thresholds
    pub fn update(&mut self, adc_raw: u16) -> BusVoltageState {
        let voltage_raw = self.adc_to_voltage(adc_raw);
        let alpha = self.config.filter_alpha;

        self.state.voltage = alpha * voltage_raw + (1.0 - alpha) * self.state.voltage;
        self.check_thresholds();

        self.state
    }

    /// Seed the filter with a first sample so start-up does not read as
    /// under-voltage
    pub fn initialize_with_adc(&mut self, adc_raw: u16) -> BusVoltageState {
        self.state.voltage = self.adc_to_voltage(adc_raw);
        self.check_thresholds();
        self.state
    }

    fn check_thresholds(&mut self) {
        let was_ok = self.state.is_voltage_ok();

        self.state.overvoltage = self.state.voltage > self.config.overvoltage_threshold;
        self.state.undervoltage = self.state.voltage < self.config.undervoltage_threshold;

        if was_ok && self.state.overvoltage {
            error!(
                "OVERVOLTAGE detected! Bus voltage: {}V (threshold: {}V)",
                self.state.voltage, self.config.overvoltage_threshold
            );
        }
        if was_ok && self.state.undervoltage {
            error!(
                "UNDERVOLTAGE detected! Bus voltage: {}V (threshold: {}V)",
                self.state.voltage, self.config.undervoltage_threshold
            );
        }
    }

    pub fn state(&self) -> BusVoltageState {
        self.state
    }

    pub fn voltage(&self) -> f32 {
        self.state.voltage
    }

    pub fn set_thresholds(&mut self, overvoltage: f32, undervoltage: f32) {
        self.config.overvoltage_threshold = overvoltage;
        self.config.undervoltage_threshold = undervoltage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ADC code for a bus voltage with the default divider
    fn code_for(voltage: f32) -> u16 {
        let ratio = (DEFAULT_R_UPPER + DEFAULT_R_LOWER) / DEFAULT_R_LOWER;
        (voltage / ratio / 3.3 * 4096.0) as u16
    }

    #[test]
    fn test_conversion() {
        let monitor = BusVoltageMonitor::new(BusVoltageConfig::default());
        let v = monitor.adc_to_voltage(code_for(12.0));
        assert!((v - 12.0).abs() < 0.02);
    }

    #[test]
    fn test_initialize_avoids_false_undervoltage() {
        let mut monitor = BusVoltageMonitor::new(BusVoltageConfig::default());
        let state = monitor.initialize_with_adc(code_for(12.0));
        assert!(state.is_voltage_ok());
        let state = monitor.update(code_for(12.0));
        assert!(state.is_voltage_ok());
    }

    #[test]
    fn test_filter_converges_and_flags_overvoltage() {
        let mut monitor = BusVoltageMonitor::new(BusVoltageConfig::default());
        monitor.initialize_with_adc(code_for(12.0));

        // A single spike is filtered out
        let state = monitor.update(code_for(35.0));
        assert!(!state.overvoltage);

        let mut state = monitor.state();
        for _ in 0..100 {
            state = monitor.update(code_for(35.0));
        }
        assert!(state.overvoltage);
        assert!(!state.is_voltage_ok());
    }

    #[test]
    fn test_undervoltage() {
        let mut monitor = BusVoltageMonitor::new(BusVoltageConfig::default());
        let state = monitor.initialize_with_adc(code_for(5.0));
        assert!(state.undervoltage);
    }
}
