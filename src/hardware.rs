//! Hardware backend interface
//!
//! The control core never touches peripherals. Everything it needs from the
//! power stage and the sensors goes through [`MotorHardware`], which the
//! firmware implements on top of the timer, ADC and SPI drivers.

/// Raw ADC codes of the three phase current channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseAdc {
    pub u: u16,
    pub v: u16,
    pub w: u16,
}

/// Invalid encoder reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderFault {
    /// The sensor flagged an error in its response frame
    ErrorFlag,
    /// The response frame failed its parity check
    Parity,
    /// No read has completed yet
    NotReady,
}

/// Capabilities the control core needs from the board
pub trait MotorHardware {
    /// Latest raw phase current samples
    fn current_adc(&mut self) -> PhaseAdc;

    /// Start an encoder acquisition without waiting for it
    fn start_encoder_read(&mut self);

    /// Result of the most recently completed acquisition
    fn encoder_result(&mut self) -> Result<u16, EncoderFault>;

    /// Write the compare values of phases U, V, W
    fn set_pwm(&mut self, u: u16, v: u16, w: u16);

    /// Hold all three phases at 50 % duty
    fn set_pwm_brake(&mut self);

    /// Enable the gate driver
    fn enable_driver(&mut self);

    /// Disable the gate driver
    fn disable_driver(&mut self);
}
