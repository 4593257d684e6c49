//! Field-oriented control core for a permanent-magnet motor drive.
//!
//! Converts an absolute-encoder angle and phase current samples into PWM
//! compare values once per control period. The hardware is reached only
//! through [`MotorHardware`], so everything here runs on the host as well.

#![cfg_attr(not(test), no_std)]

// Must come first: the logging macros are textually scoped.
mod fmt;

pub mod bus_voltage;
pub mod config;
pub mod foc;
pub mod hardware;
pub mod motor;
pub mod telemetry;

pub use config::{ConfigError, DriveConfig};
pub use foc::{ControlMode, MotorState};
pub use hardware::{EncoderFault, MotorHardware, PhaseAdc};
pub use motor::{MotorCommand, MotorContext, TickOutcome};
pub use telemetry::{Channel, TelemetryError, TelemetryFrame};
