// FOC (Field Oriented Control) module
// Encoder-based FOC building blocks: angle, transforms, loops and modulation

pub mod angle;
pub mod calibration;
pub mod openloop;
pub mod pi_controller;
pub mod pll;
pub mod position;
pub mod svpwm;
pub mod transforms;

// Re-export main types for easier access
pub use angle::{normalize_angle, AngleProcessor, Direction, EncoderAngles};
pub use calibration::{CurrentOffsetCalibration, CurrentOffsets};
pub use openloop::{OpenLoopConfig, OpenLoopDrive};
pub use pi_controller::PiController;
pub use pll::Pll;
pub use position::{PositionController, PositionLimits};
pub use svpwm::SpaceVectorModulator;
pub use transforms::{clarke, inverse_clarke, inverse_park, park, AlphaBeta, DirectQuadrature};

/// Drive state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorState {
    /// Power stage held in brake, nothing is regulated
    Idle,
    /// Averaging the current sensor offsets
    Calibrating,
    /// Control outputs are applied to the power stage
    Running,
    /// Emergency stop, driver disabled until the fault is cleared
    Error,
}

/// Control mode inside [`MotorState::Running`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMode {
    /// Zero voltage vector, no loop evaluated
    Idle,
    /// d/q current loops only
    Current,
    /// Speed loop driving the q-axis current reference
    Speed,
    /// Position loop driving the speed reference
    Position,
    /// V/f rotating voltage without feedback
    OpenLoop,
}
