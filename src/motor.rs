//! Motor control context and state machine
//!
//! [`MotorContext`] owns every controller of one drive and runs the FOC
//! pipeline once per control period through [`MotorContext::tick`]:
//!
//! 1. Current offset calibration until enough samples are averaged
//! 2. Phase currents from the ADC, Iw reconstructed as -Iu - Iv
//! 3. Previous encoder result consumed, next read started
//! 4. Clarke and Park transforms with the electrical angle
//! 5. PLL speed estimate from the mechanical angle
//! 6. Speed loop, rate divided
//! 7. Position tracker and loop, rate divided
//! 8. d/q current loops
//! 9. Inverse Park, 10. SVPWM, 11. PWM output
//!
//! Steps 8 to 11 only run while the drive is [`MotorState::Running`].

use crate::config::{ConfigError, DriveConfig};
use crate::foc::{
    clarke, inverse_park, park, AlphaBeta, AngleProcessor, ControlMode, CurrentOffsetCalibration,
    DirectQuadrature, EncoderAngles, MotorState, OpenLoopDrive, PiController, Pll,
    PositionController, SpaceVectorModulator,
};
use crate::hardware::MotorHardware;
use crate::telemetry::{Channel, TelemetryFrame};

/// Result of one control tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Current offsets are still being averaged
    Calibrating,
    /// Compare values were written to the power stage
    Applied,
    /// Sensing ran but the power stage was left alone
    Halted,
}

/// Request from a lower priority context, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorCommand {
    Start,
    Stop,
    EmergencyStop,
    ClearFault,
    SetMode(ControlMode),
    /// d and q axis current references [A]
    SetTargetCurrent { id: f32, iq: f32 },
    /// Speed reference [RPM]
    SetTargetSpeed(f32),
    /// Multi-turn position reference [rad]
    SetTargetPosition(f32),
    /// Measured DC bus voltage [V]
    SetBusVoltage(f32),
}

/// Phase currents [A]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseCurrents {
    pub u: f32,
    pub v: f32,
    pub w: f32,
}

/// Runs a slower loop once every `divider` ticks
#[derive(Debug, Clone, Copy, PartialEq)]
struct RateDivider {
    divider: u16,
    count: u16,
}

impl RateDivider {
    const fn new(divider: u16) -> Self {
        Self { divider, count: 0 }
    }

    fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.divider {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

/// Complete state of one motor drive
pub struct MotorContext {
    config: DriveConfig,
    state: MotorState,
    mode: ControlMode,
    /// Start requested while the offsets were still being averaged
    start_pending: bool,

    calibration: CurrentOffsetCalibration,
    angle: AngleProcessor,
    pll: Pll,
    position: PositionController,
    openloop: OpenLoopDrive,
    svpwm: SpaceVectorModulator,

    pi_id: PiController,
    pi_iq: PiController,
    pi_speed: PiController,
    speed_divider: RateDivider,
    position_divider: RateDivider,

    amps_per_count: f32,
    bus_voltage: f32,

    // Targets
    target_id: f32,
    target_iq: f32,
    target_rpm: f32,

    // Measurements and intermediate values of the last tick
    currents: PhaseCurrents,
    /// w-phase current from its own ADC channel, diagnostic only
    sampled_iw: f32,
    angles: EncoderAngles,
    i_ab: AlphaBeta,
    i_dq: DirectQuadrature,
    v_dq: DirectQuadrature,
    actual_rpm: f32,
}

impl MotorContext {
    /// Create a context in [`MotorState::Idle`]
    ///
    /// The first tick starts the current offset calibration.
    pub fn new(config: DriveConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let current = config.current_pi;
        let speed = config.speed_pi;

        Ok(Self {
            config,
            state: MotorState::Idle,
            mode: ControlMode::Idle,
            start_pending: false,

            calibration: CurrentOffsetCalibration::new(config.calibration_samples),
            angle: AngleProcessor::new(
                config.encoder_direction,
                config.pole_pairs,
                config.zero_offset,
            ),
            pll: Pll::new(config.pll_kp, config.pll_ki),
            position: PositionController::new(config.position, config.position_loop_dt()),
            openloop: OpenLoopDrive::new(config.openloop),
            svpwm: SpaceVectorModulator::new(config.pwm_period),

            pi_id: PiController::new(current.kp, current.ki, current.out_min, current.out_max),
            pi_iq: PiController::new(current.kp, current.ki, current.out_min, current.out_max),
            pi_speed: PiController::new(speed.kp, speed.ki, speed.out_min, speed.out_max),
            speed_divider: RateDivider::new(config.speed_loop_divider),
            position_divider: RateDivider::new(config.position_loop_divider),

            amps_per_count: config.current_sense.amps_per_count(),
            bus_voltage: config.bus_voltage,

            target_id: 0.0,
            target_iq: 0.0,
            target_rpm: 0.0,

            currents: PhaseCurrents::default(),
            sampled_iw: 0.0,
            angles: EncoderAngles::default(),
            i_ab: AlphaBeta::default(),
            i_dq: DirectQuadrature::default(),
            v_dq: DirectQuadrature::default(),
            actual_rpm: 0.0,
        })
    }

    /// Run one control period
    pub fn tick(&mut self, hw: &mut impl MotorHardware) -> TickOutcome {
        let adc = hw.current_adc();

        // 1. Offset calibration
        if !self.calibration.is_completed() {
            if self.state == MotorState::Idle {
                info!("Calibrating current offsets");
                self.state = MotorState::Calibrating;
            }
            if self.calibration.update(adc) {
                // The first calibrated tick consumes this read
                hw.start_encoder_read();
                if self.state == MotorState::Calibrating {
                    self.finish_calibration(hw);
                }
            }
            return TickOutcome::Calibrating;
        }

        // 2. Phase currents
        let offsets = self.calibration.offsets();
        let iu = (adc.u as f32 - offsets.u) * self.amps_per_count;
        let iv = (adc.v as f32 - offsets.v) * self.amps_per_count;
        self.currents = PhaseCurrents {
            u: iu,
            v: iv,
            w: -iu - iv,
        };
        self.sampled_iw = (adc.w as f32 - offsets.w) * self.amps_per_count;

        // 3. Encoder: consume the previous read, then start the next one
        let result = hw.encoder_result();
        hw.start_encoder_read();
        self.angles = self.angle.process_result(result);

        // 4. Clarke / Park
        self.i_ab = clarke(iu, iv);
        self.i_dq = park(self.i_ab, self.angles.electrical);

        // 5. Speed estimate
        self.pll.update(self.angles.mechanical, self.config.control_period);
        self.actual_rpm = self.pll.speed_rpm();

        let running = self.state == MotorState::Running;

        // 6. Speed loop
        if self.speed_divider.tick()
            && running
            && matches!(self.mode, ControlMode::Speed | ControlMode::Position)
        {
            self.target_iq = self.pi_speed.update(self.target_rpm, self.actual_rpm);
        }

        // 7. Position loop
        if self.position_divider.tick() {
            self.position.update_sensor(self.angles.mechanical);
            if running && self.mode == ControlMode::Position {
                self.target_rpm = self.position.compute();
            }
        }

        if !running {
            self.v_dq = DirectQuadrature::default();
            return TickOutcome::Halted;
        }

        // 8. Current loops
        let mut theta = self.angles.electrical;
        self.v_dq = match self.mode {
            ControlMode::Idle => DirectQuadrature::default(),
            ControlMode::Current | ControlMode::Speed | ControlMode::Position => {
                DirectQuadrature {
                    d: self.pi_id.update(self.target_id, self.i_dq.d),
                    q: self.pi_iq.update(self.target_iq, self.i_dq.q),
                }
            }
            ControlMode::OpenLoop => {
                let (angle, vq) = self.openloop.update(self.config.control_period);
                theta = angle;
                DirectQuadrature { d: 0.0, q: vq }
            }
        };

        // 9. Inverse Park
        let v_ab = inverse_park(self.v_dq, theta);

        // 10. SVPWM
        let [u, v, w] = self.svpwm.modulate(v_ab, self.bus_voltage);

        // 11. Output
        hw.set_pwm(u, v, w);

        TickOutcome::Applied
    }

    fn finish_calibration(&mut self, hw: &mut impl MotorHardware) {
        if self.start_pending {
            self.start_pending = false;
            self.state = MotorState::Running;
            hw.enable_driver();
            info!("Calibration done, motor running");
        } else {
            self.state = MotorState::Idle;
            info!("Calibration done");
        }
    }

    /// Enable the power stage and apply the control outputs
    ///
    /// While the offsets are still being averaged the request is held and
    /// takes effect when calibration completes. Ignored in
    /// [`MotorState::Error`] until [`clear_fault`](Self::clear_fault).
    pub fn start(&mut self, hw: &mut impl MotorHardware) {
        match self.state {
            MotorState::Error => {
                warn!("Start ignored, clear the fault first");
            }
            MotorState::Running => {}
            MotorState::Calibrating => {
                self.start_pending = true;
            }
            MotorState::Idle => {
                if self.calibration.is_completed() {
                    self.state = MotorState::Running;
                    hw.enable_driver();
                    info!("Motor started in {:?} mode", self.mode);
                } else {
                    self.state = MotorState::Calibrating;
                    self.start_pending = true;
                }
            }
        }
    }

    /// Return to idle and hold the brake pattern
    pub fn stop(&mut self, hw: &mut impl MotorHardware) {
        if self.state != MotorState::Idle {
            info!("Motor stopped");
        }
        self.state = MotorState::Idle;
        self.mode = ControlMode::Idle;
        self.start_pending = false;
        self.reset_controllers();
        self.pll.reset();
        hw.set_pwm_brake();
    }

    /// Disable the gate driver and latch [`MotorState::Error`]
    pub fn emergency_stop(&mut self, hw: &mut impl MotorHardware) {
        error!("Emergency stop");
        self.state = MotorState::Error;
        self.mode = ControlMode::Idle;
        self.start_pending = false;
        hw.disable_driver();
        hw.set_pwm_brake();
        self.reset_controllers();
        self.pll.reset();
    }

    /// Leave [`MotorState::Error`] for [`MotorState::Idle`]
    pub fn clear_fault(&mut self) {
        if self.state == MotorState::Error {
            info!("Fault cleared");
            self.state = MotorState::Idle;
        }
    }

    /// Switch the control mode
    ///
    /// While running, the current, speed and position loops restart from
    /// zero so the new mode starts without stale integrator state.
    pub fn set_mode(&mut self, mode: ControlMode) {
        if self.state == MotorState::Running {
            self.reset_controllers();
        }
        if mode == ControlMode::OpenLoop && self.mode != ControlMode::OpenLoop {
            self.openloop.reset();
        }
        if mode != self.mode {
            debug!("Control mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    fn reset_controllers(&mut self) {
        self.pi_id.reset();
        self.pi_iq.reset();
        self.pi_speed.reset();
        self.position.reset();
    }

    /// d and q axis current references [A]
    pub fn set_target_current(&mut self, id: f32, iq: f32) {
        self.target_id = id;
        self.target_iq = iq;
    }

    /// Speed reference [RPM]
    pub fn set_target_speed(&mut self, rpm: f32) {
        self.target_rpm = rpm;
    }

    /// Multi-turn position reference [rad]
    pub fn set_target_position(&mut self, position: f32) {
        self.position.set_target(position);
    }

    /// DC bus voltage used to scale the modulation [V]
    pub fn set_bus_voltage(&mut self, voltage: f32) {
        self.bus_voltage = voltage;
    }

    /// Apply a queued command
    pub fn apply(&mut self, command: MotorCommand, hw: &mut impl MotorHardware) {
        match command {
            MotorCommand::Start => self.start(hw),
            MotorCommand::Stop => self.stop(hw),
            MotorCommand::EmergencyStop => self.emergency_stop(hw),
            MotorCommand::ClearFault => self.clear_fault(),
            MotorCommand::SetMode(mode) => self.set_mode(mode),
            MotorCommand::SetTargetCurrent { id, iq } => self.set_target_current(id, iq),
            MotorCommand::SetTargetSpeed(rpm) => self.set_target_speed(rpm),
            MotorCommand::SetTargetPosition(position) => self.set_target_position(position),
            MotorCommand::SetBusVoltage(voltage) => self.set_bus_voltage(voltage),
        }
    }

    /// Snapshot of the telemetry channels
    pub fn telemetry_frame(&self) -> TelemetryFrame {
        let mut frame = TelemetryFrame::new();
        let v_ab = self.svpwm.input();
        let ccr = self.svpwm.ccr();

        frame.set(Channel::Vd, self.v_dq.d);
        frame.set(Channel::Vq, self.v_dq.q);
        frame.set(Channel::MechTheta, self.angles.mechanical);
        frame.set(Channel::SvpwmAlpha, v_ab.alpha);
        frame.set(Channel::SvpwmBeta, v_ab.beta);
        frame.set(Channel::Ccr1, ccr[0]);
        frame.set(Channel::Ccr2, ccr[1]);
        frame.set(Channel::Ccr3, ccr[2]);
        frame.set(Channel::Sector, self.svpwm.sector() as f32);
        frame.set(Channel::Iu, self.currents.u);
        frame.set(Channel::Iv, self.currents.v);
        frame.set(Channel::Iw, self.currents.w);
        frame.set(Channel::IAlpha, self.i_ab.alpha);
        frame.set(Channel::IBeta, self.i_ab.beta);
        frame.set(Channel::Id, self.i_dq.d);
        frame.set(Channel::Iq, self.i_dq.q);
        frame.set(Channel::IdRef, self.target_id);
        frame.set(Channel::IqRef, self.target_iq);
        frame.set(Channel::PosTarget, self.position.target());
        frame.set(Channel::PosActual, self.position.position());
        frame.set(Channel::Debug, self.sampled_iw);
        frame.set(Channel::SpeedActual, self.actual_rpm);
        frame.set(Channel::SpeedTarget, self.target_rpm);
        frame
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_completed()
    }

    /// PLL speed estimate [RPM]
    pub fn actual_rpm(&self) -> f32 {
        self.actual_rpm
    }

    pub fn target_rpm(&self) -> f32 {
        self.target_rpm
    }

    pub fn target_iq(&self) -> f32 {
        self.target_iq
    }

    /// Accumulated multi-turn position [rad]
    pub fn position(&self) -> f32 {
        self.position.position()
    }

    pub fn currents(&self) -> PhaseCurrents {
        self.currents
    }

    pub fn dq_currents(&self) -> DirectQuadrature {
        self.i_dq
    }

    pub fn voltages(&self) -> DirectQuadrature {
        self.v_dq
    }

    pub fn angles(&self) -> EncoderAngles {
        self.angles
    }

    pub fn bus_voltage(&self) -> f32 {
        self.bus_voltage
    }

    /// Compare values of the last modulation
    pub fn compare_values(&self) -> [u16; 3] {
        self.svpwm.compare_values()
    }

    pub fn encoder_fault_count(&self) -> u32 {
        self.angle.fault_count()
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }
}
