//! Position control
//!
//! Tracks the multi-turn shaft position from the single-turn mechanical angle
//! and shapes a speed command with target feed-forward, an S-curve profile
//! (cruise, braking and landing speeds) and a jerk limit.

use core::f32::consts::TAU;

use libm::{fabsf, sqrtf};

use crate::config::{RAD_S_TO_RPM, RPM_TO_RAD_S};

/// Angle step that counts as a wrap across zero [rad]
///
/// Close to 2π, far above any per-sample motion at the loop rate.
const WRAP_THRESHOLD: f32 = 5.0;

/// Trajectory limits of the position loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionLimits {
    /// Cruise speed and output saturation [RPM]
    pub max_rpm: f32,
    /// Deceleration used for the braking curve [rad/s²]
    pub max_accel: f32,
    /// Largest output change per `compute` call [RPM]
    pub max_jerk_per_tick: f32,
    /// Speed per radian of error near the target [1/s]
    pub landing_gain: f32,
    /// Errors below this are treated as zero [rad]
    pub dead_band: f32,
}

/// Multi-turn position tracker and trajectory shaper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionController {
    limits: PositionLimits,
    /// Period between `compute` calls [s]
    loop_dt: f32,
    /// Target position [rad], unbounded
    target: f32,
    /// Accumulated position [rad]
    current: f32,
    /// Full turns counted across zero crossings
    turns: i32,
    /// Previous single-turn angle [rad]
    last_raw: f32,
    /// Whether `last_raw` holds a real sample
    seeded: bool,
    /// Target at the previous `compute`, for feed-forward
    last_target: f32,
    /// Previous jerk-limited output [RPM]
    last_output: f32,
}

impl PositionController {
    /// # Arguments
    /// * `limits` - Trajectory limits
    /// * `loop_dt` - Period of the position loop [s]
    pub const fn new(limits: PositionLimits, loop_dt: f32) -> Self {
        Self {
            limits,
            loop_dt,
            target: 0.0,
            current: 0.0,
            turns: 0,
            last_raw: 0.0,
            seeded: false,
            last_target: 0.0,
            last_output: 0.0,
        }
    }

    /// Feed one single-turn mechanical angle sample [rad]
    ///
    /// The first sample after construction or [`reset_tracking`] only
    /// establishes the starting angle.
    ///
    /// [`reset_tracking`]: Self::reset_tracking
    pub fn update_sensor(&mut self, raw: f32) {
        if self.seeded {
            let delta = raw - self.last_raw;
            if delta < -WRAP_THRESHOLD {
                self.turns += 1;
            } else if delta > WRAP_THRESHOLD {
                self.turns -= 1;
            }
        } else {
            self.seeded = true;
        }

        self.current = self.turns as f32 * TAU + raw;
        self.last_raw = raw;
    }

    /// Compute the speed command [RPM]
    pub fn compute(&mut self) -> f32 {
        let limits = &self.limits;

        // Feed-forward from the target motion since the last call
        let ff_rpm = (self.target - self.last_target) / self.loop_dt * RAD_S_TO_RPM;
        self.last_target = self.target;

        let error = self.target - self.current;
        let sign = if error > 0.0 { 1.0 } else { -1.0 };
        let mut magnitude = fabsf(error);
        if magnitude < limits.dead_band {
            magnitude = 0.0;
        }

        // Slowest of cruise, braking and landing speed
        let cruise = limits.max_rpm * RPM_TO_RAD_S;
        let braking = sqrtf(2.0 * limits.max_accel * magnitude);
        let landing = limits.landing_gain * magnitude;
        let profile_rpm = sign * cruise.min(braking).min(landing) * RAD_S_TO_RPM;

        let mut output = profile_rpm + ff_rpm;

        let step = output - self.last_output;
        output = self.last_output + step.clamp(-limits.max_jerk_per_tick, limits.max_jerk_per_tick);
        self.last_output = output;

        output.clamp(-limits.max_rpm, limits.max_rpm)
    }

    /// Set the target position [rad]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Accumulated position [rad]
    pub fn position(&self) -> f32 {
        self.current
    }

    pub fn turns(&self) -> i32 {
        self.turns
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    pub fn limits(&self) -> &PositionLimits {
        &self.limits
    }

    pub fn set_limits(&mut self, limits: PositionLimits) {
        self.limits = limits;
    }

    /// Clear the trajectory memory without losing the tracked position
    ///
    /// The current target becomes the feed-forward reference so the next
    /// `compute` starts without a feed-forward spike.
    pub fn reset(&mut self) {
        self.last_output = 0.0;
        self.last_target = self.target;
    }

    /// Forget the turn count; the next sample seeds the tracker again
    pub fn reset_tracking(&mut self) {
        self.turns = 0;
        self.current = 0.0;
        self.last_raw = 0.0;
        self.seeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn limits() -> PositionLimits {
        PositionLimits {
            max_rpm: 2000.0,
            max_accel: 500.0,
            max_jerk_per_tick: 50.0,
            landing_gain: 5.0,
            dead_band: 0.002,
        }
    }

    #[test]
    fn test_forward_wrap_counts_one_turn() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(5.9);
        let before = pos.position();
        pos.update_sensor(0.1);

        assert_eq!(pos.turns(), 1);
        // 5.9 → 2π + 0.1 is a forward step of about 0.483 rad
        let expected = TAU + 0.1;
        assert!((pos.position() - expected).abs() < 0.01);
        assert!((pos.position() - before - (TAU + 0.1 - 5.9)).abs() < 0.01);
    }

    #[test]
    fn test_backward_wrap() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(0.1);
        pos.update_sensor(6.0);
        assert_eq!(pos.turns(), -1);
        assert!((pos.position() - (6.0 - TAU)).abs() < EPSILON);
    }

    #[test]
    fn test_first_sample_seeds_tracker() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(6.0);
        assert_eq!(pos.turns(), 0);
        assert!((pos.position() - 6.0).abs() < EPSILON);
    }

    #[test]
    fn test_small_steps_do_not_count() {
        let mut pos = PositionController::new(limits(), 0.001);
        let mut raw = 0.0;
        for _ in 0..100 {
            raw += 0.05;
            pos.update_sensor(raw);
        }
        assert_eq!(pos.turns(), 0);
        assert!((pos.position() - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_jerk_limit() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(0.0);
        pos.compute();

        // One loop period of 500 RPM worth of target motion
        pos.set_target(500.0 * RPM_TO_RAD_S * 0.001);
        let first = pos.compute();
        assert!((first - 50.0).abs() < EPSILON);

        let mut previous = first;
        for _ in 0..100 {
            let output = pos.compute();
            assert!((output - previous).abs() <= 50.0 + EPSILON);
            assert!(output.abs() <= 2000.0);
            previous = output;
        }
    }

    #[test]
    fn test_jerk_limit_ramps_to_profile_speed() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(0.0);
        pos.reset();

        // Move the target without a feed-forward jump
        pos.set_target(100.0);
        pos.reset();

        let expected = [50.0, 100.0, 150.0, 200.0, 250.0];
        for &rpm in expected.iter() {
            assert!((pos.compute() - rpm).abs() < EPSILON);
        }
    }

    #[test]
    fn test_saturates_to_max_rpm() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(0.0);
        pos.set_target(1000.0);
        pos.reset();

        let mut output = 0.0;
        for _ in 0..100 {
            output = pos.compute();
        }
        assert!((output - 2000.0).abs() < 0.01);
    }

    #[test]
    fn test_dead_band() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(1.0);
        pos.set_target(1.001);
        pos.reset();
        assert_eq!(pos.compute(), 0.0);
    }

    #[test]
    fn test_landing_speed_near_target() {
        let mut pos = PositionController::new(limits(), 0.001);
        pos.update_sensor(0.0);
        pos.set_target(-0.1);
        pos.reset();

        // landing = 5 * 0.1 = 0.5 rad/s, below braking and cruise
        let expected = -0.5 * RAD_S_TO_RPM;
        let output = pos.compute();
        assert!((output - expected).abs() < 0.01);
    }
}
