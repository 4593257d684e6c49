// Phase-locked loop velocity estimator

use core::f32::consts::PI;

use super::angle::normalize_angle;
use crate::config::RAD_S_TO_RPM;

/// Wrap an angle difference to [-π, π)
pub fn wrap_to_pi(angle: f32) -> f32 {
    normalize_angle(angle + PI) - PI
}

/// Second-order PLL tracking a periodic angle
///
/// The integrator state is the angular velocity estimate, which is much
/// quieter than differencing successive encoder samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pll {
    kp: f32,
    ki: f32,
    /// Estimated angle [rad], [0, 2π)
    angle: f32,
    /// Estimated angular velocity [rad/s]
    speed: f32,
}

impl Pll {
    pub const fn new(kp: f32, ki: f32) -> Self {
        Self {
            kp,
            ki,
            angle: 0.0,
            speed: 0.0,
        }
    }

    /// Track one angle sample
    ///
    /// # Arguments
    /// * `theta` - Measured angle [rad]
    /// * `dt` - Time since the previous sample [s]
    ///
    /// # Returns
    /// Angular velocity estimate [rad/s]
    pub fn update(&mut self, theta: f32, dt: f32) -> f32 {
        let error = wrap_to_pi(theta - self.angle);

        self.speed += self.ki * error * dt;
        self.angle = normalize_angle(self.angle + (self.speed + self.kp * error) * dt);

        self.speed
    }

    /// Angular velocity [rad/s]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Angular velocity [RPM]
    pub fn speed_rpm(&self) -> f32 {
        self.speed * RAD_S_TO_RPM
    }

    /// Estimated angle [rad]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_gains(&mut self, kp: f32, ki: f32) {
        self.kp = kp;
        self.ki = ki;
    }

    pub fn reset(&mut self) {
        self.angle = 0.0;
        self.speed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::TAU;

    const DT: f32 = 0.000_05;

    #[test]
    fn test_wrap_to_pi() {
        let inputs = [0.0, 3.0, -3.0, 3.2, -3.2, 6.1, -6.1, 20.0];
        for &x in inputs.iter() {
            let w = wrap_to_pi(x);
            assert!((-PI..PI).contains(&w), "wrap({}) = {}", x, w);
            // same direction on the circle
            assert!((normalize_angle(w) - normalize_angle(x)).abs() < 1e-4);
        }
        assert!((wrap_to_pi(6.1) - (6.1 - TAU)).abs() < 1e-5);
    }

    #[test]
    fn test_tracks_constant_speed() {
        let mut pll = Pll::new(200.0, 40_000.0);
        let omega = 100.0; // rad/s
        let mut theta = 0.0f32;

        for _ in 0..10_000 {
            theta = normalize_angle(theta + omega * DT);
            pll.update(theta, DT);
        }

        assert!((pll.speed() - omega).abs() < 1.0, "speed {}", pll.speed());
        assert!((pll.speed_rpm() - omega * RAD_S_TO_RPM).abs() < 10.0);
    }

    #[test]
    fn test_tracks_reverse_through_wrap() {
        let mut pll = Pll::new(200.0, 40_000.0);
        let omega = -50.0;
        let mut theta = 0.2f32;

        for _ in 0..10_000 {
            theta = normalize_angle(theta + omega * DT);
            pll.update(theta, DT);
        }

        assert!((pll.speed() - omega).abs() < 1.0, "speed {}", pll.speed());
        assert!((0.0..TAU).contains(&pll.angle()));
    }

    #[test]
    fn test_reset() {
        let mut pll = Pll::new(200.0, 40_000.0);
        pll.update(1.0, DT);
        pll.reset();
        assert_eq!(pll.speed(), 0.0);
        assert_eq!(pll.angle(), 0.0);
    }
}
