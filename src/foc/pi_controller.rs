// PI (Proportional-Integral) controller with anti-windup

/// PI controller with clamped integral and output
///
/// The integral term is accumulated as `ki * error` per evaluation and clamped
/// before the output is formed, so the controller leaves saturation as soon
/// as the error changes sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiController {
    /// Proportional gain
    kp: f32,
    /// Integral gain, per evaluation
    ki: f32,
    /// Reference of the last evaluation
    reference: f32,
    /// Feedback of the last evaluation
    feedback: f32,
    /// Error of the last evaluation
    last_error: f32,
    /// Integral accumulator
    integral: f32,
    /// Integral clamp
    integral_min: f32,
    integral_max: f32,
    /// Output clamp
    output_min: f32,
    output_max: f32,
    /// Last calculated output
    last_output: f32,
}

impl PiController {
    /// Create a new PI controller
    ///
    /// The integral clamp starts equal to the output clamp.
    ///
    /// # Arguments
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain
    /// * `output_min` - Minimum output limit
    /// * `output_max` - Maximum output limit
    pub const fn new(kp: f32, ki: f32, output_min: f32, output_max: f32) -> Self {
        Self {
            kp,
            ki,
            reference: 0.0,
            feedback: 0.0,
            last_error: 0.0,
            integral: 0.0,
            integral_min: output_min,
            integral_max: output_max,
            output_min,
            output_max,
            last_output: 0.0,
        }
    }

    /// Create a symmetric PI controller (output range: -limit to +limit)
    pub const fn new_symmetric(kp: f32, ki: f32, output_limit: f32) -> Self {
        Self::new(kp, ki, -output_limit, output_limit)
    }

    /// Replace the integral clamp that defaults to the output clamp
    pub const fn with_integral_limits(mut self, integral_min: f32, integral_max: f32) -> Self {
        self.integral_min = integral_min;
        self.integral_max = integral_max;
        self
    }

    /// Evaluate the controller once
    ///
    /// # Arguments
    /// * `reference` - Desired value
    /// * `feedback` - Actual measured value
    ///
    /// # Returns
    /// Controller output (limited to output_min..output_max)
    pub fn update(&mut self, reference: f32, feedback: f32) -> f32 {
        let error = reference - feedback;

        // Anti-windup: clamp the accumulator before it reaches the output
        self.integral = (self.integral + self.ki * error).clamp(self.integral_min, self.integral_max);

        let output = self.kp * error + self.integral;
        self.last_output = output.clamp(self.output_min, self.output_max);

        self.reference = reference;
        self.feedback = feedback;
        self.last_error = error;
        self.last_output
    }

    /// Zero the integral, error memory and output
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.last_output = 0.0;
    }

    /// Set the proportional and integral gains
    pub fn set_gains(&mut self, kp: f32, ki: f32) {
        self.kp = kp;
        self.ki = ki;
    }

    /// Set the output clamp and the integral clamp together
    pub fn set_limits(&mut self, output_min: f32, output_max: f32) {
        self.output_min = output_min;
        self.output_max = output_max;
        self.set_integral_limits(output_min, output_max);
    }

    /// Set the integral clamp only
    pub fn set_integral_limits(&mut self, integral_min: f32, integral_max: f32) {
        self.integral_min = integral_min;
        self.integral_max = integral_max;
        self.integral = self.integral.clamp(integral_min, integral_max);
    }

    /// Get the current output
    pub fn get_output(&self) -> f32 {
        self.last_output
    }

    /// Get the current integral term
    pub fn get_integral(&self) -> f32 {
        self.integral
    }

    /// Get the reference of the last evaluation
    pub fn get_reference(&self) -> f32 {
        self.reference
    }

    /// Get the error of the last evaluation
    pub fn get_error(&self) -> f32 {
        self.last_error
    }

    /// Get the proportional gain
    pub fn get_kp(&self) -> f32 {
        self.kp
    }

    /// Get the integral gain
    pub fn get_ki(&self) -> f32 {
        self.ki
    }

    /// Check if output is currently saturated
    pub fn is_saturated(&self) -> bool {
        self.last_output <= self.output_min || self.last_output >= self.output_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn test_proportional_only() {
        let mut pi = PiController::new(1.0, 0.0, -10.0, 10.0);
        let output = pi.update(5.0, 0.0);
        assert_eq!(output, 5.0); // P term only
    }

    #[test]
    fn test_output_limiting() {
        let mut pi = PiController::new(1.0, 0.0, -10.0, 10.0);
        let output = pi.update(20.0, 0.0);
        assert_eq!(output, 10.0); // Limited to max
        assert!(pi.is_saturated());
    }

    #[test]
    fn test_integral_accumulation() {
        let mut pi = PiController::new(0.0, 0.5, -100.0, 100.0);
        pi.update(2.0, 0.0);
        assert_eq!(pi.get_integral(), 1.0);
        pi.update(2.0, 0.0);
        assert_eq!(pi.get_integral(), 2.0);
    }

    #[test]
    fn test_current_loop_step() {
        let mut pi = PiController::new(0.07037, 0.01423, -12.0, 12.0);
        let output = pi.update(1.0, 0.0);
        assert!((output - 0.0846).abs() < EPSILON);
        assert!(!pi.is_saturated());
    }

    #[test]
    fn test_anti_windup_bounds() {
        let mut pi = PiController::new(0.5, 0.2, -12.0, 12.0).with_integral_limits(-4.0, 4.0);
        for _ in 0..10_000 {
            let output = pi.update(1000.0, 0.0);
            assert!(output.abs() <= 12.0);
            assert!(pi.get_integral() <= 4.0 && pi.get_integral() >= -4.0);
        }

        // Leaves saturation on the first evaluation with reversed error
        let output = pi.update(0.0, 10.0);
        assert!((output - (0.5 * -10.0 + (4.0 - 2.0))).abs() < EPSILON);
    }

    #[test]
    fn test_integral_defaults_to_output_clamp() {
        let mut pi = PiController::new(0.0, 1.0, -3.0, 3.0);
        for _ in 0..100 {
            pi.update(-50.0, 0.0);
        }
        assert_eq!(pi.get_integral(), -3.0);
        assert_eq!(pi.get_output(), -3.0);
    }

    #[test]
    fn test_reset() {
        let mut pi = PiController::new(1.0, 1.0, -10.0, 10.0);
        pi.update(2.0, 0.0);
        pi.reset();
        assert_eq!(pi.get_integral(), 0.0);
        assert_eq!(pi.get_output(), 0.0);
        assert_eq!(pi.get_error(), 0.0);
    }
}
