//! Encoder angle processing
//!
//! Turns a raw 14-bit absolute encoder code into the mechanical angle and the
//! electrical angle used by the Park transforms.

use core::f32::consts::TAU;

use libm::fmodf;

use crate::config::{ENCODER_CPR, ENCODER_MASK};
use crate::hardware::EncoderFault;

const RAW_TO_RAD: f32 = TAU / ENCODER_CPR as f32;

/// Counting direction of the encoder relative to the motor phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub const fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// Normalize angle to range [0, 2π)
///
/// Works for any finite input, positive or negative.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = fmodf(angle, TAU);
    let normalized = if wrapped < 0.0 { wrapped + TAU } else { wrapped };
    // -ε + 2π rounds up to 2π in f32
    if normalized >= TAU {
        0.0
    } else {
        normalized
    }
}

/// Mechanical and electrical rotor angle, both in [0, 2π)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncoderAngles {
    pub mechanical: f32,
    pub electrical: f32,
}

/// Encoder code to rotor angle conversion
pub struct AngleProcessor {
    direction: Direction,
    pole_pairs: u8,
    zero_offset: f32,
    raw_code: u16,
    angles: EncoderAngles,
    fault_count: u32,
}

impl AngleProcessor {
    /// # Arguments
    /// * `direction` - Sign applied to the raw angle
    /// * `pole_pairs` - Pole pairs of the motor
    /// * `zero_offset` - Mechanical angle at electrical zero [rad]
    pub const fn new(direction: Direction, pole_pairs: u8, zero_offset: f32) -> Self {
        Self {
            direction,
            pole_pairs,
            zero_offset,
            raw_code: 0,
            angles: EncoderAngles {
                mechanical: 0.0,
                electrical: 0.0,
            },
            fault_count: 0,
        }
    }

    /// Convert a raw code; bits above the 14-bit range are ignored
    pub fn process(&mut self, raw_code: u16) -> EncoderAngles {
        let code = raw_code & ENCODER_MASK;
        let mechanical = normalize_angle(self.direction.sign() * code as f32 * RAW_TO_RAD);
        let electrical =
            normalize_angle((mechanical - self.zero_offset) * self.pole_pairs as f32);

        self.raw_code = code;
        self.angles = EncoderAngles {
            mechanical,
            electrical,
        };
        self.angles
    }

    /// Convert a read result, keeping the last valid angles on a fault
    pub fn process_result(&mut self, result: Result<u16, EncoderFault>) -> EncoderAngles {
        match result {
            Ok(code) => self.process(code),
            Err(fault) => {
                if self.fault_count == 0 {
                    warn!("Encoder fault {:?}, holding last angle", fault);
                }
                self.fault_count = self.fault_count.wrapping_add(1);
                self.angles
            }
        }
    }

    pub fn angles(&self) -> EncoderAngles {
        self.angles
    }

    pub fn raw_code(&self) -> u16 {
        self.raw_code
    }

    /// Number of faulted reads since start-up
    pub fn fault_count(&self) -> u32 {
        self.fault_count
    }

    pub fn set_zero_offset(&mut self, zero_offset: f32) {
        self.zero_offset = zero_offset;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_normalize_range() {
        let inputs = [
            0.0, 1.0, -1.0, TAU, -TAU, 7.0, -7.0, 100.5, -100.5, 12345.6, -1e-7, 1e-7,
        ];
        for &x in inputs.iter() {
            let n = normalize_angle(x);
            assert!((0.0..TAU).contains(&n), "normalize({}) = {}", x, n);
        }
    }

    #[test]
    fn test_normalize_idempotent() {
        let inputs = [0.3, -0.3, 6.2, -6.2, 50.0, -50.0, TAU, -1e-7];
        for &x in inputs.iter() {
            let once = normalize_angle(x);
            assert_eq!(normalize_angle(once), once);
        }
    }

    #[test]
    fn test_normalize_values() {
        assert!(approx_eq(normalize_angle(7.0), 7.0 - TAU));
        assert!(approx_eq(normalize_angle(-1.0), TAU - 1.0));
        assert_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_quarter_turn() {
        let mut angle = AngleProcessor::new(Direction::Forward, 7, 0.0);
        let out = angle.process(4096);
        assert!(approx_eq(out.mechanical, TAU / 4.0));
        // 7 * π/2 wraps to 3π/2
        assert!(approx_eq(out.electrical, 3.0 * TAU / 4.0));
    }

    #[test]
    fn test_zero_offset_and_direction() {
        let mut angle = AngleProcessor::new(Direction::Reverse, 7, 0.386563);
        let out = angle.process(4096);
        assert!(approx_eq(out.mechanical, 3.0 * TAU / 4.0));
        let expected = normalize_angle((3.0 * TAU / 4.0 - 0.386563) * 7.0);
        assert!(approx_eq(out.electrical, expected));
    }

    #[test]
    fn test_out_of_range_code_is_masked() {
        let mut angle = AngleProcessor::new(Direction::Forward, 1, 0.0);
        let masked = angle.process(0x4000 | 100);
        assert_eq!(angle.raw_code(), 100);
        assert!(approx_eq(masked.mechanical, 100.0 * RAW_TO_RAD));
    }

    #[test]
    fn test_fault_holds_last_angle() {
        let mut angle = AngleProcessor::new(Direction::Forward, 7, 0.0);
        let good = angle.process_result(Ok(2000));
        let held = angle.process_result(Err(EncoderFault::ErrorFlag));
        assert_eq!(good, held);
        assert!(held.mechanical.is_finite());
        assert_eq!(angle.fault_count(), 1);
    }
}
