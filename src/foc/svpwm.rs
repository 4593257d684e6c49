// Space Vector PWM (SVPWM) generation
//
// Six-sector modulation with sign-based sector detection. The sector code
// is built from three half-plane tests, so no trigonometry is needed, and
// the two active vector times come from the X/Y/Z projections.
//
// The modulator only computes compare values. Writing them to the timer is
// the job of the hardware layer.

use libm::roundf;

use super::transforms::AlphaBeta;

const SQRT3: f32 = 1.732_050_8; // sqrt(3)
const SQRT3_DIV_2: f32 = 0.866_025_4; // sqrt(3) / 2

/// Stateful SVPWM modulator
///
/// Keeps the inputs and intermediate values of the last modulation so they
/// can be reported through telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceVectorModulator {
    /// PWM period Ts in timer counts
    period: f32,
    alpha: f32,
    beta: f32,
    bus_voltage: f32,
    /// Sector code 1..=6; 0 for the zero vector
    sector: u8,
    t1: f32,
    t2: f32,
    /// Compare values for phases U, V, W
    ccr: [f32; 3],
    /// T1 + T2 had to be scaled down to fit the period
    overmodulated: bool,
}

impl SpaceVectorModulator {
    /// # Arguments
    /// * `period` - PWM period Ts in timer counts
    pub const fn new(period: u16) -> Self {
        let half = period as f32 / 2.0;
        Self {
            period: period as f32,
            alpha: 0.0,
            beta: 0.0,
            bus_voltage: 0.0,
            sector: 0,
            t1: 0.0,
            t2: 0.0,
            ccr: [half; 3],
            overmodulated: false,
        }
    }

    /// Modulate one voltage vector
    ///
    /// # Arguments
    /// * `v` - Stator voltage in the stationary frame [V]
    /// * `bus_voltage` - DC bus voltage [V]
    ///
    /// # Returns
    /// Compare values for phases U, V, W, each within 0..=Ts
    ///
    /// # Algorithm
    /// 1. Sector code from the signs of three half-plane projections
    /// 2. X/Y/Z projections scaled by √3·Ts/Udc
    /// 3. Active vector times T1/T2 by sector, scaled down if T1+T2 > Ts
    /// 4. Edge times Ta/Tb/Tc assigned to the phases by sector
    ///
    /// A degenerate sector (0 or 7), a non-finite input or a bus voltage
    /// of zero or below produces the zero vector, Ts/2 on every phase.
    pub fn modulate(&mut self, v: AlphaBeta, bus_voltage: f32) -> [u16; 3] {
        self.alpha = v.alpha;
        self.beta = v.beta;
        self.bus_voltage = bus_voltage;
        self.overmodulated = false;

        let ts = self.period;

        let usable = bus_voltage > 0.0 && v.alpha.is_finite() && v.beta.is_finite();
        if !usable {
            self.sector = 0;
            self.t1 = 0.0;
            self.t2 = 0.0;
            self.ccr = [ts / 2.0; 3];
            return self.compare_values();
        }

        // Sector detection
        let a = v.beta;
        let b = SQRT3_DIV_2 * v.alpha - 0.5 * v.beta;
        let c = -SQRT3_DIV_2 * v.alpha - 0.5 * v.beta;
        self.sector = (a > 0.0) as u8 + 2 * (b > 0.0) as u8 + 4 * (c > 0.0) as u8;

        // Vector times
        let k = SQRT3 * ts / bus_voltage;
        let x = k * v.beta;
        let y = k * (SQRT3_DIV_2 * v.alpha + 0.5 * v.beta);
        let z = k * (-SQRT3_DIV_2 * v.alpha + 0.5 * v.beta);

        let (mut t1, mut t2) = match self.sector {
            3 => (-z, x),
            1 => (z, y),
            5 => (x, -y),
            4 => (-x, z),
            6 => (-y, -z),
            2 => (y, -x),
            _ => (0.0, 0.0),
        };

        // Over-modulation: keep the direction, shrink the magnitude
        let sum = t1 + t2;
        if sum > ts {
            t1 = t1 * ts / sum;
            t2 = t2 * ts / sum;
            self.overmodulated = true;
        }
        self.t1 = t1;
        self.t2 = t2;

        // Edge times
        let ta = (ts + t1 + t2) / 2.0;
        let tb = (ts - t1 + t2) / 2.0;
        let tc = (ts - t1 - t2) / 2.0;

        let ccr = match self.sector {
            3 => [ta, tb, tc],
            1 => [tb, ta, tc],
            5 => [tc, ta, tb],
            4 => [tc, tb, ta],
            6 => [tb, tc, ta],
            2 => [ta, tc, tb],
            _ => [ts / 2.0; 3],
        };
        self.ccr = ccr.map(|t| t.clamp(0.0, ts));

        self.compare_values()
    }

    /// Compare values rounded to timer counts and clamped to 0..=Ts
    pub fn compare_values(&self) -> [u16; 3] {
        let ts = self.period;
        self.ccr.map(|value| roundf(value).clamp(0.0, ts) as u16)
    }

    /// Compare values before rounding
    pub fn ccr(&self) -> [f32; 3] {
        self.ccr
    }

    /// Sector code of the last modulation (1..=6, 0 for the zero vector)
    pub fn sector(&self) -> u8 {
        self.sector
    }

    pub fn t1(&self) -> f32 {
        self.t1
    }

    pub fn t2(&self) -> f32 {
        self.t2
    }

    /// Input vector of the last modulation
    pub fn input(&self) -> AlphaBeta {
        AlphaBeta {
            alpha: self.alpha,
            beta: self.beta,
        }
    }

    pub fn bus_voltage(&self) -> f32 {
        self.bus_voltage
    }

    pub fn overmodulated(&self) -> bool {
        self.overmodulated
    }

    pub fn period(&self) -> u16 {
        self.period as u16
    }

    pub fn set_period(&mut self, period: u16) {
        self.period = period as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foc::transforms::inverse_clarke;
    use core::f32::consts::PI;

    const TS: u16 = 4200;
    const UDC: f32 = 12.0;

    fn vector(alpha: f32, beta: f32) -> AlphaBeta {
        AlphaBeta { alpha, beta }
    }

    #[test]
    fn test_sector_of_positive_alpha() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        svpwm.modulate(vector(1.0, 0.0), UDC);
        assert_eq!(svpwm.sector(), 2);
    }

    #[test]
    fn test_all_sector_codes() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        let mut seen = [false; 8];
        for k in 0..6 {
            let angle = (k as f32 * 60.0 + 30.0) * PI / 180.0;
            svpwm.modulate(vector(libm::cosf(angle), libm::sinf(angle)), UDC);
            let sector = svpwm.sector();
            assert!((1..=6).contains(&sector));
            seen[sector as usize] = true;
        }
        assert!(seen[1..=6].iter().all(|&s| s));
    }

    #[test]
    fn test_duty_bounds() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        let limit = UDC / SQRT3;
        let steps = 20;
        for i in 0..=steps {
            for j in 0..=steps {
                let alpha = -limit + 2.0 * limit * i as f32 / steps as f32;
                let beta = -limit + 2.0 * limit * j as f32 / steps as f32;
                let ccr = svpwm.modulate(vector(alpha, beta), UDC);
                for &value in ccr.iter() {
                    assert!(value <= TS, "ccr {} at ({}, {})", value, alpha, beta);
                }
                for &value in svpwm.ccr().iter() {
                    assert!((0.0..=TS as f32).contains(&value));
                }
            }
        }
    }

    #[test]
    fn test_line_voltages_follow_demand() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        let magnitude = 0.5 * UDC / SQRT3;
        for k in 0..12 {
            let angle = (k as f32 * 30.0 + 15.0) * PI / 180.0;
            let v = vector(magnitude * libm::cosf(angle), magnitude * libm::sinf(angle));
            svpwm.modulate(v, UDC);

            let ccr = svpwm.ccr();
            let to_volts = UDC / TS as f32;
            let (u, vv, w) = inverse_clarke(v);
            assert!(((ccr[0] - ccr[1]) * to_volts - (u - vv)).abs() < 1e-3);
            assert!(((ccr[1] - ccr[2]) * to_volts - (vv - w)).abs() < 1e-3);
            assert!(!svpwm.overmodulated());
        }
    }

    #[test]
    fn test_overmodulation_is_rescaled() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        let ccr = svpwm.modulate(vector(100.0, 20.0), UDC);
        assert!(svpwm.overmodulated());
        assert!((svpwm.t1() + svpwm.t2() - TS as f32).abs() < 0.5);
        for &value in ccr.iter() {
            assert!(value <= TS);
        }
    }

    #[test]
    fn test_zero_vector() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        let ccr = svpwm.modulate(vector(0.0, 0.0), UDC);
        assert_eq!(svpwm.sector(), 0);
        assert_eq!(ccr, [TS / 2; 3]);
    }

    #[test]
    fn test_no_bus_voltage() {
        let mut svpwm = SpaceVectorModulator::new(TS);
        assert_eq!(svpwm.modulate(vector(3.0, 1.0), 0.0), [TS / 2; 3]);
        assert_eq!(svpwm.modulate(vector(3.0, 1.0), -5.0), [TS / 2; 3]);
        assert_eq!(svpwm.modulate(vector(f32::NAN, 1.0), UDC), [TS / 2; 3]);
    }
}
