// Coordinate transformations for FOC (Field Oriented Control)
// Clarke, Park and their inverses

use core::f32::consts::TAU;

use libm::{cosf, floorf, sinf};

// Enable idsp-based fast trigonometric functions
const USE_IDSP_COSSIN: bool = true;

const SQRT3_DIV_2: f32 = 0.866_025_4; // sqrt(3) / 2
const ONE_DIV_SQRT3: f32 = 0.577_350_26; // 1 / sqrt(3)

/// Stationary two-axis frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlphaBeta {
    pub alpha: f32,
    pub beta: f32,
}

/// Rotor-synchronous two-axis frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectQuadrature {
    pub d: f32,
    pub q: f32,
}

/// Clarke transformation from two measured phases (abc → αβ)
///
/// The third phase is implied by Ia + Ib + Ic = 0.
///
/// # Arguments
/// * `ia` - Phase U current
/// * `ib` - Phase V current
pub fn clarke(ia: f32, ib: f32) -> AlphaBeta {
    AlphaBeta {
        alpha: ia,
        beta: (ia + 2.0 * ib) * ONE_DIV_SQRT3,
    }
}

/// Park transformation (αβ → dq)
///
/// # Arguments
/// * `ab` - Stationary frame vector
/// * `theta` - Electrical angle in radians, any range
pub fn park(ab: AlphaBeta, theta: f32) -> DirectQuadrature {
    let (cos_theta, sin_theta) = cos_sin(theta);

    DirectQuadrature {
        d: ab.alpha * cos_theta + ab.beta * sin_theta,
        q: -ab.alpha * sin_theta + ab.beta * cos_theta,
    }
}

/// Inverse Park transformation (dq → αβ)
///
/// Transforms from the rotating dq reference frame to the stationary αβ frame
///
/// # Arguments
/// * `dq` - d-axis and q-axis components
/// * `theta` - Electrical angle in radians, any range
///
/// # Returns
/// The vector in the stationary frame
pub fn inverse_park(dq: DirectQuadrature, theta: f32) -> AlphaBeta {
    let (cos_theta, sin_theta) = cos_sin(theta);

    AlphaBeta {
        alpha: dq.d * cos_theta - dq.q * sin_theta,
        beta: dq.d * sin_theta + dq.q * cos_theta,
    }
}

/// Inverse Clarke transformation (αβ → abc/uvw)
///
/// # Returns
/// Tuple of (u, v, w) phase quantities
pub fn inverse_clarke(ab: AlphaBeta) -> (f32, f32, f32) {
    let u = ab.alpha;
    let v = -0.5 * ab.alpha + SQRT3_DIV_2 * ab.beta;
    let w = -0.5 * ab.alpha - SQRT3_DIV_2 * ab.beta;

    (u, v, w)
}

/// Cosine and sine of an angle in radians
///
/// Uses idsp::cossin() for fast trigonometric calculation (~40 cycles on Cortex-M)
/// compared to libm::cosf/sinf (~100-200 cycles). Can be switched via USE_IDSP_COSSIN.
#[inline]
pub fn cos_sin(theta: f32) -> (f32, f32) {
    if USE_IDSP_COSSIN {
        cos_sin_idsp(theta)
    } else {
        cos_sin_libm(theta)
    }
}

/// Cosine and sine through idsp::cossin() (fast, ~40 cycles on Cortex-M)
#[inline]
pub fn cos_sin_idsp(theta: f32) -> (f32, f32) {
    // One turn spans the whole 32-bit phase; i32 wrap-around covers [-π, π)
    let turns = theta / TAU;
    let fraction = turns - floorf(turns);
    let phase = (fraction * 4_294_967_296.0) as u64 as u32 as i32;

    // cossin() returns (cos, sin) as (i32, i32) in range [-2^31, 2^31-1]
    let (cos_i32, sin_i32) = idsp::cossin(phase);

    const I32_TO_F32: f32 = 1.0 / 2_147_483_648.0; // 1 / 2^31
    (cos_i32 as f32 * I32_TO_F32, sin_i32 as f32 * I32_TO_F32)
}

/// Cosine and sine through libm (slower, ~100-200 cycles)
#[inline]
pub fn cos_sin_libm(theta: f32) -> (f32, f32) {
    (cosf(theta), sinf(theta))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_clarke_balanced() {
        // Ia = 1, Ib = Ic = -0.5
        let ab = clarke(1.0, -0.5);
        assert!(approx_eq(ab.alpha, 1.0));
        assert!(approx_eq(ab.beta, 0.0));

        let ab = clarke(0.0, 1.0);
        assert!(approx_eq(ab.beta, 2.0 / 3.0f32.sqrt()));
    }

    #[test]
    fn test_inverse_park_zero_angle() {
        let ab = inverse_park(DirectQuadrature { d: 1.0, q: 0.0 }, 0.0);
        assert!(approx_eq(ab.alpha, 1.0));
        assert!(approx_eq(ab.beta, 0.0));
    }

    #[test]
    fn test_park_quarter_turn() {
        let dq = park(AlphaBeta { alpha: 0.0, beta: 1.0 }, TAU / 4.0);
        assert!(approx_eq(dq.d, 1.0));
        assert!(approx_eq(dq.q, 0.0));
    }

    #[test]
    fn test_inverse_clarke() {
        let (u, v, w) = inverse_clarke(AlphaBeta { alpha: 1.0, beta: 0.0 });
        assert!(approx_eq(u, 1.0));
        assert!(approx_eq(v, -0.5));
        assert!(approx_eq(w, -0.5));
        // Sum should be zero for balanced three-phase
        assert!(approx_eq(u + v + w, 0.0));
    }

    #[test]
    fn test_round_trip_any_angle() {
        let currents = [(1.0, -0.5), (0.3, 0.7), (-2.0, 1.1), (0.0, 0.0)];
        let angles = [0.0, 0.5, 2.0, 3.14159, 4.5, 6.2, -1.3, -7.0, 20.0];

        for &(ia, ib) in currents.iter() {
            let ab = clarke(ia, ib);
            for &theta in angles.iter() {
                let back = inverse_park(park(ab, theta), theta);
                assert!(approx_eq(back.alpha, ab.alpha), "alpha at {}", theta);
                assert!(approx_eq(back.beta, ab.beta), "beta at {}", theta);

                let (u, v, w) = inverse_clarke(back);
                assert!(approx_eq(u, ia));
                assert!(approx_eq(v, ib));
                assert!(approx_eq(w, -ia - ib));
            }
        }
    }

    #[test]
    fn test_idsp_matches_libm() {
        let mut theta = -10.0f32;
        while theta < 10.0 {
            let (c_fast, s_fast) = cos_sin_idsp(theta);
            let (c_ref, s_ref) = cos_sin_libm(theta);
            assert!(approx_eq(c_fast, c_ref), "cos at {}", theta);
            assert!(approx_eq(s_fast, s_ref), "sin at {}", theta);
            theta += 0.037;
        }
    }
}
