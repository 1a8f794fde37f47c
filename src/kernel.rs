//! Cubic spline interpolation kernel for smoothed particle hydrodynamics.
//!
//! The kernel takes the scaled distance q = r/h with compact support
//! q ∈ [0, 1] and is normalized for two-dimensional simulation. It is only
//! needed for interpolating values, including density initialization; the
//! gradient enters the time evolution equations.

use nalgebra::Vector2;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn kernel_is_continuous_at_breakpoint() {
        let below = cubic(0.5 - 1e-12);
        let above = cubic(0.5 + 1e-12);
        assert!((below - above).abs() < 1e-9, "below: {}, above: {}", below, above);
    }

    #[test]
    fn kernel_has_compact_support() {
        assert_eq!(cubic(1.0 + 1e-12), 0.0);
        assert_eq!(cubic(2.0), 0.0);
        assert!(cubic(0.0) > 0.0);
    }

    #[test]
    fn kernel_normalizes_to_unity_in_2d() {
        // Integrate W over the plane in polar coordinates with the midpoint
        // rule: 2*pi * sum W(q) q dq, with h = 1.
        let n = 100_000;
        let dq = 1.0 / n as f64;
        let mut integral = 0.0;
        for i in 0..n {
            let q = (i as f64 + 0.5) * dq;
            integral += cubic(q) * q * dq;
        }
        integral *= 2.0 * std::f64::consts::PI;
        assert!((integral - 1.0).abs() < 1e-4, "integral: {}", integral);
    }

    #[test]
    fn gradient_points_against_separation() {
        let separation = Vector2::new(0.3, 0.1);
        let grad = cubic_gradient(&separation, 1.0);
        // the kernel decreases with distance inside the support
        assert!(grad.dot(&separation) < 0.0);
    }

    #[test]
    fn gradient_of_coincident_points_is_zero() {
        let grad = cubic_gradient(&Vector2::zeros(), 0.5);
        assert_eq!(grad, Vector2::zeros());
    }

    #[test]
    fn gradient_vanishes_outside_support() {
        let grad = cubic_gradient(&Vector2::new(3.0, 0.0), 1.0);
        assert_eq!(grad, Vector2::zeros());
    }

    #[test]
    fn density_of_isolated_pair() {
        // two unit masses at distance 0.5h contribute W(0)/h^2 + W(0.5)/h^2
        let h = 0.2;
        let expected = (cubic(0.0) + cubic(0.5)) / (h * h);
        let contributions = [0.0, 0.5 * h]
            .iter()
            .map(|&r| kernel_weight(r, h))
            .sum::<f64>();
        assert!((contributions - expected).abs() < 1e-12);
    }
}

/// Normalization constant for the cubic spline in two dimensions.
const SIGMA_2D: f64 = 40.0 / (7.0 * std::f64::consts::PI);

/// Cubic spline kernel value at scaled distance q = r/h, without the 1/h^2
/// dimensional factor.
pub fn cubic(q: f64) -> f64 {
    if (0.0..=0.5).contains(&q) {
        SIGMA_2D * (1.0 - 6.0 * (q * q - q * q * q))
    } else if q <= 1.0 {
        SIGMA_2D * 2.0 * (1.0 - q) * (1.0 - q) * (1.0 - q)
    } else {
        0.0
    }
}

/// Kernel weight W(r, h) of a neighbor at distance r, including the 1/h^2
/// factor that makes densities come out per unit area.
pub fn kernel_weight(distance: f64, h: f64) -> f64 {
    cubic(distance / h) / (h * h)
}

/// Gradient of the kernel with respect to the separation vector, for a
/// neighbor displaced by `separation` from the evaluation point.
///
/// Returns zero for coincident points; the direction is undefined there and
/// the kernel is flat at the origin.
pub fn cubic_gradient(separation: &Vector2<f64>, h: f64) -> Vector2<f64> {
    let r = separation.norm();
    if r == 0.0 {
        return Vector2::zeros();
    }

    let q = r / h;
    let dw_dq = if (0.0..=0.5).contains(&q) {
        SIGMA_2D * (-12.0 * q + 18.0 * q * q)
    } else if q <= 1.0 {
        -6.0 * SIGMA_2D * (1.0 - q) * (1.0 - q)
    } else {
        return Vector2::zeros();
    };

    // chain rule: dW/dr = dW/dq / h, applied along the unit separation,
    // with the 1/h^2 normalization factor
    separation * (dw_dq / (h * h * h * r))
}
