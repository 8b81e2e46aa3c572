//! Circular bound for stick coordinates.
//!
//! Joystick widgets can report knob offsets outside their circular guide
//! while a drag is in flight. [`CircleBound`] projects such points back onto
//! the circle along the line through the origin, so downstream math always
//! sees coordinates of magnitude at most 1.
//!
//! # Example
//!
//! ```rust
//! use tcr_core::utils::math::circle::CircleBound;
//!
//! let bound = CircleBound::new();
//! assert_eq!(bound.clamp(0.3, 0.4), (0.3, 0.4));
//! assert_eq!(bound.clamp(2.0, 0.0), (1.0, 0.0));
//! ```

use libm;

/// Circle centered on the origin that stick coordinates must stay inside.
#[derive(Debug, Clone, Copy)]
pub struct CircleBound {
    radius: f32,
}

impl CircleBound {
    /// Unit-radius bound, matching the normalized stick range.
    pub fn new() -> Self {
        Self { radius: 1.0 }
    }

    /// Whether the point lies on or inside the bound.
    pub fn contains(
        &self,
        x: f32,
        y: f32,
    ) -> bool {
        libm::sqrtf(x * x + y * y) <= self.radius
    }

    /// Clamp a point to the bound.
    ///
    /// Points on or inside the circle pass through unchanged. Points outside
    /// land on the nearer of the two intersections between the circle and
    /// the line `y = gradient * x` through the origin and the point.
    pub fn clamp(
        &self,
        x: f32,
        y: f32,
    ) -> (f32, f32) {
        if self.contains(x, y) {
            return (x, y);
        }

        // The gradient is undefined on the vertical axis; the nearest rim
        // point is straight up or straight down.
        if x == 0.0 {
            return (0.0, if y > 0.0 { self.radius } else { -self.radius });
        }

        // Substituting y = gradient * x into the circle equation leaves
        // x^2 * (gradient^2 + 1) = radius, two roots for x.
        let gradient = y / x;
        let x_square = self.radius / (gradient * gradient + 1.0);
        let x1 = libm::sqrtf(x_square);
        let x2 = -x1;
        let y1 = gradient * x1;
        let y2 = gradient * x2;

        if distance(x1, y1, x, y) < distance(x2, y2, x, y) {
            (x1, y1)
        } else {
            (x2, y2)
        }
    }
}

/// Euclidean distance between two coordinates.
fn distance(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
) -> f32 {
    libm::sqrtf((y1 - y2) * (y1 - y2) + (x1 - x2) * (x1 - x2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_points_pass_through() {
        let bound = CircleBound::new();
        assert_eq!(bound.clamp(0.3, 0.4), (0.3, 0.4));
        assert_eq!(bound.clamp(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_rim_points_pass_through() {
        let bound = CircleBound::new();
        assert_eq!(bound.clamp(1.0, 0.0), (1.0, 0.0));
        assert!(bound.contains(0.0, -1.0));
    }

    #[test]
    fn test_outside_points_land_on_the_rim() {
        let bound = CircleBound::new();
        let (x, y) = bound.clamp(-3.0, -3.0);
        let magnitude = libm::sqrtf(x * x + y * y);
        assert!((magnitude - 1.0).abs() < 1e-3);
        assert!((x + 0.7071).abs() < 1e-3);
        assert!((y + 0.7071).abs() < 1e-3);
    }

    #[test]
    fn test_nearer_intersection_wins() {
        let bound = CircleBound::new();
        assert_eq!(bound.clamp(2.0, 0.0), (1.0, 0.0));
        let (x, y) = bound.clamp(-2.0, 0.0);
        assert_eq!((x, y), (-1.0, 0.0));
    }

    #[test]
    fn test_vertical_axis_clamps_straight() {
        let bound = CircleBound::new();
        assert_eq!(bound.clamp(0.0, 5.0), (0.0, 1.0));
        assert_eq!(bound.clamp(0.0, -2.0), (0.0, -1.0));
    }
}
