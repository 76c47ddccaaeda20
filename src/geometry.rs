//! Polar to Cartesian helper.

/// Point on the circle of `radius` around (`center_x`, `center_y`) at `angle_degrees`.
///
/// The angle is wrapped into `[0, 360)` first, so negative angles land on the
/// same point as their positive equivalent.
pub fn point_on_circle(center_x: f32, center_y: f32, radius: f32, angle_degrees: f32) -> (f32, f32) {
    let radians = angle_degrees.rem_euclid(360.0).to_radians();
    (
        center_x + radius * radians.cos(),
        center_y + radius * radians.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::point_on_circle;

    #[test]
    fn negative_angle_wraps_exactly() {
        assert_eq!(
            point_on_circle(150.0, 250.0, 100.0, -30.0),
            point_on_circle(150.0, 250.0, 100.0, 330.0)
        );
    }

    #[test]
    fn full_turns_wrap() {
        assert_eq!(
            point_on_circle(0.0, 0.0, 10.0, 765.0),
            point_on_circle(0.0, 0.0, 10.0, 45.0)
        );
    }

    #[test]
    fn cardinal_points() {
        let (x, y) = point_on_circle(10.0, 20.0, 5.0, 0.0);
        assert!((x - 15.0).abs() < 1e-5 && (y - 20.0).abs() < 1e-5);
        let (x, y) = point_on_circle(10.0, 20.0, 5.0, 90.0);
        assert!((x - 10.0).abs() < 1e-5 && (y - 25.0).abs() < 1e-5);
    }

    #[test]
    fn zero_radius_is_center() {
        assert_eq!(point_on_circle(3.0, 4.0, 0.0, 123.0), (3.0, 4.0));
    }
}
