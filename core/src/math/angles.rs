use std::f64::consts::PI;

pub struct AngleHelper;

impl AngleHelper {
    pub fn to_degrees(radians: f64) -> f64 {
        radians * 180.0 / PI
    }

    pub fn to_radians(degrees: f64) -> f64 {
        degrees * PI / 180.0
    }

    /// Wraps into `[0, 2π)`.
    pub fn wrap_two_pi(radians: f64) -> f64 {
        radians.rem_euclid(2.0 * PI)
    }

    /// Wraps into `[0, 360)`.
    pub fn wrap_degrees(degrees: f64) -> f64 {
        let wrapped = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        if wrapped >= 360.0 {
            0.0
        } else {
            wrapped
        }
    }
}
