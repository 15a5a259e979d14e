use crate::types::WindArray;
use ndarray::Zip;

/// Convert scalar wind speed and direction-from into eastward/northward
/// velocity components.
///
/// Uses the same radian conversion and sign convention as the direction
/// derivation in [`crate::core::frame`], so a decompose of
/// (speed, direction) derived from (u, v) reconstructs (u, v).
pub fn decompose(speed: &WindArray, direction_deg: &WindArray) -> (WindArray, WindArray) {
    let u = Zip::from(speed)
        .and(direction_deg)
        .map_collect(|&s, &d| -s * (180.0 - d).to_radians().sin());
    let v = Zip::from(speed)
        .and(direction_deg)
        .map_collect(|&s, &d| s * (180.0 - d).to_radians().cos());
    (u, v)
}
