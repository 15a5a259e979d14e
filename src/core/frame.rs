use crate::types::{WindArray, WindError, WindResult};
use ndarray::Zip;
use num_traits::Float;

/// Normalize an angle in degrees to the range [0, 360)
pub fn normalize_degrees<T: Float>(degrees: T) -> T {
    let full = T::from(360.0).unwrap();
    let d = degrees % full;
    if d < T::zero() {
        d + full
    } else {
        d
    }
}

/// Rotate grid-relative vector components into the geographic
/// (eastward/northward) frame.
///
/// `azimuth_deg` is the compass bearing of the grid's "up" (row-decreasing)
/// direction at each pixel. The rotation is exact; direction errors here
/// propagate straight into wind-speed bias through the inversion model.
pub fn to_geographic(
    x: &WindArray,
    y: &WindArray,
    azimuth_deg: &WindArray,
) -> WindResult<(WindArray, WindArray)> {
    if x.dim() != y.dim() || x.dim() != azimuth_deg.dim() {
        return Err(WindError::GridMismatch(format!(
            "component shapes {:?}/{:?} and azimuth shape {:?} differ",
            x.dim(),
            y.dim(),
            azimuth_deg.dim()
        )));
    }
    let east = Zip::from(x)
        .and(y)
        .and(azimuth_deg)
        .map_collect(|&x, &y, &az_deg| {
            let az = az_deg.to_radians();
            y * az.sin() + x * az.cos()
        });
    let north = Zip::from(x)
        .and(y)
        .and(azimuth_deg)
        .map_collect(|&x, &y, &az_deg| {
            let az = az_deg.to_radians();
            y * az.cos() - x * az.sin()
        });
    Ok((east, north))
}

/// Wind direction-from in degrees (0 = from north, 90 = from east),
/// computed from eastward/northward velocity components. The reported
/// direction is where the wind comes from, i.e. the velocity vector
/// rotated 180 degrees.
pub fn direction_from(u: &WindArray, v: &WindArray) -> WindArray {
    Zip::from(u)
        .and(v)
        .map_collect(|&u, &v| normalize_degrees((-u).atan2(-v).to_degrees()))
}

/// Wind speed from eastward/northward components
pub fn speed_from(u: &WindArray, v: &WindArray) -> WindArray {
    Zip::from(u).and(v).map_collect(|&u, &v| u.hypot(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    #[test]
    fn test_rotation_identity_at_zero_azimuth() {
        let x = Array2::from_elem((3, 3), 2.5);
        let y = Array2::from_elem((3, 3), -1.5);
        let az = Array2::zeros((3, 3));
        let (east, north) = to_geographic(&x, &y, &az).unwrap();
        assert_abs_diff_eq!(east[[1, 1]], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(north[[1, 1]], -1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        // Grid "up" pointing due east: grid y becomes geographic east,
        // grid x becomes geographic south
        let x = Array2::from_elem((2, 2), 1.0);
        let y = Array2::from_elem((2, 2), 3.0);
        let az = Array2::from_elem((2, 2), 90.0);
        let (east, north) = to_geographic(&x, &y, &az).unwrap();
        assert_abs_diff_eq!(east[[0, 0]], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(north[[0, 0]], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_inverse_is_identity() {
        let x = Array2::from_shape_fn((4, 4), |(i, j)| (i as f64) - 1.3 * (j as f64));
        let y = Array2::from_shape_fn((4, 4), |(i, j)| 0.7 * (i as f64) + (j as f64));
        let az = Array2::from_elem((4, 4), 37.0);
        let neg_az = Array2::from_elem((4, 4), -37.0);
        let (east, north) = to_geographic(&x, &y, &az).unwrap();
        let (x2, y2) = to_geographic(&east, &north, &neg_az).unwrap();
        for (a, b) in x.iter().zip(x2.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        for (a, b) in y.iter().zip(y2.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_direction_from_cardinal_winds() {
        // Wind blowing towards south (u=0, v=-5) comes from the north
        let u = Array2::from_elem((1, 1), 0.0);
        let v = Array2::from_elem((1, 1), -5.0);
        assert_abs_diff_eq!(direction_from(&u, &v)[[0, 0]], 0.0, epsilon = 1e-12);

        // Wind blowing towards west (u=-5, v=0) comes from the east
        let u = Array2::from_elem((1, 1), -5.0);
        let v = Array2::from_elem((1, 1), 0.0);
        assert_abs_diff_eq!(direction_from(&u, &v)[[0, 0]], 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_degrees_range() {
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(360.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(725.0), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(-90.0_f32), 270.0_f32, epsilon = 1e-4);
    }

    #[test]
    fn test_speed_from_components() {
        let u = Array2::from_elem((1, 1), 3.0);
        let v = Array2::from_elem((1, 1), 4.0);
        assert_abs_diff_eq!(speed_from(&u, &v)[[0, 0]], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = Array2::zeros((2, 2));
        let y = Array2::zeros((2, 3));
        let az = Array2::zeros((2, 2));
        assert!(to_geographic(&x, &y, &az).is_err());
    }
}
