//! # Per-detector pointing reconstruction
//!
//! Combines the telescope boresight orientation stream with each detector's
//! fixed angular offset to produce sky coordinates.
//!
//! Two quaternion component orders meet at this boundary:
//! - the boresight stream arrives **scalar-first** `[w, x, y, z]`,
//! - focal-plane offset rows are stored **vector-first** `[x, y, z, w]`.
//!
//! Both are converted to [`nalgebra::UnitQuaternion`] on entry, so all
//! composition and vector rotation downstream is order-agnostic.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::constants::{Degree, RA_TURN};

/// Convert a scalar-first `[w, x, y, z]` wire quaternion to a unit rotation.
///
/// The input is renormalized, so slightly denormalized samples from upstream
/// resampling are accepted.
pub fn boresight_from_wire(q: &[f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// Convert a vector-first `[x, y, z, w]` focal-plane offset row to a unit
/// rotation.
pub fn offset_from_wire(q: &[f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[3], q[0], q[1], q[2]))
}

/// Sky coordinates of one detector for one boresight sample.
///
/// The detector's fixed offset is applied within the instrument frame before
/// the instrument's sky orientation, i.e. the composed rotation is
/// `boresight ∘ offset`. The composed rotation is applied to the fixed
/// reference direction `(0, 0, 1)` and the resulting unit vector converted to
/// spherical angles.
///
/// Arguments
/// ---------
/// * `boresight`: instrument orientation at this time sample.
/// * `offset`: the detector's fixed focal-plane offset rotation.
///
/// Return
/// ------
/// * `(ra, dec)` in degrees, with `ra` in `[0, 360)` and `dec` in `[-90, 90]`.
pub fn pointing_radec(
    boresight: &UnitQuaternion<f64>,
    offset: &UnitQuaternion<f64>,
) -> (Degree, Degree) {
    let pointing = boresight * offset;
    unit_vector_to_radec(&pointing.transform_vector(&Vector3::z()))
}

/// Convert a pointing unit vector to right ascension and declination.
///
/// `ra = atan2(y, x)` normalized into `[0, 360)`; `dec = asin(z)`. The `z`
/// component is clamped to `[-1, 1]` so rounding in the quaternion rotation
/// cannot produce NaN at the poles.
///
/// Note the `[0, 360)` normalization: a map whose RA span crosses the
/// 0°/360° seam will under-count near the seam, since samples landing just
/// below 360° do not fold onto the negative side of the map.
pub fn unit_vector_to_radec(v: &Vector3<f64>) -> (Degree, Degree) {
    let ra = v.y.atan2(v.x).to_degrees().rem_euclid(RA_TURN);
    let dec = v.z.clamp(-1.0, 1.0).asin().to_degrees();
    (ra, dec)
}

#[cfg(test)]
mod pointing_test {
    use super::*;

    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    /// 120° rotation about (1,1,1)/√3: maps x→y, y→z, z→x with exact
    /// floating-point arithmetic (all components are 0.5).
    const CYCLIC: [f64; 4] = [0.5, 0.5, 0.5, 0.5];

    #[test]
    fn test_wire_conventions_agree() {
        // Same rotation written in both component orders
        let scalar_first = boresight_from_wire(&CYCLIC);
        let vector_first = offset_from_wire(&[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(scalar_first, vector_first);

        let q = boresight_from_wire(&[FRAC_PI_2.cos(), 0.0, FRAC_PI_2.sin(), 0.0]);
        let r = offset_from_wire(&[0.0, FRAC_PI_2.sin(), 0.0, FRAC_PI_2.cos()]);
        assert_eq!(q, r);
    }

    #[test]
    fn test_wire_renormalizes() {
        let q = boresight_from_wire(&[2.0, 0.0, 0.0, 0.0]);
        assert_eq!(q, UnitQuaternion::identity());
    }

    #[test]
    fn test_identity_points_at_pole() {
        let identity = UnitQuaternion::identity();
        let (ra, dec) = pointing_radec(&identity, &identity);
        assert_eq!(ra, 0.0);
        assert_relative_eq!(dec, 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cyclic_rotation_points_at_origin() {
        let boresight = boresight_from_wire(&CYCLIC);
        let (ra, dec) = pointing_radec(&boresight, &UnitQuaternion::identity());
        assert_eq!(ra, 0.0);
        assert_eq!(dec, 0.0);
    }

    #[test]
    fn test_same_rotation_composed_twice() {
        // z --offset--> x --boresight--> y
        let q = boresight_from_wire(&CYCLIC);
        let (ra, dec) = pointing_radec(&q, &q);
        assert_relative_eq!(ra, 90.0, epsilon = 1e-12);
        assert_eq!(dec, 0.0);
    }

    #[test]
    fn test_composition_order() {
        // The detector offset acts in the instrument frame, before the sky
        // orientation: z --offset (180° x-roll)--> -z --boresight--> -x
        let boresight = boresight_from_wire(&CYCLIC);
        let offset = offset_from_wire(&[1.0, 0.0, 0.0, 0.0]);
        let (ra, dec) = pointing_radec(&boresight, &offset);
        assert_relative_eq!(ra, 180.0, epsilon = 1e-12);
        assert_eq!(dec, 0.0);

        // Swapping the two rotations leaves the vector on the +x axis
        let (ra_swapped, dec_swapped) = pointing_radec(&offset, &boresight);
        assert_eq!(ra_swapped, 0.0);
        assert_eq!(dec_swapped, 0.0);
    }

    #[test]
    fn test_ra_wraps_into_positive_range() {
        let (ra, dec) = unit_vector_to_radec(&Vector3::new(1.0, -1e-8, 0.0));
        assert!(ra > 359.0 && ra < 360.0);
        assert_eq!(dec, 0.0);

        let (ra, _) = unit_vector_to_radec(&Vector3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(ra, 180.0);
    }

    #[test]
    fn test_pole_rounding_is_clamped() {
        // A z component nudged past 1 by rounding must not yield NaN
        let (_, dec) = unit_vector_to_radec(&Vector3::new(0.0, 0.0, 1.0 + 4.0 * f64::EPSILON));
        assert_relative_eq!(dec, 90.0, epsilon = 1e-12);
    }
}
