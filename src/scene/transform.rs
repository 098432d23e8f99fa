use glam::{Mat4, Vec3};

/// Translation / Euler rotation (degrees) / scale view of an affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponents {
    pub translation: [f32; 3],
    pub rotation_deg: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            rotation_deg: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl TransformComponents {
    pub fn decompose(matrix: &Mat4) -> Self {
        let m = matrix.to_cols_array();
        let mut x_axis = Vec3::new(m[0], m[1], m[2]);
        let y_axis = Vec3::new(m[4], m[5], m[6]);
        let z_axis = Vec3::new(m[8], m[9], m[10]);

        let mut scale = [x_axis.length(), y_axis.length(), z_axis.length()];
        if x_axis.cross(y_axis).dot(z_axis) < 0.0 {
            scale[0] = -scale[0];
        }
        if scale[0] != 0.0 {
            x_axis /= scale[0];
        }
        let y_axis = if scale[1] != 0.0 { y_axis / scale[1] } else { y_axis };
        let z_axis = if scale[2] != 0.0 { z_axis / scale[2] } else { z_axis };

        // Columns of R = Rz * Ry * Rx.
        let (r00, r10, r20) = (x_axis.x, x_axis.y, x_axis.z);
        let (r01, r11) = (y_axis.x, y_axis.y);
        let (r21, r22) = (y_axis.z, z_axis.z);

        let ry = (-r20).clamp(-1.0, 1.0).asin();
        let (rx, rz) = if ry.cos().abs() > 1e-6 {
            (r21.atan2(r22), r10.atan2(r00))
        } else {
            // Gimbal lock: fold the whole roll into Z.
            (0.0, (-r01).atan2(r11))
        };

        Self {
            translation: [m[12], m[13], m[14]],
            // `+ 0.0` folds negative zero so identity round-trips bit-exactly.
            rotation_deg: [
                rx.to_degrees() + 0.0,
                ry.to_degrees() + 0.0,
                rz.to_degrees() + 0.0,
            ],
            scale,
        }
    }

    pub fn recompose(&self) -> Mat4 {
        compose_transform_matrix(self.translation, self.rotation_deg, self.scale)
    }
}

pub fn compose_transform_matrix(
    position: [f32; 3],
    rotation_deg: [f32; 3],
    scale: [f32; 3],
) -> Mat4 {
    let (rx, ry, rz) = (
        rotation_deg[0].to_radians(),
        rotation_deg[1].to_radians(),
        rotation_deg[2].to_radians(),
    );
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    // Rotation order: Z (roll) * Y (yaw) * X (pitch)
    let r00 = cz * cy;
    let r01 = cz * sy * sx - sz * cx;
    let r02 = cz * sy * cx + sz * sx;
    let r10 = sz * cy;
    let r11 = sz * sy * sx + cz * cx;
    let r12 = sz * sy * cx - cz * sx;
    // `0.0 - sy` yields +0.0 for a zero angle where `-sy` would give -0.0,
    // keeping recomposed matrices bit-identical to ones built from literals.
    let r20 = 0.0 - sy;
    let r21 = cy * sx;
    let r22 = cy * cx;

    let (sx, sy, sz) = (scale[0], scale[1], scale[2]);
    Mat4::from_cols_array(&[
        r00 * sx,
        r10 * sx,
        r20 * sx,
        0.0,
        r01 * sy,
        r11 * sy,
        r21 * sy,
        0.0,
        r02 * sz,
        r12 * sz,
        r22 * sz,
        0.0,
        position[0],
        position[1],
        position[2],
        1.0,
    ])
}

/// Exact bit comparison over all sixteen components.
pub fn matrices_bit_equal(a: &Mat4, b: &Mat4) -> bool {
    a.to_cols_array()
        .iter()
        .zip(b.to_cols_array().iter())
        .all(|(x, y)| x.to_bits() == y.to_bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Mat4, b: &Mat4) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!((x - y).abs() <= 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn identity_decomposes_to_defaults() {
        let components = TransformComponents::decompose(&Mat4::IDENTITY);
        assert_eq!(components, TransformComponents::default());
        assert!(matrices_bit_equal(&components.recompose(), &Mat4::IDENTITY));
    }

    #[test]
    fn decompose_recompose_is_idempotent() {
        let cases = [
            ([1.0, -2.0, 3.5], [10.0, 20.0, 30.0], [1.0, 2.0, 0.5]),
            ([0.0, 0.0, 0.0], [-45.0, 5.0, 170.0], [0.3, 0.3, 0.3]),
            ([100.0, 0.25, -7.0], [0.0, 75.0, 0.0], [1.0, 1.0, 1.0]),
            ([2.0, 2.0, 2.0], [33.0, -60.0, -120.0], [4.0, 1.0, 2.0]),
        ];
        for (t, r, s) in cases {
            let original = compose_transform_matrix(t, r, s);
            let roundtrip = TransformComponents::decompose(&original).recompose();
            assert_close(&roundtrip, &original);
        }
    }

    #[test]
    fn gimbal_lock_still_roundtrips() {
        let original = compose_transform_matrix([0.0, 1.0, 0.0], [30.0, 90.0, 15.0], [1.0, 1.0, 1.0]);
        let roundtrip = TransformComponents::decompose(&original).recompose();
        assert_close(&roundtrip, &original);
    }

    #[test]
    fn bit_equality_detects_single_ulp() {
        let a = Mat4::IDENTITY;
        let mut cols = a.to_cols_array();
        cols[13] = f32::from_bits(cols[13].to_bits() + 1);
        let b = Mat4::from_cols_array(&cols);
        assert!(matrices_bit_equal(&a, &a));
        assert!(!matrices_bit_equal(&a, &b));
    }
}
