use glam::{Mat4, Quat, Vec3};

/// The sampled position, rotation and scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The values used for tracks without any keyframes.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Scale, then rotate, then translate.
    ///
    /// The rotation is normalized first since interpolated keyframes
    /// may not be unit quaternions.
    pub fn to_matrix(self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation.normalize(),
            self.translation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use glam::vec3;

    #[test]
    fn identity_matrix() {
        assert_eq!(Mat4::IDENTITY, Transform::IDENTITY.to_matrix());
        assert_eq!(Transform::IDENTITY, Transform::default());
    }

    #[test]
    fn scale_rotate_translate_order() {
        let transform = Transform {
            translation: vec3(0.0, 0.0, 5.0),
            rotation: Quat::from_rotation_z(90f32.to_radians()),
            scale: vec3(2.0, 1.0, 1.0),
        };
        assert_relative_eq!(
            vec3(0.0, 2.0, 5.0),
            transform.to_matrix().transform_point3(Vec3::X),
            epsilon = 1e-6
        );
    }

    #[test]
    fn unnormalized_rotation() {
        let transform = Transform {
            rotation: Quat::from_xyzw(0.0, 0.0, 2.0, 0.0),
            ..Transform::IDENTITY
        };
        assert_relative_eq!(
            vec3(-1.0, 0.0, 0.0),
            transform.to_matrix().transform_point3(Vec3::X),
            epsilon = 1e-6
        );
    }
}
