use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform of an object relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Decomposes an affine matrix. Shear is lost.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();

        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn has_unit_scale(&self) -> bool {
        self.scale.abs_diff_eq(Vec3::ONE, 1e-5)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_round_trip_keeps_components() {
        let transform = Transform::new(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(2.0, 0.5, 1.5),
        );

        let decomposed = Transform::from_matrix(transform.local_matrix());

        assert!(decomposed.translation().abs_diff_eq(transform.translation(), 1e-5));
        assert!(decomposed.scale().abs_diff_eq(transform.scale(), 1e-5));
        assert!(decomposed.rotation().abs_diff_eq(transform.rotation(), 1e-5));
    }

    #[test]
    fn unit_scale_detection() {
        let mut transform = Transform::from_translation(Vec3::X);
        assert!(transform.has_unit_scale());

        transform.set_scale(Vec3::new(1.0, 2.0, 1.0));
        assert!(!transform.has_unit_scale());
    }
}
