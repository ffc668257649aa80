use glam::{Mat3, Mat4};

use crate::model::{Model, ModelPrimitive};

impl ModelPrimitive {
    /// Transforms the vertex data in place. Mirroring matrices also flip the
    /// triangle winding so faces keep pointing outwards.
    pub fn bake_matrix(&mut self, matrix: Mat4) {
        let linear = Mat3::from_mat4(matrix);
        let normal_matrix = linear.inverse().transpose();

        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point3(vertex.position);
            vertex.normal = (normal_matrix * vertex.normal).normalize_or_zero();
            vertex.tangent = (linear * vertex.tangent).normalize_or_zero();
        }

        if linear.determinant() < 0.0 {
            for triangle in self.indices.chunks_exact_mut(3) {
                triangle.swap(1, 2);
            }
        }
    }
}

impl Model {
    pub fn bake_matrix(&mut self, matrix: Mat4) {
        for primitive in &mut self.primitives {
            primitive.bake_matrix(matrix);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::model::tests::quad;

    use super::*;

    #[test]
    fn scale_moves_positions_and_keeps_unit_normals() {
        let mut model = quad("Quad");
        model.bake_matrix(Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0)));

        let primitive = &model.primitives[0];
        assert!(primitive.vertices[2]
            .position
            .abs_diff_eq(Vec3::new(2.0, 3.0, 0.0), 1e-6));
        for vertex in &primitive.vertices {
            assert!(vertex.normal.abs_diff_eq(Vec3::Z, 1e-6));
        }
        assert_eq!(primitive.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn mirroring_flips_winding() {
        let mut model = quad("Quad");
        model.bake_matrix(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)));

        let primitive = &model.primitives[0];
        assert_eq!(primitive.indices, vec![0, 2, 1, 0, 3, 2]);
        assert!(primitive.vertices[0].normal.abs_diff_eq(Vec3::Z, 1e-6));
    }
}
