use std::collections::HashMap;

use glam::Vec3;

use crate::error::Result;
use crate::model::{Model, ModelPrimitive};

type PositionKey = [u32; 3];

fn position_key(position: Vec3) -> PositionKey {
    position.to_array().map(f32::to_bits)
}

impl ModelPrimitive {
    /// Replaces vertex normals with the area-weighted average of the face
    /// normals around each position, so split vertices along flat edges
    /// share one normal.
    pub fn smooth_normals(&mut self) {
        let mut accumulated: HashMap<PositionKey, Vec3> = HashMap::new();

        for face in 0..self.num_triangles() {
            let [a, b, c] = self.triangle(face).map(|index| self.vertices[index as usize].position);
            // Length is twice the triangle area.
            let face_normal = (b - a).cross(c - a);

            for position in [a, b, c] {
                *accumulated.entry(position_key(position)).or_insert(Vec3::ZERO) += face_normal;
            }
        }

        for vertex in &mut self.vertices {
            if let Some(normal) = accumulated.get(&position_key(vertex.position)) {
                let normal = normal.normalize_or_zero();
                if normal != Vec3::ZERO {
                    vertex.normal = normal;
                }
            }
        }
    }
}

impl Model {
    /// Smooth shading: averaged normals, and fresh tangents where the mesh
    /// has texture coordinates.
    pub fn shade_smooth(&mut self) -> Result<()> {
        for primitive in &mut self.primitives {
            primitive.smooth_normals();
            if primitive.has_tex_coords {
                primitive.generate_tangents(&self.name)?;
            }
        }

        self.smooth = true;

        Ok(())
    }
}
