use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use gltf::buffer;
use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    #[serde(default)]
    pub tex_coords: Vec2,
    #[serde(default)]
    pub tangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            tex_coords: Vec2::ZERO,
            tangent: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    #[serde(default)]
    pub has_tex_coords: bool,
}

impl ModelPrimitive {
    pub fn new(index: usize, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            index,
            vertices,
            indices,
            has_tex_coords: false,
        }
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, face: usize) -> [u32; 3] {
        let base = face * 3;
        [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ]
    }

    pub fn vertex_by_triangle_index(&self, face: usize, vert: usize) -> &Vertex {
        let index = self.indices[face * 3 + vert] as usize;
        &self.vertices[index]
    }

    pub fn vertex_by_triangle_index_mut(&mut self, face: usize, vert: usize) -> &mut Vertex {
        let index = self.indices[face * 3 + vert] as usize;
        &mut self.vertices[index]
    }

    fn validate(&self, model_name: &str) -> Result<()> {
        if self.indices.len() % 3 != 0 {
            return Err(Error::InvalidMesh(format!(
                "{} (primitive {}): index count {} is not a multiple of 3",
                model_name,
                self.index,
                self.indices.len()
            )));
        }

        if let Some(index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= self.vertices.len())
        {
            return Err(Error::InvalidMesh(format!(
                "{} (primitive {}): index {} out of range for {} vertices",
                model_name,
                self.index,
                index,
                self.vertices.len()
            )));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    /// Smooth shading. Flat meshes carry per-face normals.
    #[serde(default)]
    pub smooth: bool,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> Self {
        Self {
            name: name.into(),
            primitives,
            smooth: false,
        }
    }

    pub fn from_gltf(name: impl Into<String>, mesh: gltf::Mesh, buffers: Buffers) -> Result<Model> {
        let mut model = Model::new(name, Vec::new());

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(Error::InvalidMesh(format!(
                    "{}: unsupported primitive mode {:?}",
                    model.name,
                    primitive.mode()
                )));
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| Error::InvalidMesh(format!("{}: missing positions", model.name)))?
                .map(Vec3::from)
                .collect::<Vec<_>>();
            let vertex_count = positions.len();

            let normals = match reader.read_normals() {
                Some(normals) => normals.map(Vec3::from).collect::<Vec<_>>(),
                None => vec![Vec3::ZERO; vertex_count],
            };
            let tex_coords = reader
                .read_tex_coords(0)
                .map(|tex_coords| tex_coords.into_f32().map(Vec2::from).collect::<Vec<_>>());
            let has_tex_coords = tex_coords.is_some();
            let tex_coords = tex_coords.unwrap_or_else(|| vec![Vec2::ZERO; vertex_count]);
            let tangents = match reader.read_tangents() {
                Some(tangents) => tangents.map(|t| Vec4::from(t).xyz()).collect::<Vec<_>>(),
                None => vec![Vec3::ZERO; vertex_count],
            };

            let vertices = izip!(positions, normals, tex_coords, tangents)
                .map(|(position, normal, tex_coords, tangent)| Vertex {
                    position,
                    normal,
                    tex_coords,
                    tangent,
                })
                .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertex_count as u32).collect(),
            };

            let mut model_primitive = ModelPrimitive::new(primitive.index(), vertices, indices);
            model_primitive.has_tex_coords = has_tex_coords;
            model.primitives.push(model_primitive);
        }

        model.validate()?;

        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.primitives.is_empty() {
            return Err(Error::InvalidMesh(format!(
                "Mesh without primitives: {}",
                self.name
            )));
        }

        for primitive in &self.primitives {
            primitive.validate(&self.name)?;
        }

        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }

    pub fn num_triangles(&self) -> usize {
        self.primitives.iter().map(|p| p.num_triangles()).sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two triangles forming a unit quad in the XY plane, flat shaded.
    pub(crate) fn quad(name: &str) -> Model {
        let normal = Vec3::Z;
        let vertices = vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), normal),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), normal),
            Vertex::new(Vec3::new(1.0, 1.0, 0.0), normal),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), normal),
        ];

        Model::new(name, vec![ModelPrimitive::new(0, vertices, vec![0, 1, 2, 0, 2, 3])])
    }

    #[test]
    fn counts_vertices_and_triangles() {
        let model = quad("Quad");
        assert_eq!(model.num_vertices(), 4);
        assert_eq!(model.num_triangles(), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let mut model = quad("Broken");
        model.primitives[0].indices[5] = 9;

        let err = model.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidMesh(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn rejects_empty_mesh() {
        let model = Model::new("Empty", Vec::new());
        assert!(model.validate().is_err());
    }
}
