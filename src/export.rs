//! Writing collections to files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use glam::Mat3;

use crate::error::Result;
use crate::scene_graph::{ObjectId, Scene};

pub const FBX_EXTENSION: &str = "fbx";
pub const OBJ_EXTENSION: &str = "obj";

/// `folder + collection_name + "." + extension`, verbatim. No separator is
/// inserted and nothing is escaped.
pub fn export_file_path(folder: &str, collection_name: &str, extension: &str) -> PathBuf {
    PathBuf::from(format!("{}{}.{}", folder, collection_name, extension))
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub path: PathBuf,
    /// Objects of the active collection.
    pub objects: Vec<ObjectId>,
    /// Only the selected objects are written.
    pub use_selection: bool,
    /// Only `objects` are written. If not, every object in the scene is.
    pub use_active_collection: bool,
}

/// A file format writer. Existing files at the request path are overwritten.
pub trait Exporter {
    fn extension(&self) -> &str;

    fn export(&self, scene: &Scene, request: &ExportRequest) -> Result<()>;
}

/// Wavefront OBJ writer. Geometry is written in world space, one `o` group per
/// object with a mesh.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjExporter;

impl ObjExporter {
    pub fn write<W: Write>(&self, scene: &Scene, objects: &[ObjectId], out: &mut W) -> Result<()> {
        writeln!(out, "# uddon OBJ export")?;

        // OBJ indices are global and 1-based. `vt` lines only exist for
        // primitives with texture coordinates, so they are counted apart.
        let mut vertex_offset = 1usize;
        let mut tex_coord_offset = 1usize;

        for &object_id in objects {
            let object = scene.object(object_id)?;
            let Some(scene_model) = object.model_id.and_then(|id| scene.get_model(id)) else {
                continue;
            };

            let world = scene.world_matrix(object_id);
            let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
            let flip_winding = world.determinant() < 0.0;

            writeln!(out, "o {}", object.name)?;
            writeln!(out, "s {}", if scene_model.model.smooth { "1" } else { "off" })?;

            for primitive in &scene_model.model.primitives {
                for vertex in &primitive.vertices {
                    let p = world.transform_point3(vertex.position);
                    writeln!(out, "v {} {} {}", tidy(p.x), tidy(p.y), tidy(p.z))?;
                }
                for vertex in &primitive.vertices {
                    let n = (normal_matrix * vertex.normal).normalize_or_zero();
                    writeln!(out, "vn {} {} {}", tidy(n.x), tidy(n.y), tidy(n.z))?;
                }
                if primitive.has_tex_coords {
                    for vertex in &primitive.vertices {
                        writeln!(out, "vt {} {}", vertex.tex_coords.x, 1.0 - vertex.tex_coords.y)?;
                    }
                }

                for face in 0..primitive.num_triangles() {
                    let mut triangle = primitive.triangle(face).map(|i| i as usize);
                    if flip_winding {
                        triangle.swap(1, 2);
                    }

                    write!(out, "f")?;
                    for index in triangle {
                        let v = index + vertex_offset;
                        if primitive.has_tex_coords {
                            write!(out, " {}/{}/{}", v, index + tex_coord_offset, v)?;
                        } else {
                            write!(out, " {0}//{0}", v)?;
                        }
                    }
                    writeln!(out)?;
                }

                vertex_offset += primitive.vertices.len();
                if primitive.has_tex_coords {
                    tex_coord_offset += primitive.vertices.len();
                }
            }
        }

        Ok(())
    }
}

impl Exporter for ObjExporter {
    fn extension(&self) -> &str {
        OBJ_EXTENSION
    }

    fn export(&self, scene: &Scene, request: &ExportRequest) -> Result<()> {
        let candidates = if request.use_active_collection {
            request.objects.clone()
        } else {
            scene.objects.iter().map(|(id, _)| id).collect()
        };

        let objects = candidates
            .into_iter()
            .filter(|&id| {
                !request.use_selection
                    || scene.get_object(id).map(|object| object.selected).unwrap_or(false)
            })
            .collect::<Vec<_>>();

        let mut out = BufWriter::new(File::create(&request.path)?);
        self.write(scene, &objects, &mut out)?;
        out.flush()?;

        log::info!(
            "Wrote {} object(s) to {}",
            objects.len(),
            request.path.display()
        );

        Ok(())
    }
}

/// Avoids `-0` in the text output.
fn tidy(value: f32) -> f32 {
    value + 0.0
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::model::tests::quad;
    use crate::scene_graph::{Object3D, SceneModel, Transform};

    #[test]
    fn path_is_plain_concatenation() {
        assert_eq!(
            export_file_path("/tmp/exports/", "Hero.lp", FBX_EXTENSION),
            PathBuf::from("/tmp/exports/Hero.lp.fbx")
        );
        assert_eq!(
            export_file_path("/tmp/exports", "Hero.lp", FBX_EXTENSION),
            PathBuf::from("/tmp/exportsHero.lp.fbx")
        );
    }

    #[test]
    fn obj_output_is_in_world_space() {
        let mut scene = Scene::new();
        let model_id = scene.add_model(SceneModel::new("Quad".to_string(), quad("Quad")));
        let object = scene.add_object(
            Object3D::new("Panel.lp")
                .with_model(model_id)
                .with_transform(Transform::new(Vec3::new(0.0, 0.0, 5.0), Quat::IDENTITY, Vec3::ONE)),
        );
        let empty = scene.add_object(Object3D::new("Empty.lp"));

        let mut out = Vec::new();
        ObjExporter.write(&scene, &[object, empty], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("o Panel.lp\n"));
        assert!(!text.contains("Empty.lp"));
        assert!(text.contains("v 1 1 5\n"));
        assert!(text.contains("vn 0 0 1\n"));
        assert!(text.contains("f 1//1 2//2 3//3\n"));
        assert!(text.contains("f 1//1 3//3 4//4\n"));
    }

    #[test]
    fn indices_continue_across_objects() {
        let mut scene = Scene::new();
        let model_id = scene.add_model(SceneModel::new("Quad".to_string(), quad("Quad")));
        let a = scene.add_object(Object3D::new("A").with_model(model_id));
        let b = scene.add_object(Object3D::new("B").with_model(model_id));

        let mut out = Vec::new();
        ObjExporter.write(&scene, &[a, b], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("f 5//5 6//6 7//7\n"));
    }

    #[test]
    fn tex_coord_indices_skip_meshes_without_uvs() {
        let mut scene = Scene::new();
        let plain = scene.add_model(SceneModel::new("Plain".to_string(), quad("Plain")));
        let mut textured_quad = quad("Textured");
        textured_quad.primitives[0].has_tex_coords = true;
        let textured = scene.add_model(SceneModel::new("Textured".to_string(), textured_quad));
        let a = scene.add_object(Object3D::new("A").with_model(plain));
        let b = scene.add_object(Object3D::new("B").with_model(textured));

        let mut out = Vec::new();
        ObjExporter.write(&scene, &[a, b], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let tex_coord_lines = text.lines().filter(|line| line.starts_with("vt ")).count();
        assert_eq!(tex_coord_lines, 4);
        assert!(text.contains("f 5/1/5 6/2/6 7/3/7\n"));
        assert!(text.contains("f 5/1/5 7/3/7 8/4/8\n"));
    }

    #[test]
    fn export_only_writes_selected_objects() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let model_id = scene.add_model(SceneModel::new("Quad".to_string(), quad("Quad")));
        let a = scene.add_object(Object3D::new("A").with_model(model_id));
        let b = scene.add_object(Object3D::new("B").with_model(model_id));
        scene.select(&[b]);

        let request = ExportRequest {
            path: dir.path().join("out.obj"),
            objects: vec![a, b],
            use_selection: true,
            use_active_collection: true,
        };
        ObjExporter.export(&scene, &request).unwrap();

        let text = std::fs::read_to_string(&request.path).unwrap();
        assert!(text.contains("o B\n"));
        assert!(!text.contains("o A\n"));
    }

    #[test]
    fn export_outside_active_collection_writes_whole_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        let model_id = scene.add_model(SceneModel::new("Quad".to_string(), quad("Quad")));
        let a = scene.add_object(Object3D::new("A").with_model(model_id));
        let b = scene.add_object(Object3D::new("B").with_model(model_id));
        let c = scene.add_object(Object3D::new("C").with_model(model_id));
        scene.select(&[a, c]);

        let request = ExportRequest {
            path: dir.path().join("out.obj"),
            objects: vec![a, b],
            use_selection: true,
            use_active_collection: false,
        };
        ObjExporter.export(&scene, &request).unwrap();

        let text = std::fs::read_to_string(&request.path).unwrap();
        assert!(text.contains("o A\n"));
        assert!(!text.contains("o B\n"));
        assert!(text.contains("o C\n"));
    }
}
