use std::path::{Path, PathBuf};

use glam::Vec3;

use uddon::scene_graph::Scene;

/// Body (Panel) -> Arm (Panel), plus a root Sticker (Decal).
///
/// Panel only has positions; Decal has normals, texture coordinates and
/// indices.
const GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "nodes": [0, 2] } ],
    "nodes": [
        { "name": "Body", "mesh": 0, "children": [1] },
        { "name": "Arm", "mesh": 0, "translation": [0.0, 2.0, 0.0] },
        { "name": "Sticker", "mesh": 1, "scale": [2.0, 2.0, 2.0] }
    ],
    "meshes": [
        { "name": "Panel", "primitives": [ { "attributes": { "POSITION": 0 } } ] },
        {
            "name": "Decal",
            "primitives": [
                {
                    "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 },
                    "indices": 3
                }
            ]
        }
    ],
    "accessors": [
        {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        },
        { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
        { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 72, "byteLength": 24 },
        { "buffer": 0, "byteOffset": 96, "byteLength": 6 }
    ],
    "buffers": [ { "uri": "panel.bin", "byteLength": 102 } ]
}"#;

fn buffer_data() -> Vec<u8> {
    let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let normals = [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    let tex_coords = [0.0f32, 0.0, 1.0, 0.0, 0.0, 1.0];
    let indices = [0u16, 2, 1];

    let mut data = Vec::new();
    for value in positions.iter().chain(&normals).chain(&tex_coords) {
        data.extend_from_slice(&value.to_le_bytes());
    }
    for index in indices {
        data.extend_from_slice(&index.to_le_bytes());
    }
    data
}

fn write_gltf(dir: &Path) -> PathBuf {
    std::fs::write(dir.join("panel.bin"), buffer_data()).unwrap();
    let path = dir.join("panel.gltf");
    std::fs::write(&path, GLTF).unwrap();
    path
}

#[test]
fn import_keeps_hierarchy_and_collection_membership() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gltf(dir.path());

    let mut scene = Scene::new();
    let props = scene.new_collection("Props.draft");
    scene.link_collection(scene.master_collection(), props).unwrap();

    let roots = scene.spawn_gltf_file(&path, props).unwrap();

    let body = scene.get_object_by_name("Body").unwrap();
    let arm = scene.get_object_by_name("Arm").unwrap();
    let sticker = scene.get_object_by_name("Sticker").unwrap();

    assert_eq!(roots, vec![body, sticker]);
    assert_eq!(scene.objects[arm].parent_id, Some(body));
    assert_eq!(scene.objects[body].child_ids, vec![arm]);
    assert_eq!(scene.objects[sticker].parent_id, None);
    assert_eq!(scene.collections[props].object_ids, vec![body, arm, sticker]);
    assert!(scene.collections[scene.master_collection()].object_ids.is_empty());

    assert!(scene.objects[arm]
        .transform
        .translation()
        .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    assert!(!scene.objects[sticker].transform.has_unit_scale());
}

#[test]
fn shared_mesh_is_imported_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gltf(dir.path());

    let mut scene = Scene::new();
    let master = scene.master_collection();
    scene.spawn_gltf_file(&path, master).unwrap();

    let body = scene.get_object_by_name("Body").unwrap();
    let arm = scene.get_object_by_name("Arm").unwrap();
    let panel = scene.get_model_by_name("Panel").unwrap();

    assert_eq!(scene.models.len(), 2);
    assert_eq!(scene.objects[body].model_id, Some(panel));
    assert_eq!(scene.objects[arm].model_id, Some(panel));
    assert_eq!(scene.model_users(panel), 2);
}

#[test]
fn missing_attributes_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_gltf(dir.path());

    let mut scene = Scene::new();
    let master = scene.master_collection();
    scene.spawn_gltf_file(&path, master).unwrap();

    let panel = &scene.models[scene.get_model_by_name("Panel").unwrap()].model;
    let primitive = &panel.primitives[0];
    assert!(!primitive.has_tex_coords);
    assert_eq!(primitive.indices, vec![0, 1, 2]);
    assert!(primitive
        .vertices
        .iter()
        .all(|vertex| vertex.normal == Vec3::ZERO && vertex.tangent == Vec3::ZERO));

    let decal = &scene.models[scene.get_model_by_name("Decal").unwrap()].model;
    let primitive = &decal.primitives[0];
    assert!(primitive.has_tex_coords);
    assert_eq!(primitive.indices, vec![0, 2, 1]);
    assert_eq!(primitive.vertices[1].tex_coords, glam::Vec2::new(1.0, 0.0));
    assert_eq!(primitive.vertices[2].normal, Vec3::Z);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = Scene::new();
    let master = scene.master_collection();

    let result = scene.spawn_gltf_file(&dir.path().join("missing.gltf"), master);

    assert!(matches!(result, Err(uddon::Error::Gltf(_))));
    assert_eq!(scene.objects.len(), 0);
}
