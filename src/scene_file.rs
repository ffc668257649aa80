//! Scene files in RON.
//!
//! Objects and meshes are listed flat and referenced by name; the collection
//! tree starts at the master collection and lists object names, so one object
//! can be linked into several collections.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Model;
use crate::scene_graph::{CollectionId, Object3D, ObjectId, Scene, SceneModel, Transform};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub meshes: Vec<Model>,
    #[serde(default)]
    pub objects: Vec<ObjectDocument>,
    pub collection: CollectionDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub mesh: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub children: Vec<CollectionDocument>,
}

impl SceneDocument {
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(6)
            .indentor("    ".to_string());
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Builds a scene, validating every name reference.
    pub fn into_scene(self) -> Result<Scene> {
        let mut scene = Scene::new();

        let mut meshes = HashMap::new();
        for model in self.meshes {
            model.validate()?;
            let name = model.name.clone();
            if meshes.contains_key(&name) {
                return Err(Error::InvalidScene(format!("duplicate mesh name {}", name)));
            }
            let model_id = scene.add_model(SceneModel::new(name.clone(), model));
            meshes.insert(name, model_id);
        }

        let mut objects = HashMap::new();
        for object in &self.objects {
            if objects.contains_key(&object.name) {
                return Err(Error::InvalidScene(format!(
                    "duplicate object name {}",
                    object.name
                )));
            }

            let mut new_object = Object3D::new(object.name.clone()).with_transform(object.transform);
            if let Some(mesh) = &object.mesh {
                let model_id = meshes.get(mesh).ok_or_else(|| {
                    Error::InvalidScene(format!("object {} uses unknown mesh {}", object.name, mesh))
                })?;
                new_object = new_object.with_model(*model_id);
            }

            objects.insert(object.name.clone(), scene.add_object(new_object));
        }

        for object in &self.objects {
            if let Some(parent) = &object.parent {
                let parent_id = objects
                    .get(parent)
                    .ok_or_else(|| Error::UnknownObject(parent.clone()))?;
                scene.set_object_parent(objects[&object.name], Some(*parent_id))?;
            }
        }

        let master = scene.master_collection();
        scene.collections[master].name = self.collection.name.clone();
        let mut seen = vec![self.collection.name.clone()];
        build_collection(&mut scene, master, &self.collection, &objects, &mut seen)?;

        Ok(scene)
    }

    pub fn from_scene(scene: &Scene) -> Result<Self> {
        let meshes = scene
            .models
            .iter()
            .map(|(_, scene_model)| {
                let mut model = scene_model.model.clone();
                model.name = scene_model.name.clone();
                model
            })
            .collect();

        let objects = scene
            .objects
            .iter()
            .map(|(_, object)| ObjectDocument {
                name: object.name.clone(),
                transform: object.transform,
                mesh: object
                    .model_id
                    .and_then(|id| scene.get_model(id))
                    .map(|model| model.name.clone()),
                parent: object.parent(scene).map(|parent| parent.name.clone()),
            })
            .collect();

        Ok(Self {
            meshes,
            objects,
            collection: collection_document(scene, scene.master_collection())?,
        })
    }
}

fn build_collection(
    scene: &mut Scene,
    collection_id: CollectionId,
    document: &CollectionDocument,
    objects: &HashMap<String, ObjectId>,
    seen: &mut Vec<String>,
) -> Result<()> {
    for name in &document.objects {
        let object_id = objects
            .get(name)
            .ok_or_else(|| Error::UnknownObject(name.clone()))?;
        scene.link_object(collection_id, *object_id)?;
    }

    for child in &document.children {
        if seen.contains(&child.name) {
            return Err(Error::InvalidScene(format!(
                "duplicate collection name {}",
                child.name
            )));
        }
        seen.push(child.name.clone());

        let child_id = scene.new_collection(&child.name);
        scene.link_collection(collection_id, child_id)?;
        build_collection(scene, child_id, child, objects, seen)?;
    }

    Ok(())
}

fn collection_document(scene: &Scene, collection_id: CollectionId) -> Result<CollectionDocument> {
    let collection = scene.collection(collection_id)?;

    Ok(CollectionDocument {
        name: collection.name.clone(),
        objects: collection
            .object_ids
            .iter()
            .map(|&id| scene.object(id).map(|object| object.name.clone()))
            .collect::<Result<Vec<_>>>()?,
        children: collection
            .child_ids
            .iter()
            .map(|&id| collection_document(scene, id))
            .collect::<Result<Vec<_>>>()?,
    })
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let source = std::fs::read_to_string(path)?;
    let scene = SceneDocument::from_ron(&source)?.into_scene()?;

    log::info!(
        "Loaded {} with {} object(s) in {} collection(s)",
        path.display(),
        scene.objects.len(),
        scene.collections.len()
    );

    Ok(scene)
}

pub fn save_scene(scene: &Scene, path: &Path) -> Result<()> {
    let source = SceneDocument::from_scene(scene)?.to_ron()?;
    std::fs::write(path, source)?;

    log::info!("Saved {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: &str = r#"(
        meshes: [
            (
                name: "ArmMesh",
                primitives: [
                    (
                        index: 0,
                        vertices: [
                            (position: (0.0, 0.0, 0.0), normal: (0.0, 0.0, 1.0)),
                            (position: (1.0, 0.0, 0.0), normal: (0.0, 0.0, 1.0)),
                            (position: (0.0, 1.0, 0.0), normal: (0.0, 0.0, 1.0)),
                        ],
                        indices: [0, 1, 2],
                    ),
                ],
            ),
        ],
        objects: [
            (name: "Arm.0001", mesh: Some("ArmMesh")),
            (
                name: "Hand.0002",
                transform: (translation: (0.0, 2.0, 0.0)),
                parent: Some("Arm.0001"),
            ),
        ],
        collection: (
            name: "Scene Collection",
            children: [
                (
                    name: "Hero.draft",
                    objects: ["Arm.0001"],
                    children: [(name: "Hero.draft_parts", objects: ["Hand.0002"])],
                ),
            ],
        ),
    )"#;

    #[test]
    fn builds_scene_from_document() {
        let scene = SceneDocument::from_ron(HERO).unwrap().into_scene().unwrap();

        let hero = scene.get_collection_by_name("Hero.draft").unwrap();
        let parts = scene.get_collection_by_name("Hero.draft_parts").unwrap();
        let arm = scene.get_object_by_name("Arm.0001").unwrap();
        let hand = scene.get_object_by_name("Hand.0002").unwrap();

        assert_eq!(scene.collections[hero].child_ids, vec![parts]);
        assert_eq!(scene.collections[parts].object_ids, vec![hand]);
        assert_eq!(scene.objects[hand].parent_id, Some(arm));
        assert!(scene.objects[arm].model_id.is_some());
        assert!(scene.objects[hand].transform.has_unit_scale());
    }

    #[test]
    fn document_survives_scene_round_trip() {
        let document = SceneDocument::from_ron(HERO).unwrap();
        let scene = document.clone().into_scene().unwrap();

        let again = SceneDocument::from_scene(&scene).unwrap();

        assert_eq!(again.collection, document.collection);
        assert_eq!(again.objects.len(), 2);
        assert_eq!(again.objects[1].parent.as_deref(), Some("Arm.0001"));
        assert_eq!(again.meshes[0].name, "ArmMesh");
    }

    #[test]
    fn unknown_references_are_rejected() {
        let bad_parent = HERO.replace(r#"parent: Some("Arm.0001")"#, r#"parent: Some("Nope")"#);
        assert!(matches!(
            SceneDocument::from_ron(&bad_parent).unwrap().into_scene(),
            Err(Error::UnknownObject(name)) if name == "Nope"
        ));

        let bad_mesh = HERO.replace(r#"mesh: Some("ArmMesh")"#, r#"mesh: Some("Nope")"#);
        assert!(matches!(
            SceneDocument::from_ron(&bad_mesh).unwrap().into_scene(),
            Err(Error::InvalidScene(_))
        ));
    }

    #[test]
    fn duplicate_collection_names_are_rejected() {
        let duplicated = HERO.replace("Hero.draft_parts", "Hero.draft");
        assert!(matches!(
            SceneDocument::from_ron(&duplicated).unwrap().into_scene(),
            Err(Error::InvalidScene(_))
        ));
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hero.ron");
        let scene = SceneDocument::from_ron(HERO).unwrap().into_scene().unwrap();

        save_scene(&scene, &path).unwrap();
        let loaded = load_scene(&path).unwrap();

        assert_eq!(loaded.objects.len(), 2);
        assert!(loaded.get_collection_by_name("Hero.draft_parts").is_some());
    }
}
