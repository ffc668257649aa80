use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Buffers, Model};
use crate::naming::unique_name;
use crate::scene_graph::collection::{Collection, CollectionId};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

pub const MASTER_COLLECTION_NAME: &str = "Scene Collection";

/// Objects, meshes and the collection tree rooted at the master collection.
///
/// Object names and collection names are unique; creating something under a
/// taken name appends the first free `.NNN` suffix.
pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    pub collections: Arena<Collection>,
    master_collection: CollectionId,
}

impl Scene {
    pub fn new() -> Self {
        let mut collections = Arena::new();
        let master_collection = collections.alloc(Collection::new(MASTER_COLLECTION_NAME));

        Self {
            objects: Arena::new(),
            models: Arena::new(),
            collections,
            master_collection,
        }
    }

    pub fn master_collection(&self) -> CollectionId {
        self.master_collection
    }

    pub fn add_object(&mut self, mut object: Object3D) -> ObjectId {
        object.name = self.unique_object_name(&object.name);
        let parent_id = object.parent_id;
        let object_id = self.objects.alloc(object);

        if let Some(parent) = parent_id.and_then(|id| self.objects.get_mut(id)) {
            parent.child_ids.push(object_id);
        }

        object_id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object3D> {
        self.objects
            .get(id)
            .ok_or_else(|| Error::UnknownObject(format!("{:?}", id)))
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    fn unique_object_name(&self, name: &str) -> String {
        unique_name(name, |candidate| self.get_object_by_name(candidate).is_some())
    }

    /// Renames an object, returning the name it actually received.
    pub fn rename_object(&mut self, object_id: ObjectId, name: &str) -> Result<String> {
        let current = self.object(object_id)?;
        if current.name == name {
            return Ok(current.name.clone());
        }

        let name = self.unique_object_name(name);
        if let Some(object) = self.objects.get_mut(object_id) {
            object.name = name.clone();
        }

        Ok(name)
    }

    /// Shallow copy: new identity, same transform, mesh and parent. The copy
    /// is not linked into any collection and has no children.
    pub fn copy_object(&mut self, object_id: ObjectId) -> Result<ObjectId> {
        let source = self.object(object_id)?;
        let copy = Object3D {
            name: source.name.clone(),
            transform: source.transform,
            model_id: source.model_id,
            parent_id: source.parent_id,
            child_ids: Vec::new(),
            selected: false,
        };

        Ok(self.add_object(copy))
    }

    pub fn add_model(&mut self, mut model: SceneModel) -> SceneModelId {
        model.name = unique_name(&model.name, |candidate| {
            self.get_model_by_name(candidate).is_some()
        });
        model.model.name = model.name.clone();
        self.models.alloc(model)
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&SceneModel> {
        self.models.get(id)
    }

    pub fn get_model_mut(&mut self, id: SceneModelId) -> Option<&mut SceneModel> {
        self.models.get_mut(id)
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<SceneModelId> {
        self.models
            .iter()
            .find(|(_, model)| model.name == name)
            .map(|(id, _)| id)
    }

    /// Number of objects referencing the model.
    pub fn model_users(&self, model_id: SceneModelId) -> usize {
        self.objects
            .iter()
            .filter(|(_, object)| object.model_id == Some(model_id))
            .count()
    }

    /// Gives the object its own copy of its mesh if the mesh is shared.
    pub fn make_model_single_user(&mut self, object_id: ObjectId) -> Result<Option<SceneModelId>> {
        let Some(model_id) = self.object(object_id)?.model_id else {
            return Ok(None);
        };

        if self.model_users(model_id) <= 1 {
            return Ok(Some(model_id));
        }

        let source = self
            .models
            .get(model_id)
            .ok_or_else(|| Error::InvalidScene(format!("dangling mesh reference {:?}", model_id)))?;
        let scene_model = SceneModel::new(source.name.clone(), source.model.clone());
        let new_model_id = self.add_model(scene_model);
        if let Some(object) = self.objects.get_mut(object_id) {
            object.model_id = Some(new_model_id);
        }

        log::debug!(
            "Mesh {:?} is shared, gave {:?} a single-user copy",
            model_id,
            object_id
        );

        Ok(Some(new_model_id))
    }

    /// Creates an unlinked collection.
    pub fn new_collection(&mut self, name: &str) -> CollectionId {
        let name = unique_name(name, |candidate| {
            self.get_collection_by_name(candidate).is_some()
        });
        self.collections.alloc(Collection::new(name))
    }

    pub fn get_collection(&self, id: CollectionId) -> Option<&Collection> {
        self.collections.get(id)
    }

    pub fn get_collection_mut(&mut self, id: CollectionId) -> Option<&mut Collection> {
        self.collections.get_mut(id)
    }

    pub fn collection(&self, id: CollectionId) -> Result<&Collection> {
        self.collections
            .get(id)
            .ok_or_else(|| Error::UnknownCollection(format!("{:?}", id)))
    }

    pub fn get_collection_by_name(&self, name: &str) -> Option<CollectionId> {
        self.collections
            .iter()
            .find(|(_, collection)| collection.name == name)
            .map(|(id, _)| id)
    }

    pub fn link_collection(&mut self, parent_id: CollectionId, child_id: CollectionId) -> Result<()> {
        self.collection(child_id)?;
        if parent_id == child_id || self.collection_contains(child_id, parent_id) {
            return Err(Error::InvalidScene(format!(
                "linking {} under {} would create a cycle",
                self.collections[child_id].name, self.collections[parent_id].name
            )));
        }

        let parent = self
            .collections
            .get_mut(parent_id)
            .ok_or_else(|| Error::UnknownCollection(format!("{:?}", parent_id)))?;
        if !parent.child_ids.contains(&child_id) {
            parent.child_ids.push(child_id);
        }

        Ok(())
    }

    pub fn link_object(&mut self, collection_id: CollectionId, object_id: ObjectId) -> Result<()> {
        self.object(object_id)?;
        let collection = self
            .collections
            .get_mut(collection_id)
            .ok_or_else(|| Error::UnknownCollection(format!("{:?}", collection_id)))?;
        if !collection.contains_object(object_id) {
            collection.object_ids.push(object_id);
        }

        Ok(())
    }

    /// Whether `descendant` is `ancestor` or nested anywhere below it.
    fn collection_contains(&self, ancestor: CollectionId, descendant: CollectionId) -> bool {
        if ancestor == descendant {
            return true;
        }

        self.collections
            .get(ancestor)
            .map(|collection| {
                collection
                    .child_ids
                    .iter()
                    .any(|&child| self.collection_contains(child, descendant))
            })
            .unwrap_or(false)
    }

    /// Every collection of the tree rooted at `collection_id`, pre-order.
    pub fn collection_tree(&self, collection_id: CollectionId) -> Vec<CollectionId> {
        let mut tree = Vec::new();
        self.collect_collection_tree(collection_id, &mut tree);
        tree
    }

    fn collect_collection_tree(&self, collection_id: CollectionId, tree: &mut Vec<CollectionId>) {
        if let Some(collection) = self.collections.get(collection_id) {
            tree.push(collection_id);
            for &child_id in &collection.child_ids {
                self.collect_collection_tree(child_id, tree);
            }
        }
    }

    /// Objects of the collection and all nested collections, each once.
    pub fn all_objects(&self, collection_id: CollectionId) -> Vec<ObjectId> {
        let mut seen = HashSet::new();
        self.collection_tree(collection_id)
            .into_iter()
            .filter_map(|id| self.collections.get(id))
            .flat_map(|collection| collection.object_ids.iter().copied())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// World matrix computed through the parent chain.
    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(object_id);

        while let Some(object) = current.and_then(|id| self.objects.get(id)) {
            matrix = object.transform.local_matrix() * matrix;
            current = object.parent_id;
        }

        matrix
    }

    /// Sets the local transform so that the object ends up at `world_matrix`.
    pub fn set_world_matrix(&mut self, object_id: ObjectId, world_matrix: Mat4) {
        let parent_world = self
            .objects
            .get(object_id)
            .and_then(|object| object.parent_id)
            .map(|parent_id| self.world_matrix(parent_id))
            .unwrap_or(Mat4::IDENTITY);

        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform = Transform::from_matrix(parent_world.inverse() * world_matrix);
        }
    }

    /// Sets the parent of an object and updates child relationships. The
    /// local transform is kept, so the world placement may change.
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) -> Result<()> {
        self.object(child_id)?;

        if let Some(new_parent_id) = new_parent_id {
            self.object(new_parent_id)?;
            if self.is_object_ancestor(child_id, new_parent_id) {
                return Err(Error::InvalidScene(format!(
                    "parenting {} to {} would create a cycle",
                    self.objects[child_id].name, self.objects[new_parent_id].name
                )));
            }
        }

        // Remove from old parent's children list
        if let Some(old_parent_id) = self.objects[child_id].parent_id {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        // Set new parent and add to new parent's children list
        self.objects[child_id].parent_id = new_parent_id;
        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        Ok(())
    }

    fn is_object_ancestor(&self, ancestor: ObjectId, object_id: ObjectId) -> bool {
        let mut current = Some(object_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.objects.get(id).and_then(|object| object.parent_id);
        }
        false
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
    }

    pub fn deselect_all(&mut self) {
        for (_, object) in self.objects.iter_mut() {
            object.selected = false;
        }
    }

    pub fn select(&mut self, object_ids: &[ObjectId]) {
        for &id in object_ids {
            if let Some(object) = self.objects.get_mut(id) {
                object.selected = true;
            }
        }
    }

    pub fn selected_objects(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, object)| object.selected)
            .map(|(id, _)| id)
            .collect()
    }

    /// Imports the default scene of a glTF file, linking every node into
    /// `collection_id`. Returns the ids of the root nodes.
    pub fn spawn_gltf_file(&mut self, path: &Path, collection_id: CollectionId) -> Result<Vec<ObjectId>> {
        self.collection(collection_id)?;

        let (document, buffers, _images) = gltf::import(path)?;
        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| Error::InvalidScene(format!("No scenes in {}", path.display())))?;

        let mut mesh_to_model = HashMap::new();
        let mut root_ids = Vec::new();

        for node in gltf_scene.nodes() {
            root_ids.push(self.spawn_gltf_node(
                &buffers,
                &node,
                None,
                collection_id,
                &mut mesh_to_model,
            )?);
        }

        log::info!(
            "Imported {} root node(s) from {} into {}",
            root_ids.len(),
            path.display(),
            self.collections[collection_id].name
        );

        Ok(root_ids)
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        collection_id: CollectionId,
        mesh_to_model: &mut HashMap<usize, SceneModelId>,
    ) -> Result<ObjectId> {
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut object = Object3D::new(node_name.clone()).with_transform(Transform::new(
            translation.into(),
            Quat::from_array(rotation),
            scale.into(),
        ));

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name.clone(), mesh, buffers)?;
                    let model_id = self.add_model(SceneModel::new(mesh_name, model));
                    mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            object = object.with_model(model_id);
        }

        let object_id = self.add_object(object);
        self.link_object(collection_id, object_id)?;

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id))?;
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id), collection_id, mesh_to_model)?;
        }

        Ok(object_id)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
