use id_arena::Id;

use crate::scene_graph::object3d::ObjectId;

pub type CollectionId = Id<Collection>;

/// Named grouping of objects and child collections.
///
/// Collections only know their children; the parent of a collection is
/// resolved through [`CollectionParentIndex`](crate::scene_graph::CollectionParentIndex).
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub name: String,
    pub object_ids: Vec<ObjectId>,
    pub child_ids: Vec<CollectionId>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_ids: Vec::new(),
            child_ids: Vec::new(),
        }
    }

    pub fn contains_object(&self, object_id: ObjectId) -> bool {
        self.object_ids.contains(&object_id)
    }
}
