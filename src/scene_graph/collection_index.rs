use std::collections::HashMap;

use crate::scene_graph::collection::CollectionId;
use crate::scene_graph::scene::Scene;

/// Collection → parent collection lookup, built from the children lists.
///
/// The index is a snapshot: collections linked after [`build`](Self::build)
/// are not in it.
#[derive(Debug, Default)]
pub struct CollectionParentIndex {
    parents: HashMap<CollectionId, CollectionId>,
}

impl CollectionParentIndex {
    pub fn build(scene: &Scene) -> Self {
        let parents = scene
            .collections
            .iter()
            .flat_map(|(parent_id, collection)| {
                collection
                    .child_ids
                    .iter()
                    .map(move |&child_id| (child_id, parent_id))
            })
            .collect();

        Self { parents }
    }

    pub fn parent_of(&self, collection_id: CollectionId) -> Option<CollectionId> {
        self.parents.get(&collection_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_parents_and_roots() {
        let mut scene = Scene::new();
        let master = scene.master_collection();
        let hero = scene.new_collection("Hero.draft");
        let parts = scene.new_collection("Hero.draft_parts");
        let orphan = scene.new_collection("Orphan");
        scene.link_collection(master, hero).unwrap();
        scene.link_collection(hero, parts).unwrap();

        let index = CollectionParentIndex::build(&scene);

        assert_eq!(index.parent_of(hero), Some(master));
        assert_eq!(index.parent_of(parts), Some(hero));
        assert_eq!(index.parent_of(master), None);
        assert_eq!(index.parent_of(orphan), None);
    }
}
