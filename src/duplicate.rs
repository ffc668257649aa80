//! Duplication of a collection hierarchy into a renamed sibling tree.
//!
//! The source tree is read and validated in full before the scene is touched.
//! After that the copy runs to completion: collections and objects are created
//! pre-order, depth-first, and object parents are re-wired in one final pass
//! through the original → copy map.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::naming::{derived_collection_name, derived_object_name};
use crate::scene_graph::{CollectionId, CollectionParentIndex, ObjectId, Scene};

/// What re-wiring does with a copy whose original parent was not duplicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnmappedParentPolicy {
    /// Leave the copy attached to the original's parent.
    #[default]
    Keep,
    /// Refuse to duplicate; detected before anything is created.
    Fail,
}

#[derive(Debug, Clone)]
pub struct DuplicateOptions<'a> {
    pub draft_suffix: &'a str,
    pub target_suffix: &'a str,
    pub unmapped_parent: UnmappedParentPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicationReport {
    pub root: CollectionId,
    pub collections_created: usize,
    pub objects_created: usize,
    pub reparented: usize,
    pub kept_external_parent: usize,
}

/// Source object → duplicate, in insertion order.
#[derive(Debug, Default)]
pub(crate) struct OriginalCopyMap {
    pairs: Vec<(ObjectId, ObjectId)>,
    lookup: HashMap<ObjectId, ObjectId>,
}

impl OriginalCopyMap {
    pub fn insert(&mut self, original: ObjectId, copy: ObjectId) {
        if let Entry::Vacant(entry) = self.lookup.entry(original) {
            entry.insert(copy);
            self.pairs.push((original, copy));
        }
    }

    pub fn get(&self, original: ObjectId) -> Option<ObjectId> {
        self.lookup.get(&original).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, ObjectId)> + '_ {
        self.pairs.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }
}

/// Snapshot of one source collection with its derived names resolved.
#[derive(Debug)]
struct PlannedCollection {
    name: String,
    objects: Vec<(ObjectId, String)>,
    children: Vec<PlannedCollection>,
}

impl PlannedCollection {
    fn count(&self) -> usize {
        1 + self.children.iter().map(PlannedCollection::count).sum::<usize>()
    }

    fn object_ids(&self, ids: &mut Vec<ObjectId>) {
        ids.extend(self.objects.iter().map(|(id, _)| *id));
        for child in &self.children {
            child.object_ids(ids);
        }
    }
}

fn plan_collection(
    scene: &Scene,
    collection_id: CollectionId,
    options: &DuplicateOptions,
) -> Result<PlannedCollection> {
    let collection = scene.collection(collection_id)?;

    let objects = collection
        .object_ids
        .iter()
        .map(|&object_id| {
            let object = scene.object(object_id)?;
            Ok((object_id, derived_object_name(&object.name, options.target_suffix)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let children = collection
        .child_ids
        .iter()
        .map(|&child_id| plan_collection(scene, child_id, options))
        .collect::<Result<Vec<_>>>()?;

    Ok(PlannedCollection {
        name: collection.name.clone(),
        objects,
        children,
    })
}

fn check_parents_are_duplicated(scene: &Scene, plan: &PlannedCollection) -> Result<()> {
    let mut object_ids = Vec::new();
    plan.object_ids(&mut object_ids);
    let duplicated: HashSet<ObjectId> = object_ids.iter().copied().collect();

    for object_id in object_ids {
        let object = scene.object(object_id)?;
        if let Some(parent_id) = object.parent_id {
            if !duplicated.contains(&parent_id) {
                return Err(Error::UnmappedParent {
                    object: object.name.clone(),
                    parent: scene.object(parent_id)?.name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Duplicates `source` and everything below it into a new collection named
/// after the source's base name plus the target suffix. The new collection is
/// linked next to `source`, or under `master` when `source` has no parent.
pub fn duplicate_collection(
    scene: &mut Scene,
    source: CollectionId,
    master: CollectionId,
    options: &DuplicateOptions,
) -> Result<DuplicationReport> {
    let plan = plan_collection(scene, source, options)?;
    if options.unmapped_parent == UnmappedParentPolicy::Fail {
        check_parents_are_duplicated(scene, &plan)?;
    }
    scene.collection(master)?;

    log::info!(
        "Duplicating collection {} ({} collection(s)) with suffix {}",
        plan.name,
        plan.count(),
        options.target_suffix
    );

    let parent_index = CollectionParentIndex::build(scene);
    let parent = parent_index.parent_of(source).unwrap_or(master);

    let root = scene.new_collection(&derived_collection_name(
        &plan.name,
        options.draft_suffix,
        options.target_suffix,
    ));
    scene.link_collection(parent, root)?;

    let mut map = OriginalCopyMap::default();
    duplicate_objects_of_level(scene, &mut map, &plan, root)?;
    duplicate_subtree(scene, &mut map, &plan, root, options)?;

    let rewired = rewire_parents(scene, &map, options.unmapped_parent)?;

    let report = DuplicationReport {
        root,
        collections_created: plan.count(),
        objects_created: map.len(),
        reparented: rewired.reparented,
        kept_external_parent: rewired.kept_external_parent,
    };

    log::info!(
        "Created {} with {} collection(s) and {} object(s)",
        scene.collections[root].name,
        report.collections_created,
        report.objects_created
    );

    Ok(report)
}

/// Copies the objects directly in `source` into `dest`. An object already
/// copied earlier in this operation is linked again instead of copied twice.
fn duplicate_objects_of_level(
    scene: &mut Scene,
    map: &mut OriginalCopyMap,
    source: &PlannedCollection,
    dest: CollectionId,
) -> Result<()> {
    for (original, name) in &source.objects {
        let copy = match map.get(*original) {
            Some(copy) => copy,
            None => {
                let copy = scene.copy_object(*original)?;
                let name = scene.rename_object(copy, name)?;
                log::debug!("{} -> {}", scene.objects[*original].name, name);
                map.insert(*original, copy);
                copy
            }
        };

        scene.link_object(dest, copy)?;
    }

    Ok(())
}

fn duplicate_subtree(
    scene: &mut Scene,
    map: &mut OriginalCopyMap,
    source: &PlannedCollection,
    dest: CollectionId,
    options: &DuplicateOptions,
) -> Result<()> {
    for child in &source.children {
        let collection = scene.new_collection(&derived_collection_name(
            &child.name,
            options.draft_suffix,
            options.target_suffix,
        ));
        scene.link_collection(dest, collection)?;

        duplicate_objects_of_level(scene, map, child, collection)?;

        duplicate_subtree(scene, map, child, collection, options)?;
    }

    Ok(())
}

#[derive(Debug, Default)]
struct RewireCounts {
    reparented: usize,
    kept_external_parent: usize,
}

/// Points every copy at the copy of its original's parent, keeping the
/// copy's world placement.
fn rewire_parents(
    scene: &mut Scene,
    map: &OriginalCopyMap,
    policy: UnmappedParentPolicy,
) -> Result<RewireCounts> {
    let mut counts = RewireCounts::default();

    for (original, copy) in map.iter() {
        let Some(original_parent) = scene.object(original)?.parent_id else {
            continue;
        };

        match map.get(original_parent) {
            Some(parent_copy) => {
                let saved_world = scene.world_matrix(copy);
                scene.set_object_parent(copy, Some(parent_copy))?;
                scene.set_world_matrix(copy, saved_world);
                counts.reparented += 1;
            }
            None => {
                let object = scene.objects[copy].name.clone();
                let parent = scene.objects[original_parent].name.clone();
                match policy {
                    UnmappedParentPolicy::Keep => {
                        log::warn!(
                            "Parent {} of {} was not duplicated, keeping it as parent",
                            parent,
                            object
                        );
                        counts.kept_external_parent += 1;
                    }
                    UnmappedParentPolicy::Fail => {
                        return Err(Error::UnmappedParent { object, parent });
                    }
                }
            }
        }
    }

    Ok(counts)
}
