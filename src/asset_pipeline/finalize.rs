//! Mesh finalization run on a selection of objects before export.

use glam::Mat4;

use crate::error::{Error, Result};
use crate::scene_graph::{ObjectId, Scene};

fn depth(scene: &Scene, object_id: ObjectId) -> usize {
    std::iter::successors(Some(object_id), |&id| {
        scene.get_object(id).and_then(|object| object.parent_id)
    })
    .count()
}

/// Bakes each object's scale into its mesh and resets the scale to one.
/// Children are compensated to keep their world placement. A rotated child of
/// a non-uniformly scaled parent would need shear, which a [`Transform`]
/// cannot hold: it keeps its world position but its world matrix changes, and
/// a warning is logged. Shared meshes are split first. Returns the number of
/// objects that had a non-unit scale.
///
/// [`Transform`]: crate::scene_graph::Transform
pub fn apply_scale(scene: &mut Scene, object_ids: &[ObjectId]) -> Result<usize> {
    let mut ordered = object_ids.to_vec();
    ordered.sort_by_cached_key(|&id| depth(scene, id));

    let mut applied = 0;

    for object_id in ordered {
        let object = scene.object(object_id)?;
        if object.transform.has_unit_scale() {
            continue;
        }

        let scale = object.transform.scale();
        let children = object
            .child_ids
            .iter()
            .map(|&child_id| (child_id, scene.world_matrix(child_id)))
            .collect::<Vec<_>>();

        if let Some(model_id) = scene.make_model_single_user(object_id)? {
            let scene_model = scene.get_model_mut(model_id).ok_or_else(|| {
                Error::InvalidScene(format!("dangling mesh reference {:?}", model_id))
            })?;
            scene_model.model.bake_matrix(Mat4::from_scale(scale));
        }

        if let Some(object) = scene.get_object_mut(object_id) {
            object.transform.set_scale(glam::Vec3::ONE);
            log::debug!("Applied scale {} to {}", scale, object.name);
        }

        for (child_id, world_matrix) in children {
            scene.set_world_matrix(child_id, world_matrix);
            if !scene.world_matrix(child_id).abs_diff_eq(world_matrix, 1e-4) {
                log::warn!(
                    "{} needs shear to stay in place after applying scale {}, its world transform changed",
                    scene.objects[child_id].name,
                    scale
                );
            }
        }

        applied += 1;
    }

    Ok(applied)
}

/// Smooth-shades the meshes of the given objects. Shared meshes are split
/// first. Returns the number of meshes smoothed.
pub fn shade_smooth(scene: &mut Scene, object_ids: &[ObjectId]) -> Result<usize> {
    let mut smoothed = 0;

    for &object_id in object_ids {
        let Some(model_id) = scene.make_model_single_user(object_id)? else {
            continue;
        };

        let scene_model = scene.get_model_mut(model_id).ok_or_else(|| {
            Error::InvalidScene(format!("dangling mesh reference {:?}", model_id))
        })?;
        scene_model.model.shade_smooth()?;
        smoothed += 1;
    }

    Ok(smoothed)
}

/// Human-readable notes about objects that would need finalization.
pub fn finalization_warnings(scene: &Scene, object_ids: &[ObjectId]) -> Vec<String> {
    let mut warnings = Vec::new();

    for &object_id in object_ids {
        let Some(object) = scene.get_object(object_id) else {
            continue;
        };

        if !object.transform.has_unit_scale() {
            warnings.push(format!(
                "{} has scale {}, not applied",
                object.name,
                object.transform.scale()
            ));
        }

        if let Some(scene_model) = object.model_id.and_then(|id| scene.get_model(id)) {
            if !scene_model.model.smooth {
                warnings.push(format!(
                    "{} uses flat shaded mesh {}",
                    object.name, scene_model.name
                ));
            }
        }
    }

    warnings
}
