pub mod collection;
pub mod collection_index;
pub mod object3d;
pub mod scene;
pub mod scene_model;
pub mod transform;

// Re-export main types for convenience
pub use collection::{Collection, CollectionId};
pub use collection_index::CollectionParentIndex;
pub use object3d::{Object3D, ObjectId};
pub use scene::{Scene, MASTER_COLLECTION_NAME};
pub use scene_model::{SceneModel, SceneModelId};
pub use transform::Transform;
