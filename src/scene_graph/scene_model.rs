use id_arena::Id;

use crate::model::Model;

pub type SceneModelId = Id<SceneModel>;

#[derive(Debug, Clone)]
pub struct SceneModel {
    pub name: String,
    pub model: Model,
}

impl SceneModel {
    pub fn new(name: String, model: Model) -> Self {
        Self { name, model }
    }
}
