//! Error types for uddon

use thiserror::Error;

/// Main error type for scene, duplication and export operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Unknown object: {0}")]
    UnknownObject(String),

    #[error("Object name '{name}' does not end in a 4-character numeric disambiguator")]
    MissingDisambiguator { name: String },

    #[error("Parent '{parent}' of object '{object}' is not part of the duplicated hierarchy")]
    UnmappedParent { object: String, parent: String },

    #[error("Failed to generate tangents for mesh '{0}'")]
    Tangents(String),
}

/// Result type alias for uddon operations
pub type Result<T> = std::result::Result<T, Error>;
