//! Draft → low-poly/high-poly variants of collection hierarchies, mesh
//! finalization and export.

pub mod asset_pipeline;
pub mod duplicate;
pub mod error;
pub mod export;
pub mod model;
pub mod naming;
pub mod operators;
pub mod preferences;
pub mod scene_file;
pub mod scene_graph;

pub use duplicate::{duplicate_collection, DuplicateOptions, DuplicationReport, UnmappedParentPolicy};
pub use error::{Error, Result};
pub use export::{Exporter, ObjExporter};
pub use operators::{Operator, OperatorContext, Report, ReportLevel};
pub use preferences::Preferences;
pub use scene_graph::Scene;
