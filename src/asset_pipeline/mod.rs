pub mod bake_transform;
pub mod finalize;
pub mod generate_tangents;
pub mod smooth_normals;

pub use finalize::{apply_scale, finalization_warnings, shade_smooth};
