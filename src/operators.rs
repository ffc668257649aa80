//! User-facing actions on the active collection.
//!
//! Validation problems are returned as [`Report`]s with [`ReportLevel::Error`]
//! and leave the scene unchanged. Everything else that goes wrong is an
//! [`Error`](crate::error::Error).

use std::fmt;

use crate::asset_pipeline::{apply_scale, finalization_warnings, shade_smooth};
use crate::duplicate::{duplicate_collection, DuplicateOptions};
use crate::error::Result;
use crate::export::{export_file_path, ExportRequest, Exporter};
use crate::preferences::Preferences;
use crate::scene_graph::{CollectionId, ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub level: ReportLevel,
    pub message: String,
}

impl Report {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == ReportLevel::Error
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            ReportLevel::Info => "info",
            ReportLevel::Warning => "warning",
            ReportLevel::Error => "error",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

pub const EXPORT_PATH_NOT_SET: &str = "Fbx export path is not set! Set export_path in the preferences";
pub const NO_COLLECTION_SELECTED: &str = "Please select collection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    PrepareAndExport,
    Prepare,
    Export,
    CreateLp,
    CreateHp,
}

impl Operator {
    pub fn label(&self) -> &'static str {
        match self {
            Operator::PrepareAndExport => "Prepare & Export collection",
            Operator::Prepare => "Prepare collection",
            Operator::Export => "Export collection",
            Operator::CreateLp => "Create LP collection",
            Operator::CreateHp => "Create HP collection",
        }
    }

    pub fn execute(&self, context: &mut OperatorContext) -> Result<Vec<Report>> {
        log::info!("{}", self.label());
        let preferences = context.preferences;

        match self {
            Operator::PrepareAndExport => {
                let mut reports = prepare_collection(context)?;
                if !reports.iter().any(Report::is_error) {
                    reports.extend(export_collection(context)?);
                }
                Ok(reports)
            }
            Operator::Prepare => prepare_collection(context),
            Operator::Export => export_collection(context),
            Operator::CreateLp => create_variant(context, &preferences.suffix_lp),
            Operator::CreateHp => create_variant(context, &preferences.suffix_hp),
        }
    }
}

pub struct OperatorContext<'a> {
    pub scene: &'a mut Scene,
    /// The active collection; `None` when nothing is selected.
    pub collection: Option<CollectionId>,
    pub preferences: &'a Preferences,
    pub exporter: &'a dyn Exporter,
}

/// Selects every object of the collection tree, deselecting everything else.
fn select_collection_objects(scene: &mut Scene, collection_id: CollectionId) -> Vec<ObjectId> {
    let objects = scene.all_objects(collection_id);
    scene.deselect_all();
    scene.select(&objects);
    objects
}

fn prepare_collection(context: &mut OperatorContext) -> Result<Vec<Report>> {
    let Some(collection_id) = context.collection else {
        return Ok(vec![Report::error(NO_COLLECTION_SELECTED)]);
    };
    let preferences = context.preferences;
    let mut reports = Vec::new();

    if !preferences.apply_on_export {
        let objects = context.scene.all_objects(collection_id);
        for warning in finalization_warnings(context.scene, &objects) {
            log::warn!("{}", warning);
            reports.push(Report::warning(warning));
        }
        return Ok(reports);
    }

    let objects = select_collection_objects(context.scene, collection_id);

    if preferences.apply_scaling {
        let applied = apply_scale(context.scene, &objects)?;
        reports.push(Report::info(format!("Applied scale on {} object(s)", applied)));
    }
    if preferences.apply_smoothing {
        let smoothed = shade_smooth(context.scene, &objects)?;
        reports.push(Report::info(format!("Smoothed {} mesh(es)", smoothed)));
    }

    Ok(reports)
}

fn export_collection(context: &mut OperatorContext) -> Result<Vec<Report>> {
    let preferences = context.preferences;
    if preferences.export_path.is_empty() {
        return Ok(vec![Report::error(EXPORT_PATH_NOT_SET)]);
    }

    let Some(collection_id) = context.collection else {
        return Ok(vec![Report::error(NO_COLLECTION_SELECTED)]);
    };
    let name = context.scene.collection(collection_id)?.name.clone();
    if name.is_empty() {
        return Ok(vec![Report::error(NO_COLLECTION_SELECTED)]);
    }

    let path = export_file_path(&preferences.export_path, &name, context.exporter.extension());
    let objects = select_collection_objects(context.scene, collection_id);

    log::info!("Exporting to filepath = {}", path.display());

    let request = ExportRequest {
        path,
        objects,
        use_selection: true,
        use_active_collection: true,
    };
    context.exporter.export(context.scene, &request)?;

    Ok(vec![Report::info(format!(
        "Exported {} to {}",
        name,
        request.path.display()
    ))])
}

fn create_variant(context: &mut OperatorContext, target_suffix: &str) -> Result<Vec<Report>> {
    let Some(collection_id) = context.collection else {
        return Ok(vec![Report::error(NO_COLLECTION_SELECTED)]);
    };
    let preferences = context.preferences;

    let options = DuplicateOptions {
        draft_suffix: &preferences.suffix_draft,
        target_suffix,
        unmapped_parent: preferences.unmapped_parent,
    };
    let master = context.scene.master_collection();
    let report = duplicate_collection(context.scene, collection_id, master, &options)?;

    let mut reports = vec![Report::info(format!(
        "Created {} with {} collection(s) and {} object(s)",
        context.scene.collections[report.root].name,
        report.collections_created,
        report.objects_created
    ))];
    if report.kept_external_parent > 0 {
        reports.push(Report::warning(format!(
            "{} object(s) kept a parent outside the duplicated hierarchy",
            report.kept_external_parent
        )));
    }

    Ok(reports)
}
