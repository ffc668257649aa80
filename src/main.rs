use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use uddon::scene_file::{load_scene, save_scene};
use uddon::scene_graph::{CollectionId, Scene};
use uddon::{ObjExporter, Operator, OperatorContext, Preferences, ReportLevel};

#[derive(Parser)]
#[command(name = "uddon", version, about = "Create LP/HP collections, prepare and export them")]
struct Cli {
    /// Scene file (RON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Preferences file (RON); defaults are used if it does not exist
    #[arg(short, long, default_value = "uddon.ron")]
    prefs: PathBuf,

    /// Active collection; the master collection if omitted
    #[arg(short, long)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Duplicate the active collection as a low-poly variant
    CreateLp,
    /// Duplicate the active collection as a high-poly variant
    CreateHp,
    /// Apply scale and shade smooth on the active collection
    Prepare,
    /// Export the active collection
    Export,
    /// Prepare, then export the active collection
    PrepareExport,
    /// Import the default scene of a glTF file into the active collection
    Import { gltf: PathBuf },
    /// Print the collection tree
    Tree,
}

fn resolve_collection(scene: &Scene, name: Option<&str>) -> Result<CollectionId> {
    match name {
        Some(name) => scene
            .get_collection_by_name(name)
            .with_context(|| format!("No collection named {}", name)),
        None => Ok(scene.master_collection()),
    }
}

fn print_tree(scene: &Scene, collection_id: CollectionId, depth: usize) {
    let collection = &scene.collections[collection_id];
    println!("{}{}/", "  ".repeat(depth), collection.name);

    for &object_id in &collection.object_ids {
        let object = &scene.objects[object_id];
        match object.parent(scene) {
            Some(parent) => println!("{}{} (parent: {})", "  ".repeat(depth + 1), object.name, parent.name),
            None => println!("{}{}", "  ".repeat(depth + 1), object.name),
        }
    }

    for &child_id in &collection.child_ids {
        print_tree(scene, child_id, depth + 1);
    }
}

fn run_operator(
    operator: Operator,
    scene: &mut Scene,
    collection: CollectionId,
    preferences: &Preferences,
    scene_path: &Path,
) -> Result<()> {
    let exporter = ObjExporter;
    let mut context = OperatorContext {
        scene,
        collection: Some(collection),
        preferences,
        exporter: &exporter,
    };

    let reports = operator
        .execute(&mut context)
        .with_context(|| format!("{} failed", operator.label()))?;

    let mut failed = false;
    for report in &reports {
        match report.level {
            ReportLevel::Info => log::info!("{}", report.message),
            ReportLevel::Warning => log::warn!("{}", report.message),
            ReportLevel::Error => {
                log::error!("{}", report.message);
                failed = true;
            }
        }
        println!("{}", report);
    }

    if failed {
        bail!("{} did not finish", operator.label());
    }

    if matches!(
        operator,
        Operator::CreateLp | Operator::CreateHp | Operator::Prepare | Operator::PrepareAndExport
    ) {
        save_scene(context.scene, scene_path)
            .with_context(|| format!("Failed to save {}", scene_path.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    let preferences = Preferences::load(&cli.prefs)
        .with_context(|| format!("Failed to read preferences {}", cli.prefs.display()))?;
    let mut scene = load_scene(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    let collection = resolve_collection(&scene, cli.collection.as_deref())?;

    let operator = match cli.command {
        Command::CreateLp => Operator::CreateLp,
        Command::CreateHp => Operator::CreateHp,
        Command::Prepare => Operator::Prepare,
        Command::Export => Operator::Export,
        Command::PrepareExport => Operator::PrepareAndExport,
        Command::Import { gltf } => {
            scene
                .spawn_gltf_file(&gltf, collection)
                .with_context(|| format!("Failed to import {}", gltf.display()))?;
            save_scene(&scene, &cli.scene)?;
            return Ok(());
        }
        Command::Tree => {
            print_tree(&scene, scene.master_collection(), 0);
            return Ok(());
        }
    };

    run_operator(operator, &mut scene, collection, &preferences, &cli.scene)
}
