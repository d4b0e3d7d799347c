use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use glam::Mat4;
use kinema_model::{
    AnimatedModel, BoneMatrices, PlaybackState, TransformEvaluator, scene::SceneRoot,
};
use log::info;

#[cfg(feature = "tracing")]
use tracing_subscriber::prelude::*;

/// Print the node hierarchy, animations and skinning matrices for a scene.
#[derive(Parser)]
#[command(author, version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// The JSON scene file.
    input: PathBuf,
    /// The name of the animation to sample. Defaults to the first animation.
    #[arg(long)]
    clip: Option<String>,
    /// The animation time in ticks. Can be specified multiple times.
    #[arg(long)]
    time: Vec<f32>,
    /// Print each node with its local transform and meshes.
    #[arg(long)]
    tree: bool,
    /// Print debug logs.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(not(feature = "tracing"))]
    simple_logger::SimpleLogger::new()
        .with_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init()?;

    #[cfg(feature = "tracing")]
    tracing::subscriber::set_global_default(
        tracing_subscriber::registry().with(tracing_tracy::TracyLayer::default()),
    )?;

    let start = std::time::Instant::now();

    let json = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {:?}", cli.input))?;
    let scene: SceneRoot = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse scene {:?}", cli.input))?;
    let model = AnimatedModel::from_scene(&scene)
        .with_context(|| format!("failed to load model from {:?}", cli.input))?;

    info!("Load model: {:?}", start.elapsed());

    print_summary(&model);

    if cli.tree {
        println!();
        print!("{}", model.hierarchy.dump_tree());
    }

    if !cli.time.is_empty() {
        let clip_index = match &cli.clip {
            Some(name) => model
                .clip_index(name)
                .ok_or_else(|| anyhow!("no animation named {name:?}"))?,
            None => 0,
        };
        print_animation(&model, clip_index, &cli.time)?;
    }

    Ok(())
}

fn print_summary(model: &AnimatedModel) {
    println!("Nodes: {}", model.hierarchy.len());

    println!("Animations: {}", model.clips.len());
    for (i, clip) in model.clips.iter().enumerate() {
        println!(
            "  {i}: {:?} duration: {}, ticks per second: {}, channels: {}",
            clip.name,
            clip.duration,
            clip.ticks_per_second,
            clip.channels.len()
        );
    }

    let bounds = model.bounding_sphere();
    println!("Bounds: {} {}", bounds.center, bounds.radius);

    println!("Meshes: {}", model.meshes.len());
    for mesh in &model.meshes {
        let sphere = mesh.bounding_sphere;
        println!(
            "  {:?} vertices: {}, indices: {}, material: {}, bounds: {} {}",
            mesh.name,
            mesh.vertices.len(),
            mesh.indices.len(),
            mesh.material_index,
            sphere.center,
            sphere.radius
        );
        if let Some(rig) = &mesh.rig {
            let names: Vec<_> = rig.bones.iter().map(|b| b.name.as_str()).collect();
            println!(
                "    bones ({}) on {:?}: {}",
                rig.bone_count(),
                rig.mesh_node_name,
                names.join(" ")
            );
        }
    }
}

fn print_animation(model: &AnimatedModel, clip_index: usize, times: &[f32]) -> Result<()> {
    let clip = model
        .clips
        .get(clip_index)
        .ok_or_else(|| anyhow!("scene has no animations"))?;

    let mut playback = PlaybackState::default();
    playback.set_clip(model, clip_index);
    playback.pause();

    let mut evaluator = TransformEvaluator::new(&model.hierarchy, clip);
    let mut bones = BoneMatrices::default();

    for time in times {
        println!();
        println!("{:?} at {time}", clip.name);

        let transforms = evaluator.compute_world_transforms(&model.hierarchy, clip, *time);
        for (node, transform) in model.hierarchy.nodes().iter().zip(transforms) {
            println!("  {}: {}", node.name, format_translation(transform));
        }

        playback.set_time(*time);
        for mesh in &model.meshes {
            let count = playback.bone_matrices(Some(model), mesh.rig.as_ref(), &mut bones);
            if count > 0 {
                println!("  {:?} skinning matrices:", mesh.name);
                for (i, matrix) in bones.as_slice().iter().enumerate() {
                    println!("    {i}: {}", format_matrix(matrix));
                }
            }
        }
    }

    Ok(())
}

fn format_translation(transform: &Mat4) -> String {
    let t = transform.w_axis;
    format!("({:.4}, {:.4}, {:.4})", t.x, t.y, t.z)
}

fn format_matrix(matrix: &Mat4) -> String {
    matrix
        .to_cols_array()
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(" ")
}
