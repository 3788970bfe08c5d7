//! Animation clip command implementations

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use console::Style;
use flourish_clip::model::ClipModel;
use flourish_clip::sweep::{PartTipSampler, SweepCapture, SweepParameters};
use flourish_clip::{AnimClip, AnimPart, ClipInstance, EventWindow, PartHandle};
use glam::Vec3;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::utils::{
    NodeType, RefType, TreeNode, TreeOptions, add_table_row, create_progress_bar, create_spinner,
    create_table, format_bytes, format_color, format_percentage, format_timestamp, format_vec3,
    render_tree, seconds_cell,
};

#[derive(Subcommand)]
pub enum ClipCommands {
    /// Display information about a clip
    Info {
        /// Path to the clip file
        file: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the part hierarchy as a tree
    Tree {
        /// Path to the clip file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Hide texture and split pivot references
        #[arg(long)]
        no_refs: bool,

        /// Show one line per part
        #[arg(short, long)]
        compact: bool,
    },

    /// Load clips and report any load error
    Validate {
        /// Clip files or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// List the events of a clip
    Events {
        /// Path to the clip file
        file: PathBuf,

        /// Window start in seconds
        #[arg(short, long, default_value = "0")]
        start: f32,

        /// Window end in seconds, the clip duration when omitted
        #[arg(short, long)]
        end: Option<f32>,
    },

    /// Evaluate one part at one time
    Sample {
        /// Path to the clip file
        file: PathBuf,

        /// Part name, path or authoring id
        part: String,

        /// Time in seconds
        #[arg(short, long)]
        time: f32,

        /// Mirror horizontally
        #[arg(long)]
        mirror_x: bool,

        /// Mirror vertically
        #[arg(long)]
        mirror_y: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Capture a sweep path from a part's origin
    Capture {
        /// Path to the clip file
        file: PathBuf,

        /// Part name, path or authoring id
        part: String,

        /// Capture parameters as inline JSON or a JSON file
        #[arg(short, long)]
        params: Option<String>,

        /// Write the clip with the new sweep path appended here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn execute(cmd: ClipCommands) -> Result<()> {
    match cmd {
        ClipCommands::Info { file, detailed } => handle_info(&file, detailed),
        ClipCommands::Tree {
            file,
            depth,
            no_color,
            no_refs,
            compact,
        } => handle_tree(&file, depth, no_color, no_refs, compact),
        ClipCommands::Validate { patterns } => handle_validate(&patterns),
        ClipCommands::Events { file, start, end } => handle_events(&file, start, end),
        ClipCommands::Sample {
            file,
            part,
            time,
            mirror_x,
            mirror_y,
            json,
        } => handle_sample(&file, &part, time, mirror_x, mirror_y, json),
        ClipCommands::Capture {
            file,
            part,
            params,
            output,
        } => handle_capture(&file, &part, params.as_deref(), output.as_deref()),
    }
}

fn read_model(path: &Path) -> Result<ClipModel> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse clip document {}", path.display()))
}

fn load_clip(path: &Path) -> Result<AnimClip> {
    let model = read_model(path)?;
    AnimClip::from_model(&model)
        .with_context(|| format!("Failed to load clip from {}", path.display()))
}

/// Find a part by custom name, path, or authoring id
fn find_part<'a>(clip: &'a AnimClip, query: &str) -> Result<&'a AnimPart> {
    let parts = clip.parts();
    if let Some(part) = parts.iter().find(|p| p.name() == query) {
        return Ok(part);
    }
    if let Some(part) = parts.iter().find(|p| p.path() == query) {
        return Ok(part);
    }
    if let Ok(id) = query.parse::<i32>()
        && let Some(part) = parts.iter().find(|p| p.id() == id)
    {
        return Ok(part);
    }
    Err(anyhow!("No part '{}' in clip '{}'", query, clip.name()))
}

fn part_label(clip: &AnimClip, handle: Option<PartHandle>) -> String {
    handle
        .and_then(|h| clip.part(h).ok())
        .map_or_else(|| "-".to_string(), |p| p.name().to_string())
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    println!("Loading clip: {}", path.display());

    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .len();
    let clip = load_clip(path)?;
    let bounds = clip.bounds();

    println!("\n=== Clip Information ===");
    println!("Name: {}", clip.name());
    println!("Duration: {:.3}s", clip.duration());
    println!(
        "Bounds: x={:.2} y={:.2} w={:.2} h={:.2}",
        bounds.x, bounds.y, bounds.width, bounds.height
    );
    println!("Exported: {}", format_timestamp(clip.export_time_utc()));
    println!("File size: {}", format_bytes(size));
    println!(
        "Parts: {} ({} roots)",
        clip.parts().len(),
        clip.root_parts().count()
    );
    println!("Events: {}", clip.events().len());
    println!(
        "Sweep paths: {} on {} parts",
        clip.sweep_data_count(),
        clip.parts_with_sweeps().count()
    );

    if detailed {
        println!("\n=== Parts ===");
        let mut table = create_table(&["#", "ID", "Name", "Parent", "Channels", "Texture"]);
        for part in clip.parts() {
            add_table_row(
                &mut table,
                vec![
                    part.index().to_string(),
                    part.id().to_string(),
                    part.name().to_string(),
                    part_label(&clip, part.parent()),
                    part.curves().channel_count().to_string(),
                    part.texture_path().unwrap_or("-").to_string(),
                ],
            );
        }
        table.printstd();

        let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
        for event in clip.events() {
            *kinds.entry(event.identifier()).or_default() += 1;
        }
        if !kinds.is_empty() {
            println!("\n=== Event Kinds ===");
            for (kind, count) in kinds {
                println!("  {kind}: {count}");
            }
        }
    }

    Ok(())
}

fn part_node(clip: &AnimClip, part: &AnimPart) -> TreeNode {
    let node_type = if part.texture_path().is_some() {
        NodeType::Part
    } else {
        NodeType::Group
    };
    let mut node = TreeNode::new(part.name(), node_type)
        .with_metadata("id", part.id())
        .with_metadata("channels", part.curves().channel_count());

    let sweeps = clip.sweep_paths(part.handle()).len();
    if sweeps > 0 {
        node = node.with_metadata("sweeps", sweeps);
    }
    if let Some(texture) = part.texture_path() {
        node = node.with_external_ref(texture, RefType::Texture);
    }
    if part.split_draw_pivot().is_some() {
        node = node.with_external_ref(&part_label(clip, part.split_draw_pivot()), RefType::SplitPivot);
    }

    for &child in part.children() {
        if let Ok(child) = clip.part(child) {
            node = node.add_child(part_node(clip, child));
        }
    }
    node
}

fn handle_tree(
    path: &Path,
    max_depth: Option<usize>,
    no_color: bool,
    no_refs: bool,
    compact: bool,
) -> Result<()> {
    let clip = load_clip(path)?;

    let mut root = TreeNode::new(clip.name(), NodeType::Clip)
        .with_metadata("duration", format!("{:.3}s", clip.duration()))
        .with_metadata("parts", clip.parts().len());
    for part in clip.root_parts() {
        root = root.add_child(part_node(&clip, part));
    }
    if !clip.events().is_empty() {
        root = root.add_child(TreeNode::new(
            format!("Events ({})", clip.events().len()),
            NodeType::Events,
        ));
    }

    let options = TreeOptions {
        max_depth,
        show_external_refs: !no_refs,
        no_color,
        show_metadata: true,
        compact,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

fn handle_validate(patterns: &[String]) -> Result<()> {
    let mut files = Vec::new();
    for pattern in patterns {
        let matches =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{pattern}'"))?;
        let before = files.len();
        files.extend(matches.filter_map(std::result::Result::ok));
        if files.len() == before {
            log::warn!("No files match '{}'", pattern);
        }
    }
    if files.is_empty() {
        bail!("No clip files matched");
    }

    let ok = Style::new().green();
    let fail = Style::new().red();
    let pb = create_progress_bar(files.len() as u64, "Validating clips");
    let mut failed = 0;
    for file in &files {
        let line = match load_clip(file) {
            Ok(clip) => format!(
                "{} {} ({} parts, {} events)",
                ok.apply_to("✓"),
                file.display(),
                clip.parts().len(),
                clip.events().len()
            ),
            Err(e) => {
                failed += 1;
                format!("{} {}: {:#}", fail.apply_to("✗"), file.display(), e)
            }
        };
        pb.suspend(|| println!("{line}"));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let passed = files.len() - failed;
    println!(
        "{} of {} clips valid ({})",
        passed,
        files.len(),
        format_percentage(passed as f64 / files.len() as f64 * 100.0)
    );
    if failed > 0 {
        bail!("{failed} clip(s) failed validation");
    }
    Ok(())
}

fn handle_events(path: &Path, start: f32, end: Option<f32>) -> Result<()> {
    let clip = load_clip(path)?;
    let window = EventWindow::new(start, end.unwrap_or(clip.duration()));

    let mut table = create_table(&["#", "Time", "Event", "Timing", "Data"]);
    let mut count = 0;
    for event in clip.events_in_window(window) {
        let data = event
            .to_save_data()
            .unwrap_or_else(|e| format!("<{e}>"));
        add_table_row(
            &mut table,
            vec![
                event.index.to_string(),
                seconds_cell(event.time),
                event.identifier().to_string(),
                event.timing.map_or_else(|| "-".to_string(), |t| t.to_string()),
                data,
            ],
        );
        count += 1;
    }

    println!(
        "Events of '{}' in ({:.3}s, {:.3}s]: {}",
        clip.name(),
        window.start,
        window.end,
        count
    );
    if count > 0 {
        table.printstd();
    }
    Ok(())
}

fn handle_sample(
    path: &Path,
    query: &str,
    time: f32,
    mirror_x: bool,
    mirror_y: bool,
    json: bool,
) -> Result<()> {
    let clip = Arc::new(load_clip(path)?);
    let part = find_part(&clip, query)?;
    let handle = part.handle();
    let name = part.name().to_string();

    let instance = ClipInstance::new(Arc::clone(&clip)).with_mirror(mirror_x, mirror_y);
    let snap = instance.snapshot(handle, time)?;
    let world = snap.world_position(Vec3::ZERO);

    if json {
        let value = serde_json::json!({
            "part": name,
            "index": handle.index(),
            "time": snap.time,
            "active": snap.active,
            "local_position": snap.local_position.to_array(),
            "local_rotation": snap.local_rotation.to_array(),
            "local_scale": snap.local_scale.to_array(),
            "world_position": world.to_array(),
            "world_rotation": snap.world_rotation(),
            "direction": snap.world_direction().as_int(),
            "color": snap.final_color,
            "data": [snap.data_a, snap.data_b, snap.data_c],
            "flip_x": snap.effective_flip_x,
            "flip_y": snap.effective_flip_y,
            "frame_index": snap.frame_index,
            "split_draw_mode": snap.split_draw_mode,
            "texture": snap.texture_path(part.texture_path()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Part: {} (#{}, id {})", name, handle.index(), part.id());
    println!("Time: {:.3}s", snap.time);
    println!("Active: {}", snap.active);
    println!("Local position: {}", format_vec3(snap.local_position));
    println!("Local rotation: {}", format_vec3(snap.local_rotation));
    println!("Local scale: {}", format_vec3(snap.local_scale));
    println!("World position: {}", format_vec3(world));
    println!("World rotation: {:.2}°", snap.world_rotation());
    println!("Direction: {:?}", snap.world_direction());
    println!("Color: {}", format_color(snap.final_color));
    println!(
        "Data: {:.3}, {:.3}, {:.3}",
        snap.data_a, snap.data_b, snap.data_c
    );
    println!(
        "Flip: x={} y={}",
        snap.effective_flip_x, snap.effective_flip_y
    );
    println!("Frame: {}", snap.frame_index);
    println!("Split draw: {:?}", snap.split_draw_mode);
    if let Some(texture) = snap.texture_path(part.texture_path()) {
        println!("Texture: {texture}");
    }
    Ok(())
}

fn read_params(source: Option<&str>) -> Result<SweepParameters> {
    let Some(source) = source else {
        return Ok(SweepParameters::default());
    };
    let text = if source.trim_start().starts_with('{') {
        source.to_string()
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read capture parameters from {source}"))?
    };
    serde_json::from_str(&text).context("Invalid capture parameters")
}

fn handle_capture(
    path: &Path,
    query: &str,
    params: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let params = read_params(params)?;
    let mut model = read_model(path)?;
    let clip = Arc::new(
        AnimClip::from_model(&model)
            .with_context(|| format!("Failed to load clip from {}", path.display()))?,
    );
    let part = find_part(&clip, query)?;
    let (index, name) = (part.index(), part.name().to_string());

    let spinner = create_spinner(&format!("Capturing sweep of '{name}'"));
    let sampler = PartTipSampler::new(ClipInstance::new(Arc::clone(&clip)), part.handle())?;
    let points = SweepCapture::new(sampler, params)?.capture_with_post_processing();
    spinner.finish_and_clear();
    let points = points.with_context(|| format!("Failed to capture sweep of '{name}'"))?;

    log::info!("Captured {} samples for '{}'", points.len(), name);

    match output {
        Some(output) => {
            model.parts[index].sweep_paths.push(points);
            let file = File::create(output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            serde_json::to_writer_pretty(file, &model)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Appended sweep path of '{}' ({} samples) to {}",
                name,
                model.parts[index].sweep_paths.last().map_or(0, Vec::len),
                output.display()
            );
        }
        None => println!("{}", serde_json::to_string_pretty(&points)?),
    }
    Ok(())
}
