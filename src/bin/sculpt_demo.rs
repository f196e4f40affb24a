//! Scripted sculpting session.
//!
//! Builds a small scene with every operator, rebuilds the dirty chunks and
//! logs mesh statistics. Optionally reads a JSON config and dumps the grid.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::{IVec3, Quat, Vec2, Vec3};

use voxsculpt::core::types::Result;
use voxsculpt::math::{Pose, Region};
use voxsculpt::mesh::ChunkMesh;
use voxsculpt::session::{ControllerId, SculptConfig, SculptSession, Tool};
use voxsculpt::voxel::brush::{BrushShape, BrushStroke, Heightmap, RockParams};
use voxsculpt::voxel::cell::Rgba8;
use voxsculpt::voxel::modifier::{
    Falloff, Modifier, PaintBrush, Roughen, Smooth, TerrainImport, TerrainLayer,
};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    heightmap: Option<PathBuf>,
    rescale: Option<u32>,
}

fn parse_args() -> std::result::Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => parsed.config = args.next().map(PathBuf::from),
            "-o" | "--output" => parsed.output = args.next().map(PathBuf::from),
            "-m" | "--heightmap" => parsed.heightmap = args.next().map(PathBuf::from),
            "-r" | "--rescale" => {
                let v = args.next().ok_or("--rescale needs a value")?;
                parsed.rescale = Some(v.parse().map_err(|_| format!("bad resolution: {}", v))?);
            }
            "-h" | "--help" | "help" => return Err("show_help".to_string()),
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(parsed)
}

fn print_help() {
    println!("Sculpt Demo");
    println!("===========");
    println!();
    println!("Usage: sculpt_demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>      JSON session config");
    println!("  -o, --output <FILE>      Write the final grid here");
    println!("  -m, --heightmap <FILE>   Grayscale image imported as terrain");
    println!("  -r, --rescale <N>        Resample the grid to N^3 at the end");
}

fn log_meshes(label: &str, meshes: &[ChunkMesh]) {
    let triangles: usize = meshes.iter().map(|m| m.mesh.triangle_count()).sum();
    let vertices: usize = meshes.iter().map(|m| m.mesh.vertex_count()).sum();
    let upload: usize = meshes
        .iter()
        .map(|m| {
            m.mesh.position_bytes().len()
                + m.mesh.normal_bytes().len()
                + m.mesh.color_bytes().len()
                + m.mesh.index_bytes().len()
        })
        .sum();
    log::info!(
        "{}: {} chunks rebuilt, {} vertices, {} triangles, {} KiB of vertex data",
        label,
        meshes.len(),
        vertices,
        triangles,
        upload / 1024
    );
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SculptConfig::load(path)?,
        None => SculptConfig {
            resolution: [48, 32, 48],
            ..Default::default()
        },
    };
    let mut session = SculptSession::new(config)?;
    let res = session.grid().resolution().as_vec3();
    let mut sink: Vec<ChunkMesh> = Vec::new();

    // Ground
    let map = match &args.heightmap {
        Some(path) => Arc::new(Heightmap::from_image(path)?),
        None => Arc::new(Heightmap::from_fn(32, 32, |u, v| {
            0.5 + 0.25 * (u * 6.0).sin() * (v * 4.0).cos()
        })?),
    };
    let terrain = TerrainImport::new(map, Vec3::new(0.0, 2.0, 0.0), Vec2::new(res.x - 1.0, res.z - 1.0), res.y * 0.3)
        .with_layers(vec![
            TerrainLayer::new(3.0, Rgba8::rgb(110, 85, 60)),
            TerrainLayer::new(8.0, Rgba8::rgb(90, 140, 70)),
            TerrainLayer::new(f32::MAX, Rgba8::rgb(235, 235, 240)),
        ]);
    let start = Instant::now();
    session.import_terrain(terrain);
    session.rebuild_dirty(&mut sink);
    log_meshes("terrain", &sink);

    // Two controllers with their own tools
    let (left, right) = (ControllerId(0), ControllerId(1));
    session.tools_mut().select(left, Tool::new(
        "rock",
        BrushShape::Rock(RockParams { radius: 5.0, seed: 7, ..Default::default() }),
        Modifier::union_colored(Rgba8::rgb(120, 120, 125)),
    ));
    session.tools_mut().select(right, Tool::new(
        "carve",
        BrushShape::Sphere { radius: 4.0 },
        Modifier::subtract(),
    ));
    session.apply_tool(left, Pose::at(Vec3::new(res.x * 0.3, res.y * 0.45, res.z * 0.5)));
    session.apply_tool(right, Pose::at(Vec3::new(res.x * 0.3, res.y * 0.6, res.z * 0.5)));

    let tunnel = BrushStroke::tunnel(
        Vec3::new(res.x * 0.6, res.y * 0.3, 0.0),
        Vec3::new(res.x * 0.6, res.y * 0.3, res.z),
        3.0,
        res.y * 0.25,
    );
    session.apply(&tunnel, &Modifier::subtract());

    let pillar = BrushStroke::box_stroke(Vec3::new(res.x * 0.8, res.y * 0.5, res.z * 0.3), Vec3::new(2.0, 6.0, 2.0))
        .with_rotation(Quat::from_rotation_y(0.6));
    session.preview(&pillar, &Modifier::union_colored(Rgba8::rgb(200, 60, 40)));
    session.commit_preview();

    let brush = PaintBrush::new(Rgba8::rgb(40, 90, 200))
        .with_channels([false, true, true, false])
        .with_falloff(Falloff::Smooth, 3.0);
    session.apply(&BrushStroke::sphere(Vec3::new(res.x * 0.5, res.y * 0.4, res.z * 0.5), 8.0), &Modifier::Paint(brush));

    let area = BrushStroke::sphere(res * 0.5, res.x * 0.35);
    session.apply(&area, &Modifier::Roughen(Roughen::new(0.4, 0.15, 1.5, 11)));
    session.apply(&area, &Modifier::Smooth(Smooth::new(1.5, 0.9, 0.5)).height_clamped(Some(res.y * 0.4), None));

    let copied = session.copy_region(&Region::new(IVec3::new(10, 8, 18), IVec3::new(18, 20, 28)));
    session.paste(IVec3::new(30, 8, 18));
    log::info!("Copied {} cells", copied.volume());

    if session.undo().is_some() {
        session.redo();
    }
    sink.clear();
    session.rebuild_dirty(&mut sink);
    log_meshes("edits", &sink);

    if let Some(n) = args.rescale {
        session.rescale(glam::UVec3::splat(n))?;
        sink.clear();
        session.rebuild_dirty(&mut sink);
        log_meshes("rescaled", &sink);
    }

    let full = session.build_full_mesh();
    log::info!(
        "Full surface: {} vertices, {} triangles, {} open edges ({:.2}s)",
        full.vertex_count(),
        full.triangle_count(),
        full.open_edge_count(),
        start.elapsed().as_secs_f64()
    );

    if let Some(path) = &args.output {
        session.save(path)?;
    }
    Ok(())
}

fn main() {
    voxsculpt::core::logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            if e == "show_help" {
                print_help();
                return;
            }
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
