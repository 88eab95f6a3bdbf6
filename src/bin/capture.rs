//! capture: render per-camera depth maps for a calibrated rig
//!
//! Usage:
//!   capture --mesh scene.obj --intrinsics intrinsics.txt --extrinsics extrinsics.txt --out output/depth
//!   capture --mesh scene.obj --calib-root rig/ --near 0.5 --far 50 --out output/depth
//!   capture --mesh scene.obj --colmap sparse/0 --out output/depth

use lfdepth_rs::capture::{CaptureEntry, CaptureSequencer};
use lfdepth_rs::gpu::{DepthRenderer, GpuContext};
use lfdepth_rs::io::{self, PngDepthSink};
use std::path::PathBuf;
use std::process::ExitCode;

struct Options {
    mesh: PathBuf,
    source: CalibSource,
    out_dir: PathBuf,
    near: f32,
    far: f32,
    preview: bool,
}

enum CalibSource {
    Files {
        intrinsics: PathBuf,
        extrinsics: PathBuf,
    },
    Root(PathBuf),
    Colmap(PathBuf),
    Json(PathBuf),
}

fn main() -> ExitCode {
    env_logger::init();
    println!("capture v{}", lfdepth_rs::VERSION);

    let options = match parse_args() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(&options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<bool, Box<dyn std::error::Error>> {
    println!("Loading mesh from {:?}...", options.mesh);
    let geometry = io::load_obj(&options.mesh)?;
    println!(
        "Loaded mesh: {} vertices, {} triangles",
        geometry.positions().len(),
        geometry.triangle_count()
    );

    let entries: Vec<CaptureEntry> = match &options.source {
        CalibSource::Files {
            intrinsics,
            extrinsics,
        } => io::load_camera_files(intrinsics, extrinsics)?,
        CalibSource::Root(root) => io::discover_rig(root)?,
        CalibSource::Colmap(sparse_dir) => io::load_colmap_rig(sparse_dir)?,
        CalibSource::Json(path) => io::load_camera_json(path)?,
    };
    println!("Found {} calibrated cameras", entries.len());

    if entries.is_empty() {
        println!("Nothing to capture");
        return Ok(true);
    }

    // All cameras in one run share the first camera's resolution; the
    // renderer rejects any that differ.
    let first = &entries[0].intrinsic;
    println!(
        "Rendering {}x{}, near={}, far={}",
        first.width, first.height, options.near, options.far
    );

    let ctx = GpuContext::new_blocking()?;
    let mut renderer = DepthRenderer::new(ctx, first.width, first.height)?;
    renderer.upload_geometry(&geometry);

    let mut sink = PngDepthSink::new(&options.out_dir)?.with_preview(options.preview);
    let mut sequencer = CaptureSequencer::new(renderer, options.near, options.far)?;
    let report = sequencer.run(&entries, &mut sink);

    println!(
        "Captured {}/{} cameras to {:?}",
        report.captured.len(),
        entries.len(),
        options.out_dir
    );
    for (id, err) in &report.failures {
        eprintln!("  camera {} failed: {}", id, err);
    }
    if report.aborted > 0 {
        eprintln!("  {} cameras skipped after fatal error", report.aborted);
    }

    Ok(report.is_complete())
}

fn parse_args() -> Result<Options, String> {
    let mut mesh: Option<PathBuf> = None;
    let mut intrinsics: Option<PathBuf> = None;
    let mut extrinsics: Option<PathBuf> = None;
    let mut calib_root: Option<PathBuf> = None;
    let mut colmap: Option<PathBuf> = None;
    let mut camera_json: Option<PathBuf> = None;
    let mut out_dir = PathBuf::from("output/depth");
    let mut near = 0.1f32;
    let mut far = 1000.0f32;
    let mut preview = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mesh" => mesh = Some(next_path(&mut args, "--mesh")?),
            "--intrinsics" => intrinsics = Some(next_path(&mut args, "--intrinsics")?),
            "--extrinsics" => extrinsics = Some(next_path(&mut args, "--extrinsics")?),
            "--calib-root" => calib_root = Some(next_path(&mut args, "--calib-root")?),
            "--colmap" => colmap = Some(next_path(&mut args, "--colmap")?),
            "--camera-json" => camera_json = Some(next_path(&mut args, "--camera-json")?),
            "--out" => out_dir = next_path(&mut args, "--out")?,
            "--near" => near = next_number(&mut args, "--near")?,
            "--far" => far = next_number(&mut args, "--far")?,
            "--preview" => preview = true,
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    let mesh = mesh.ok_or("missing --mesh argument")?;

    let source = match (intrinsics, extrinsics, calib_root, colmap, camera_json) {
        (Some(intrinsics), Some(extrinsics), None, None, None) => CalibSource::Files {
            intrinsics,
            extrinsics,
        },
        (None, None, Some(root), None, None) => CalibSource::Root(root),
        (None, None, None, Some(sparse_dir), None) => CalibSource::Colmap(sparse_dir),
        (None, None, None, None, Some(path)) => CalibSource::Json(path),
        (None, None, None, None, None) => {
            return Err("missing calibration input (--intrinsics/--extrinsics, --calib-root, --colmap, or --camera-json)".to_string())
        }
        _ => return Err("choose exactly one calibration input".to_string()),
    };

    Ok(Options {
        mesh,
        source,
        out_dir,
        near,
        far,
        preview,
    })
}

fn next_path(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<PathBuf, String> {
    args.next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("missing value for {}", flag))
}

fn next_number(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<f32, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {}", flag))?;
    value
        .parse()
        .map_err(|_| format!("invalid number for {}: '{}'", flag, value))
}

fn print_help() {
    println!(
        r#"capture: render per-camera depth maps for a calibrated rig

USAGE:
    capture --mesh MESH.obj <CALIBRATION> [OPTIONS]

REQUIRED:
    --mesh PATH              Wavefront OBJ mesh to render

CALIBRATION (choose one):
    --intrinsics PATH        Text intrinsics (with --extrinsics)
    --extrinsics PATH        Text extrinsics (with --intrinsics)
    --calib-root PATH        Rig folder: one intrinsics.txt + extrinsics.txt pair per subfolder
    --colmap PATH            COLMAP sparse directory (cameras.bin + images.bin)
    --camera-json PATH       Single camera as JSON

OPTIONS:
    --out DIR                Output directory [default: output/depth]
    --near F                 Near clip plane [default: 0.1]
    --far F                  Far clip plane [default: 1000]
    --preview                Also write 8-bit preview PNGs
    --help, -h               Print this help message

Each camera produces one 16-bit grayscale PNG named after its identifier
(positional index, subfolder name, or image name). Pixels no geometry covers
hold 65535, the far-plane sentinel.

EXAMPLES:
    # Rig folder with one subfolder per camera
    capture --mesh scene.obj --calib-root rig/ --near 0.5 --far 50 --out output/depth

    # Single calibration file pair holding all cameras
    capture --mesh scene.obj --intrinsics intrinsics.txt --extrinsics extrinsics.txt

    # Cameras from a COLMAP reconstruction
    capture --mesh scene.obj --colmap dataset/sparse/0 --out output/depth
"#
    );
}
