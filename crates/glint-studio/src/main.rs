//! glint-studio: renders a TOML sprite scene offscreen and writes PNGs.

mod backend;
mod compose;
mod scene_file;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use glint_engine::device::GpuInit;
use glint_engine::logging::{LoggingConfig, init_logging};
use glint_engine::time::EffectClock;

use backend::{Binding, CpuBackend, GpuBackend};
use scene_file::{PolicyName, SceneFile};

#[derive(Debug, Parser)]
#[command(name = "glint-studio", version, about = "Render a glint sprite scene to PNG")]
struct Args {
    /// Scene file (TOML). The built-in demo scene is used when omitted.
    scene: Option<PathBuf>,

    /// Output PNG. With several frames, the frame number is appended to the stem.
    #[arg(short, long, default_value = "glint.png")]
    out: PathBuf,

    /// Use the CPU reference rasterizer instead of the GPU.
    #[arg(long)]
    cpu: bool,

    /// Texture binding model for sprites.
    #[arg(long, value_enum, default_value_t = Binding::Arrays)]
    binding: Binding,

    /// Effect time of the first frame; overrides the scene's `t`.
    #[arg(short, long)]
    t: Option<f32>,

    /// Number of frames to render.
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Frame rate used to advance the effect clock between frames.
    #[arg(long, default_value_t = 30.0)]
    fps: f32,

    /// Output size `WIDTHxHEIGHT`; overrides the scene's `size`.
    #[arg(long, value_parser = parse_size)]
    size: Option<[u32; 2]>,

    /// Overrides the scene's zoom.
    #[arg(long)]
    zoom: Option<f32>,

    /// Overrides the post filter's outline policy.
    #[arg(long, value_enum)]
    policy: Option<PolicyName>,

    /// Request the software adapter.
    #[arg(long)]
    fallback_adapter: bool,

    /// Log filter (env_logger syntax); defaults to `RUST_LOG`, then `info`.
    #[arg(long)]
    log: Option<String>,
}

fn parse_size(s: &str) -> Result<[u32; 2], String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}"));
    Ok([parse(w)?, parse(h)?])
}

/// `out.png` for a single frame, `out_0007.png` for frame 7 of many.
fn frame_path(out: &Path, frame: u32, frames: u32) -> PathBuf {
    if frames <= 1 {
        return out.to_path_buf();
    }
    let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let ext = out.extension().and_then(|s| s.to_str()).unwrap_or("png");
    out.with_file_name(format!("{stem}_{frame:04}.{ext}"))
}

fn load_scene(args: &Args) -> Result<(SceneFile, PathBuf)> {
    let (mut scene, base_dir) = match &args.scene {
        Some(path) => {
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (SceneFile::load(path)?, base)
        }
        None => {
            log::info!("no scene given, rendering the built-in demo");
            (SceneFile::demo()?, PathBuf::from("."))
        }
    };

    if let Some(size) = args.size {
        scene.size = size;
    }
    if let Some(zoom) = args.zoom {
        scene.zoom = zoom;
    }
    if let Some(t) = args.t {
        scene.t = t;
    }
    if let (Some(policy), Some(post)) = (args.policy, scene.post.as_mut()) {
        post.policy = policy;
    }
    Ok((scene, base_dir))
}

enum Renderer<'a> {
    Cpu(CpuBackend<'a>),
    Gpu(GpuBackend<'a>),
}

fn run(args: Args) -> Result<()> {
    let (scene, base_dir) = load_scene(&args)?;
    let comp = compose::compose(&scene, &base_dir)?;

    let mut clock = EffectClock::starting_at(comp.t);
    let dt = 1.0 / args.fps.max(f32::EPSILON);
    let frames = args.frames.max(1);

    let mut renderer = if args.cpu {
        Renderer::Cpu(CpuBackend::new(&comp, args.binding))
    } else {
        let init = GpuInit { force_fallback_adapter: args.fallback_adapter, ..GpuInit::default() };
        let backend = GpuBackend::new(&comp, args.binding, init)?;
        log::info!("rendering on {}", backend.adapter_name());
        Renderer::Gpu(backend)
    };

    for frame in 0..frames {
        let t = clock.t();
        let image = match &mut renderer {
            Renderer::Gpu(gpu) => gpu.render(t)?,
            Renderer::Cpu(cpu) => cpu.render(t),
        };

        let path = frame_path(&args.out, frame, frames);
        image.save(&path).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("wrote {} (t = {t:.3})", path.display());

        clock.advance(dt);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(match &args.log {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });
    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_width_by_height() {
        assert_eq!(parse_size("640x480"), Ok([640, 480]));
        assert_eq!(parse_size("32X16"), Ok([32, 16]));
        assert!(parse_size("640").is_err());
        assert!(parse_size("ax2").is_err());
    }

    #[test]
    fn single_frame_keeps_output_name() {
        assert_eq!(frame_path(Path::new("out/a.png"), 0, 1), PathBuf::from("out/a.png"));
    }

    #[test]
    fn frames_are_numbered() {
        assert_eq!(frame_path(Path::new("out/a.png"), 7, 12), PathBuf::from("out/a_0007.png"));
    }

    #[test]
    fn cli_overrides_scene_values() {
        let args = Args::parse_from(["glint-studio", "--size", "64x32", "--zoom", "2", "-t", "1.5", "--policy", "coverage_count"]);
        let (scene, _) = load_scene(&args).unwrap();
        assert_eq!(scene.size, [64, 32]);
        assert_eq!(scene.zoom, 2.0);
        assert_eq!(scene.t, 1.5);
        assert_eq!(scene.post.unwrap().policy, PolicyName::CoverageCount);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
