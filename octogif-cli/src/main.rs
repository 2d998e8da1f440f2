use anyhow::{bail, Context, Result};
use clap::Parser;
use common_types::JobOptions;
use log::info;
use octo_pipeline::EncodeJob;
use std::fs::{self, read_dir};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "octogif")]
#[command(about = "Animated GIF encoder: PNG frames -> shared-palette GIF89a")]
struct Args {
    /// Input directory containing PNG frames, encoded in filename order
    #[arg(long, value_name = "DIR")]
    frames: PathBuf,

    /// Output GIF file path
    #[arg(long, value_name = "FILE")]
    out: PathBuf,

    /// Per-frame delay in milliseconds
    #[arg(long, default_value = "100")]
    delay_ms: u32,

    /// Palette sampling aggressiveness (1 = densest, 30 = coarsest)
    #[arg(long, default_value = "10")]
    quality: u8,

    /// Enable Floyd-Steinberg dithering
    #[arg(long)]
    dither: bool,

    /// Netscape loop count (0 = infinite)
    #[arg(long, default_value = "0")]
    loop_count: u16,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!(
        "octogif: {} -> {}",
        args.frames.display(),
        args.out.display()
    );

    let paths = collect_frame_paths(&args.frames)?;
    if paths.is_empty() {
        bail!("no .png frames found in {}", args.frames.display());
    }
    info!("found {} frames", paths.len());

    let mut options = JobOptions::default();
    options.quality = args.quality;
    options.dither = args.dither;
    options.loop_count = args.loop_count;

    let mut job = EncodeJob::new(options);
    for path in &paths {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            bail!("{}: {}x{} exceeds the GIF size limit", path.display(), width, height);
        }

        info!("frame {}: {}x{}", path.display(), width, height);
        job.add_frame(width as u16, height as u16, image.into_raw(), args.delay_ms);
    }

    let total = job.frame_count();
    job.on_progress(move |fraction| {
        let done = (fraction * total as f32).round() as usize;
        info!("encoded {}/{} frames", done, total);
    });

    let encoded = job.render().context("encoding failed")?;

    fs::write(&args.out, &encoded.bytes)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    info!(
        "wrote {} bytes, {} palette colors",
        encoded.bytes.len(),
        encoded.palette.len()
    );

    Ok(())
}

fn collect_frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "png"))
        .collect();

    paths.sort();
    Ok(paths)
}
