use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use surface_denoise::{scale, DenoiseParams, Denoiser, ImageBuffer, NormalBuffer, ProgressCounter};

#[derive(Debug, Deserialize)]
pub struct DenoiseToolConfig {
    pub input: PathBuf,
    #[serde(default)]
    pub denoise: DenoiseParams,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub denoised_image: PathBuf,
    #[serde(default)]
    pub normal_map: Option<PathBuf>,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<DenoiseToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let raw = load_grayscale_image(&config.input)?;
    println!(
        "Loaded {} ({}x{})",
        config.input.display(),
        raw.width(),
        raw.height()
    );

    // The conic fits expect values in a small range; 8-bit data goes to [0, 1].
    let scaled = scale::rescale(&raw, 0.0, 255.0, 0.0, 1.0).map_err(|e| e.to_string())?;

    let denoiser = Denoiser::new(config.denoise.clone()).map_err(|e| e.to_string())?;
    let progress = ProgressCounter::new(scaled.pixel_count());

    let joined = thread::scope(|scope| {
        let worker = scope.spawn(|| denoiser.process_with_progress(&scaled, &progress));
        while !worker.is_finished() {
            thread::sleep(Duration::from_secs(1));
            if worker.is_finished() {
                break;
            }
            let snapshot = progress.snapshot();
            println!(
                "Progress: {:.1}% ({} / {} pixels)",
                snapshot.fraction * 100.0,
                snapshot.processed,
                snapshot.total
            );
        }
        worker.join()
    });
    let output = joined
        .map_err(|_| "Denoising worker panicked".to_string())?
        .map_err(|e| e.to_string())?;

    let report = &output.report;
    println!(
        "Denoised with {:?} model: {} of {} pixels did not converge, \
         mean fitting error {:.6}, {:.1} ms",
        report.model,
        report.error_pixels,
        report.width * report.height,
        report.mean_fitting_error,
        report.elapsed_ms
    );

    save_grayscale_f64(&output.image, &config.output.denoised_image)?;
    println!(
        "Saved denoised image to {}",
        config.output.denoised_image.display()
    );

    if let Some(path) = &config.output.normal_map {
        save_normal_map(&output.normals, path)?;
        println!("Saved normal map to {}", path.display());
    }
    if let Some(path) = &config.output.report_json {
        write_json_file(path, report)?;
        println!("Saved report to {}", path.display());
    }

    Ok(())
}

fn usage() -> String {
    "Usage: denoise_demo <config.json>".to_string()
}

/// Load an image from disk, convert to 8-bit grayscale and widen to f64.
fn load_grayscale_image(path: &Path) -> Result<ImageBuffer, String> {
    let gray = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let data = gray.into_raw().into_iter().map(f64::from).collect();
    ImageBuffer::from_vec(width, height, data).map_err(|e| e.to_string())
}

/// Save a float image in [0, 1] to a grayscale PNG, clamping to [0, 255].
fn save_grayscale_f64(image: &ImageBuffer, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(image.width() as u32, image.height() as u32);
    for y in 0..image.height() {
        for (x, &value) in image.row(y).iter().enumerate() {
            let v = (value * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save unit normals as an RGB PNG with each component mapped from
/// [-1, 1] to [0, 255].
fn save_normal_map(normals: &NormalBuffer, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let channel = |c: f64| ((c + 1.0) * 0.5 * 255.0).clamp(0.0, 255.0) as u8;
    let mut out = RgbImage::new(normals.width() as u32, normals.height() as u32);
    for y in 0..normals.height() {
        for x in 0..normals.width() {
            let n = normals.get(x, y);
            out.put_pixel(x as u32, y as u32, Rgb([channel(n.x), channel(n.y), channel(n.z)]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
