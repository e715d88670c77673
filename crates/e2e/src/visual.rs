//! Visual regression testing
//!
//! Screenshots taken by scenarios are compared pixel-by-pixel against
//! checked-in baselines. Rendering noise is expected and bounded: small
//! per-channel differences are tolerated per pixel, and a bounded fraction
//! of pixels may differ per image (`max_diff_pixel_ratio`). Dynamic regions
//! are masked at capture time, not here.

use std::path::{Path, PathBuf};
use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Result of one snapshot comparison
#[derive(Debug, Clone)]
pub struct SnapshotDiff {
    /// Whether the images match within the allowed ratio
    pub matches: bool,

    /// Fraction of pixels that differ (0.0 - 1.0)
    pub diff_ratio: f64,

    /// Number of differing pixels
    pub diff_pixels: u64,

    /// Total pixels compared
    pub total_pixels: u64,

    /// Path to the generated diff image, if any
    pub diff_image_path: Option<PathBuf>,

    /// Hash of the actual screenshot
    pub actual_hash: String,

    /// Hash of the baseline screenshot
    pub baseline_hash: String,
}

/// Configuration for snapshot comparison
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,

    /// Allowed fraction of differing pixels (0.0 - 1.0)
    pub max_diff_pixel_ratio: f64,

    /// Adopt the actual screenshot as baseline when none exists
    pub auto_update: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/screenshots"),
            diff_dir: PathBuf::from("test-results/diffs"),
            max_diff_pixel_ratio: 0.02,
            auto_update: false,
        }
    }
}

/// Compares screenshots against baselines
pub struct SnapshotComparator {
    config: SnapshotConfig,
}

impl SnapshotComparator {
    pub fn new(config: SnapshotConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.actual_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    /// Compare a named screenshot against its baseline
    pub fn compare(&self, name: &str, ratio_override: Option<f64>) -> E2eResult<SnapshotDiff> {
        let threshold = ratio_override.unwrap_or(self.config.max_diff_pixel_ratio);

        let actual_path = self.config.actual_dir.join(format!("{}.png", name));
        let baseline_path = self.config.baseline_dir.join(format!("{}.png", name));

        if !actual_path.exists() {
            return Err(E2eError::AssertionFailed(format!(
                "screenshot not found: {}",
                actual_path.display()
            )));
        }

        if !baseline_path.exists() {
            if self.config.auto_update {
                info!("creating baseline for '{}'", name);
                std::fs::copy(&actual_path, &baseline_path)?;

                let actual_hash = hash_file(&actual_path)?;
                return Ok(SnapshotDiff {
                    matches: true,
                    diff_ratio: 0.0,
                    diff_pixels: 0,
                    total_pixels: 0,
                    diff_image_path: None,
                    actual_hash: actual_hash.clone(),
                    baseline_hash: actual_hash,
                });
            }
            return Err(E2eError::BaselineNotFound(
                baseline_path.to_string_lossy().to_string(),
            ));
        }

        let actual_img = image::open(&actual_path)?;
        let baseline_img = image::open(&baseline_path)?;

        let actual_hash = hash_file(&actual_path)?;
        let baseline_hash = hash_file(&baseline_path)?;

        if actual_hash == baseline_hash {
            debug!("screenshots match exactly (same hash)");
            return Ok(SnapshotDiff {
                matches: true,
                diff_ratio: 0.0,
                diff_pixels: 0,
                total_pixels: (actual_img.width() as u64) * (actual_img.height() as u64),
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        if actual_img.dimensions() != baseline_img.dimensions() {
            warn!(
                "screenshot dimensions differ: actual {:?} vs baseline {:?}",
                actual_img.dimensions(),
                baseline_img.dimensions()
            );
        }

        let (width, height) = actual_img.dimensions();
        let baseline_rgba = baseline_img.to_rgba8();
        let actual_rgba = actual_img.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = (width as u64) * (height as u64);

        for y in 0..height.min(baseline_img.height()) {
            for x in 0..width.min(baseline_img.width()) {
                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, baseline_pixel) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_ratio = diff_pixels as f64 / total_pixels as f64;
        let matches = diff_ratio <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{}-diff.png", name));
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "visual regression in '{}': {:.4} of pixels differ (allowed: {:.4})",
                name, diff_ratio, threshold
            );
        }

        Ok(SnapshotDiff {
            matches,
            diff_ratio,
            diff_pixels,
            total_pixels,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Adopt the actual screenshot as the new baseline
    pub fn update_baseline(&self, name: &str) -> E2eResult<()> {
        let actual_path = self.config.actual_dir.join(format!("{}.png", name));
        let baseline_path = self.config.baseline_dir.join(format!("{}.png", name));

        if !actual_path.exists() {
            return Err(E2eError::AssertionFailed(format!(
                "cannot update baseline, screenshot not found: {}",
                actual_path.display()
            )));
        }

        std::fs::copy(&actual_path, &baseline_path)?;
        info!("updated baseline for '{}'", name);
        Ok(())
    }

    /// Adopt every current screenshot as its baseline
    pub fn update_all_baselines(&self) -> E2eResult<()> {
        for entry in std::fs::read_dir(&self.config.actual_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    self.update_baseline(&name.to_string_lossy())?;
                }
            }
        }
        Ok(())
    }

    /// List known baselines
    pub fn list_baselines(&self) -> E2eResult<Vec<String>> {
        let mut baselines = Vec::new();
        for entry in std::fs::read_dir(&self.config.baseline_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    baselines.push(name.to_string_lossy().to_string());
                }
            }
        }
        Ok(baselines)
    }
}

/// Per-pixel tolerance for anti-aliasing and compression noise
fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    const TOLERANCE: i32 = 5;

    let a_channels = a.channels();
    let b_channels = b.channels();
    for i in 0..4 {
        let diff = (a_channels[i] as i32 - b_channels[i] as i32).abs();
        if diff > TOLERANCE {
            return true;
        }
    }
    false
}

fn hash_file(path: &Path) -> E2eResult<String> {
    let data = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
