//! Filesystem-backed dataset of labeled skin lesion images
//!
//! Scans the numbered class directories of one split (train or test),
//! records paths and labels, and decodes images on demand.

use std::path::{Path, PathBuf};

use colored::Colorize;
use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::dataset::{class_name, SkinItem, CLASS_DIRS, IMAGE_EXTENSIONS, NUM_CLASSES};
use crate::utils::error::{DermScanError, Result};

/// One labeled image on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index (see [`crate::dataset::CLASS_NAMES`])
    pub label: usize,
}

/// Per-class image counts for one split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_images: usize,
    pub class_counts: [usize; NUM_CLASSES],
}

impl DatasetStats {
    /// Print a per-class breakdown with bar charts
    pub fn print(&self) {
        let max = self.class_counts.iter().copied().max().unwrap_or(0).max(1);

        for (idx, &count) in self.class_counts.iter().enumerate() {
            let bar = "█".repeat(count * 30 / max);
            println!(
                "  {:>10} {:>6}  {}",
                class_name(idx).unwrap_or("?"),
                count,
                bar.cyan()
            );
        }
        println!("  {:>10} {:>6}", "total", self.total_images);
    }
}

/// Dataset of skin lesion images for one split
#[derive(Debug, Clone)]
pub struct SkinDataset {
    /// All samples, ordered by class then path
    pub samples: Vec<ImageSample>,
    /// Split root the samples were scanned from
    pub root: PathBuf,
    /// Side length images are resized to when loaded
    pub image_size: usize,
}

impl SkinDataset {
    /// Scan a split directory for labeled images.
    ///
    /// Class directories listed in [`CLASS_DIRS`] that are missing are
    /// skipped. Non-image files are ignored. Within each class, samples
    /// are sorted by path so the dataset order is deterministic.
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(DermScanError::PathNotFound(root.to_path_buf()));
        }

        let mut samples = Vec::new();

        for (label, class_dir) in CLASS_DIRS.iter().enumerate() {
            let dir = root.join(class_dir);
            if !dir.is_dir() {
                debug!("Class directory not found, skipping: {}", dir.display());
                continue;
            }

            let mut paths: Vec<PathBuf> = WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_image_file(path))
                .collect();

            paths.sort();
            samples.extend(paths.into_iter().map(|path| ImageSample { path, label }));
        }

        if samples.is_empty() {
            return Err(DermScanError::Dataset(format!(
                "No images found under {}",
                root.display()
            )));
        }

        debug!("Scanned {} images from {}", samples.len(), root.display());

        Ok(Self {
            samples,
            root: root.to_path_buf(),
            image_size: crate::IMAGE_SIZE,
        })
    }

    /// Set the side length images are resized to when loaded
    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    /// Number of samples in the dataset
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset contains no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Shuffle the sample order with a seeded RNG
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.samples.shuffle(&mut rng);
    }

    /// Per-class image counts
    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = [0usize; NUM_CLASSES];
        for sample in &self.samples {
            if sample.label < NUM_CLASSES {
                class_counts[sample.label] += 1;
            }
        }

        DatasetStats {
            total_images: self.samples.len(),
            class_counts,
        }
    }

    /// Load and decode the sample at `index`
    pub fn load_item(&self, index: usize) -> Result<SkinItem> {
        let sample = self.samples.get(index).ok_or_else(|| {
            DermScanError::Dataset(format!(
                "Sample index {} out of range (dataset has {} samples)",
                index,
                self.samples.len()
            ))
        })?;

        let pixels = load_image_data(&sample.path, self.image_size)?;

        Ok(SkinItem {
            pixels,
            label: sample.label,
        })
    }
}

/// Decode an image, resize it to `size` x `size`, and return CHW float data
/// scaled to `[0, 1]`.
pub fn load_image_data(path: &Path, size: usize) -> Result<Vec<f32>> {
    let img = ImageReader::open(path)
        .map_err(|e| DermScanError::image_load(path, e))?
        .decode()
        .map_err(|e| DermScanError::image_load(path, e))?;

    let resized = img.resize_exact(size as u32, size as u32, FilterType::Triangle);
    Ok(image_to_chw(&resized.to_rgb8()))
}

/// Convert an RGB image to CHW-ordered floats in `[0, 1]`
pub fn image_to_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let (w, h) = (width as usize, height as usize);
    let mut data = vec![0.0f32; 3 * h * w];

    for y in 0..h {
        for x in 0..w {
            let px = img.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                data[c * h * w + y * w + x] = px[c] as f32 / 255.0;
            }
        }
    }

    data
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
