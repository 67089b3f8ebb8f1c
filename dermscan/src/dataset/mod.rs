//! Dataset Module for Skin Lesion Images
//!
//! Handles loading, batching, and preparation of the skin lesion dataset.
//! The dataset root is expected to contain a `train/` and a `test/` split,
//! each with one numbered directory per class:
//!
//! ```text
//! data/skin/
//! ├── train/
//! │   ├── 1.Eczema/
//! │   ├── 2.Acne/
//! │   ├── 3.Pigment/
//! │   ├── 4.Benign/
//! │   └── 5.Malign/
//! └── test/
//!     ├── 1.Eczema/
//!     └── ...
//! ```

pub mod batcher;
pub mod loader;
pub mod prepare;

// Re-export main types for convenience
pub use batcher::{SkinBatch, SkinBatcher, SkinItem};
pub use loader::{DatasetStats, ImageSample, SkinDataset};
pub use prepare::{rename_dataset, rename_split, RenameStats};

/// Number of lesion classes
pub const NUM_CLASSES: usize = 5;

/// Human-readable class names, indexed by label
pub const CLASS_NAMES: [&str; NUM_CLASSES] = ["Eczema", "Acne", "Pigment", "Benign", "Malignant"];

/// On-disk directory name per class. The numeric prefix pins the label
/// order, so label indices stay stable regardless of filesystem ordering.
pub const CLASS_DIRS: [&str; NUM_CLASSES] =
    ["1.Eczema", "2.Acne", "3.Pigment", "4.Benign", "5.Malign"];

/// Name of the training split directory
pub const TRAIN_DIR: &str = "train";

/// Name of the test split directory
pub const TEST_DIR: &str = "test";

/// Recognized image file extensions (lowercase)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Get the class name for a label index
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Get the label index for a class name
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_NAMES.iter().position(|&n| n == name)
}
