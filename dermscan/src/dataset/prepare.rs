//! Dataset preparation: bulk-rename images to a canonical scheme
//!
//! Renames every image under the class directories of both splits to
//! `{class_dir}_{index}_{timestamp}.{ext}`, with indices starting at 1
//! per class. A single timestamp is taken per run, so all files renamed
//! in one invocation share it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::dataset::{CLASS_DIRS, IMAGE_EXTENSIONS, TEST_DIR, TRAIN_DIR};

/// Rename counts for one class directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRenameStat {
    /// Class directory, prefixed with the split (e.g. `train/1.Eczema`)
    pub class_dir: String,
    /// Number of files renamed
    pub renamed: usize,
}

/// Summary of a rename run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameStats {
    pub per_class: Vec<ClassRenameStat>,
    pub total_renamed: usize,
    pub missing_dirs: usize,
}

impl RenameStats {
    fn merge(&mut self, other: RenameStats) {
        self.per_class.extend(other.per_class);
        self.total_renamed += other.total_renamed;
        self.missing_dirs += other.missing_dirs;
    }
}

/// Rename all images under `root/train` and `root/test`.
///
/// Class directories that do not exist are skipped silently and counted
/// in [`RenameStats::missing_dirs`].
pub fn rename_dataset(root: &Path) -> Result<RenameStats> {
    let timestamp = Utc::now().timestamp();
    let mut stats = RenameStats::default();

    for split in [TRAIN_DIR, TEST_DIR] {
        let mut split_stats = rename_split_at(&root.join(split), timestamp)?;
        for stat in &mut split_stats.per_class {
            stat.class_dir = format!("{}/{}", split, stat.class_dir);
        }
        stats.merge(split_stats);
    }

    Ok(stats)
}

/// Rename all images under the class directories of a single split
pub fn rename_split(root: &Path) -> Result<RenameStats> {
    rename_split_at(root, Utc::now().timestamp())
}

fn rename_split_at(root: &Path, timestamp: i64) -> Result<RenameStats> {
    let mut stats = RenameStats::default();

    for class_dir in CLASS_DIRS {
        let dir = root.join(class_dir);
        if !dir.is_dir() {
            stats.missing_dirs += 1;
            continue;
        }

        // (path, lowercased extension) pairs, sorted by path so index
        // assignment is deterministic
        let mut files: Vec<(PathBuf, String)> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let path = entry.into_path();
                let ext = path.extension()?.to_str()?.to_lowercase();
                IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some((path, ext))
            })
            .collect();

        files.sort();

        for (idx, (path, ext)) in files.iter().enumerate() {
            let new_name = format!("{}_{}_{}.{}", class_dir, idx + 1, timestamp, ext);
            fs::rename(path, dir.join(&new_name))
                .with_context(|| format!("Failed to rename {} to {}", path.display(), new_name))?;
        }

        debug!("Renamed {} files in {}", files.len(), dir.display());

        stats.per_class.push(ClassRenameStat {
            class_dir: class_dir.to_string(),
            renamed: files.len(),
        });
        stats.total_renamed += files.len();
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_rename_dataset() {
        let dir = TempDir::new().unwrap();
        let eczema = dir.path().join(TRAIN_DIR).join(CLASS_DIRS[0]);
        let benign = dir.path().join(TEST_DIR).join(CLASS_DIRS[3]);
        std::fs::create_dir_all(&eczema).unwrap();
        std::fs::create_dir_all(&benign).unwrap();

        touch(&eczema.join("b.jpg"));
        touch(&eczema.join("a.png"));
        touch(&eczema.join("notes.txt"));
        touch(&benign.join("x.JPG"));

        let stats = rename_dataset(dir.path()).unwrap();

        assert_eq!(stats.total_renamed, 3);
        assert_eq!(stats.missing_dirs, 8);
        assert_eq!(stats.per_class.len(), 2);
        assert!(stats
            .per_class
            .iter()
            .any(|s| s.class_dir == "train/1.Eczema" && s.renamed == 2));
        assert!(stats
            .per_class
            .iter()
            .any(|s| s.class_dir == "test/4.Benign" && s.renamed == 1));

        // Sorted source order: a.png gets index 1, b.jpg index 2
        let eczema_names = names(&eczema);
        assert!(eczema_names
            .iter()
            .any(|n| n.starts_with("1.Eczema_1_") && n.ends_with(".png")));
        assert!(eczema_names
            .iter()
            .any(|n| n.starts_with("1.Eczema_2_") && n.ends_with(".jpg")));
        assert!(eczema_names.contains(&"notes.txt".to_string()));

        // Extension is lowercased
        let benign_names = names(&benign);
        assert!(benign_names[0].starts_with("4.Benign_1_"));
        assert!(benign_names[0].ends_with(".jpg"));
    }

    #[test]
    fn test_rename_shares_one_timestamp_across_splits() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join(TRAIN_DIR).join(CLASS_DIRS[1]);
        let test = dir.path().join(TEST_DIR).join(CLASS_DIRS[1]);
        std::fs::create_dir_all(&train).unwrap();
        std::fs::create_dir_all(&test).unwrap();
        touch(&train.join("a.jpg"));
        touch(&test.join("b.jpg"));

        rename_dataset(dir.path()).unwrap();

        let stamp = |d: &Path| -> String {
            names(d)[0]
                .trim_end_matches(".jpg")
                .rsplit('_')
                .next()
                .unwrap()
                .to_string()
        };

        assert_eq!(stamp(&train), stamp(&test));
    }

    #[test]
    fn test_missing_split_is_not_an_error() {
        let dir = TempDir::new().unwrap();

        let stats = rename_split(&dir.path().join("nope")).unwrap();

        assert_eq!(stats.total_renamed, 0);
        assert_eq!(stats.missing_dirs, CLASS_DIRS.len());
        assert!(stats.per_class.is_empty());
    }

    #[test]
    fn test_rerun_is_safe() {
        let dir = TempDir::new().unwrap();
        let acne = dir.path().join(CLASS_DIRS[1]);
        std::fs::create_dir_all(&acne).unwrap();
        touch(&acne.join("img.jpg"));

        let first = rename_split(dir.path()).unwrap();
        let second = rename_split(dir.path()).unwrap();

        assert_eq!(first.total_renamed, 1);
        assert_eq!(second.total_renamed, 1);
        assert_eq!(names(&acne).len(), 1);
        assert!(names(&acne)[0].starts_with("2.Acne_1_"));
    }
}
