//! Output directory organization

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Manages the converter's output directory structure
///
/// ```text
/// <root>/data/<track>.json(.gz)
/// <root>/mixdown/<track>.mp3
/// <root>/demixed/<track>/<stem>.mp3
/// ```
///
/// Only `data/` is written here; the audio directories are filled by the
/// transcoding step and read back when probing durations.
#[derive(Debug, Clone)]
pub struct OutputOrganizer {
    root: PathBuf,
    data_dir: PathBuf,
    mixdown_dir: PathBuf,
    demixed_dir: PathBuf,
}

impl OutputOrganizer {
    pub fn new(root: PathBuf) -> Self {
        let data_dir = root.join("data");
        let mixdown_dir = root.join("mixdown");
        let demixed_dir = root.join("demixed");

        Self {
            root,
            data_dir,
            mixdown_dir,
            demixed_dir,
        }
    }

    /// Create the output directory structure
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", self.data_dir))?;
        fs::create_dir_all(&self.mixdown_dir).with_context(|| {
            format!("Failed to create mixdown directory {:?}", self.mixdown_dir)
        })?;
        fs::create_dir_all(&self.demixed_dir).with_context(|| {
            format!("Failed to create demixed directory {:?}", self.demixed_dir)
        })?;

        log::debug!("Output directory structure ready at {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the gzip-compressed record
    pub fn record_gz_path(&self, track_name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json.gz", track_name))
    }

    /// Path of the plain JSON record
    pub fn record_json_path(&self, track_name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", track_name))
    }

    /// Transcoded full mix from an earlier run
    pub fn mixdown_path(&self, track_name: &str) -> PathBuf {
        self.mixdown_dir.join(format!("{}.mp3", track_name))
    }

    /// Transcoded stem from an earlier run
    pub fn demixed_stem_path(&self, track_name: &str, stem: &str) -> PathBuf {
        self.demixed_dir
            .join(track_name)
            .join(format!("{}.mp3", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let organizer = OutputOrganizer::new(PathBuf::from("/out"));
        assert_eq!(
            organizer.record_gz_path("song"),
            PathBuf::from("/out/data/song.json.gz")
        );
        assert_eq!(
            organizer.mixdown_path("song"),
            PathBuf::from("/out/mixdown/song.mp3")
        );
        assert_eq!(
            organizer.demixed_stem_path("song", "bass"),
            PathBuf::from("/out/demixed/song/bass.mp3")
        );
    }

    #[test]
    fn test_init_creates_directories() {
        let temp = TempDir::new().unwrap();
        let organizer = OutputOrganizer::new(temp.path().join("out"));
        organizer.init().unwrap();

        assert!(temp.path().join("out/data").is_dir());
        assert!(temp.path().join("out/mixdown").is_dir());
        assert!(temp.path().join("out/demixed").is_dir());
    }
}
