// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Debug images of what a scan actually looked at

use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Receives the cropped region and every preprocessing variant of a scan
///
/// Best effort: implementations log their own failures and never abort a scan.
pub trait DebugArtifactSink {
    fn save_region(&mut self, region: &RgbImage);

    fn save_variants(&mut self, variants: &[DynamicImage]);
}

/// Writes `debug_original_roi.png` and `debug_preprocess_{i}.png`, overwriting
/// the previous scan's files
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSink {
    dir: PathBuf,
}

impl DirectoryArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> bool {
        match std::fs::create_dir_all(&self.dir) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "[ARTIFACTS] Cannot create {}: {}",
                    self.dir.display(),
                    e
                );
                false
            }
        }
    }

    fn write(&self, name: &str, image: &DynamicImage) {
        let path = self.dir.join(name);
        match image.save(&path) {
            Ok(()) => debug!("[ARTIFACTS] Saved {}", path.display()),
            Err(e) => warn!("[ARTIFACTS] Failed to save {}: {}", path.display(), e),
        }
    }
}

impl DebugArtifactSink for DirectoryArtifactSink {
    fn save_region(&mut self, region: &RgbImage) {
        if self.ensure_dir() {
            self.write(
                "debug_original_roi.png",
                &DynamicImage::ImageRgb8(region.clone()),
            );
        }
    }

    fn save_variants(&mut self, variants: &[DynamicImage]) {
        if !self.ensure_dir() {
            return;
        }
        for (i, variant) in variants.iter().enumerate() {
            self.write(&format!("debug_preprocess_{}.png", i), variant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_writes_region_and_variants() {
        let temp = tempfile::tempdir().unwrap();
        let mut sink = DirectoryArtifactSink::new(temp.path().join("debug"));

        sink.save_region(&RgbImage::new(6, 4));
        sink.save_variants(&[
            DynamicImage::ImageLuma8(GrayImage::new(6, 4)),
            DynamicImage::ImageRgb8(RgbImage::new(6, 4)),
        ]);

        let dir = sink.dir();
        assert!(dir.join("debug_original_roi.png").exists());
        assert!(dir.join("debug_preprocess_0.png").exists());
        assert!(dir.join("debug_preprocess_1.png").exists());

        let reloaded = image::open(dir.join("debug_original_roi.png")).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (6, 4));
    }

    #[test]
    fn test_unwritable_dir_is_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut sink = DirectoryArtifactSink::new(blocker.join("debug"));
        sink.save_region(&RgbImage::new(2, 2));
        sink.save_variants(&[DynamicImage::ImageRgb8(RgbImage::new(2, 2))]);
        assert!(!blocker.join("debug").exists());
    }
}
