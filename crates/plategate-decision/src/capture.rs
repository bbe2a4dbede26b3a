// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Capture Boundary
//!
//! Traits for the collaborators that feed the decision loop: where frames come
//! from, how the plate region is turned into preprocessing variants, and which
//! engine reads text out of each variant. Only the region-of-interest geometry
//! is implemented here; cameras and OCR engines live outside this crate.

use image::{imageops, DynamicImage, RgbImage};
use plategate_config::CaptureConfig;
use plategate_structures::{CaptureError, Frame, Hypothesis, RecognitionError};

/// Produces frames for the decision loop
pub trait ObservationSource {
    /// Acquire the underlying device before the first frame.
    /// `SourceUnavailable` here stops the loop before it starts.
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Grab the next frame. `FrameUnavailable` is retried by the loop,
    /// `SourceUnavailable` ends it.
    fn next_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release the underlying device. Must be idempotent.
    fn release(&mut self);
}

/// Turns the cropped plate region into one or more images to recognize
pub trait Preprocessor {
    fn variants(&mut self, region: &RgbImage) -> Vec<DynamicImage>;
}

/// Hands the region through untouched, as a single variant
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughPreprocessor;

impl Preprocessor for PassthroughPreprocessor {
    fn variants(&mut self, region: &RgbImage) -> Vec<DynamicImage> {
        vec![DynamicImage::ImageRgb8(region.clone())]
    }
}

/// Text recognizer, run once per preprocessing variant
pub trait RecognitionEngine {
    fn recognize(&mut self, image: &DynamicImage) -> Result<Vec<Hypothesis>, RecognitionError>;
}

/// Pixel rectangle inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Centered plate region, sized as a fraction of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionOfInterest {
    width_fraction: f64,
    height_fraction: f64,
    padding: u32,
}

impl Default for RegionOfInterest {
    fn default() -> Self {
        Self::from_config(&CaptureConfig::default())
    }
}

impl RegionOfInterest {
    pub fn new(width_fraction: f64, height_fraction: f64, padding: u32) -> Self {
        Self {
            width_fraction: width_fraction.clamp(0.0, 1.0),
            height_fraction: height_fraction.clamp(0.0, 1.0),
            padding,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            config.roi_width_fraction,
            config.roi_height_fraction,
            config.padding,
        )
    }

    /// Unpadded region, centered, truncated to whole pixels
    pub fn bounds(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let width = (f64::from(frame_width) * self.width_fraction) as u32;
        let height = (f64::from(frame_height) * self.height_fraction) as u32;
        PixelRect {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        }
    }

    /// Region grown by `padding` on every side, clamped to the frame
    pub fn padded_bounds(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let base = self.bounds(frame_width, frame_height);
        let x = base.x.saturating_sub(self.padding);
        let y = base.y.saturating_sub(self.padding);
        let grown_width = base.width.saturating_add(self.padding.saturating_mul(2));
        let grown_height = base.height.saturating_add(self.padding.saturating_mul(2));
        PixelRect {
            x,
            y,
            width: grown_width.min(frame_width - x),
            height: grown_height.min(frame_height - y),
        }
    }

    /// Copy the padded region out of the frame
    pub fn crop(&self, frame: &Frame) -> RgbImage {
        let rect = self.padded_bounds(frame.width(), frame.height());
        imageops::crop_imm(frame.image(), rect.x, rect.y, rect.width, rect.height).to_image()
    }
}
