// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use image::RgbImage;

/// A captured video frame handed over by the observation source.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Frame { image }
    }

    /// Solid black frame, used by sources that have no real camera behind them.
    pub fn blank(width: u32, height: u32) -> Self {
        Frame {
            image: RgbImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
