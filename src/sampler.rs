//! Pixel Sampler module
//!
//! Downsamples a decoded image to a fixed `size x size` RGB grid so that the
//! analysis cost does not depend on the source resolution.

use image::imageops::{self, FilterType};
use image::DynamicImage;

/// Default sampling grid edge length
pub const DEFAULT_SAMPLE_SIZE: u32 = 64;

/// Downsampled RGB pixels of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl PixelGrid {
    /// Create a grid from row-major pixels
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGB triples
    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Resize-then-sample pixel extractor
#[derive(Debug, Clone, Copy)]
pub struct PixelSampler {
    size: u32,
    filter: FilterType,
}

impl Default for PixelSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl PixelSampler {
    /// Create a sampler producing `size x size` grids (minimum 1)
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1),
            filter: FilterType::CatmullRom,
        }
    }

    /// Grid edge length
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resize the image to the sampling grid and extract its RGB pixels
    pub fn sample(&self, image: &DynamicImage) -> PixelGrid {
        let rgb = image.to_rgb8();
        let resized = imageops::resize(&rgb, self.size, self.size, self.filter);
        let pixels = resized.pixels().map(|p| p.0).collect();
        PixelGrid::new(self.size, self.size, pixels)
    }
}
