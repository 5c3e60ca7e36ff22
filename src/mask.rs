// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph coverage masks

use crate::conv::area;
use crate::raster::{Coverage, PLACEHOLDER_WIDTH};
use easy_cast::Conv;

/// Coverage above this value counts as ink
///
/// This is the midpoint of the 8-bit coverage range.
pub const COVERAGE_THRESHOLD: u8 = 128;

/// A boolean glyph mask
///
/// Marks which pixels are "ink" for the purposes of the distance transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl GlyphMask {
    /// Construct an empty (all background) mask
    pub fn new(width: u32, height: u32) -> Self {
        GlyphMask {
            width,
            height,
            data: vec![false; area(width, height)],
        }
    }

    /// Construct by evaluating `f(x, y)` for each pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(area(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        GlyphMask {
            width,
            height,
            data,
        }
    }

    /// Threshold a coverage raster
    ///
    /// A pixel is inside the glyph if its coverage exceeds
    /// [`COVERAGE_THRESHOLD`].
    pub fn from_coverage(coverage: &Coverage) -> Self {
        GlyphMask::from_fn(coverage.width(), coverage.height(), |x, y| {
            coverage.get(x, y) > COVERAGE_THRESHOLD
        })
    }

    /// A minimal blank mask
    ///
    /// Used in place of a degenerate mask so that every glyph occupies some
    /// space in the atlas. `height` is normally the line height; the result
    /// is never smaller than 1×1.
    pub fn placeholder(height: u32) -> Self {
        GlyphMask::new(PLACEHOLDER_WIDTH, height.max(1))
    }

    /// Width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True if the mask has no pixels
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixels in row major order
    #[inline]
    pub fn pixels(&self) -> &[bool] {
        &self.data
    }

    /// Whether `(x, y)` is ink; false outside the mask
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.index(x, y)]
    }

    /// Set whether `(x, y)` is ink
    ///
    /// Panics if `(x, y)` is outside the mask.
    pub fn set(&mut self, x: u32, y: u32, inside: bool) {
        assert!(x < self.width && y < self.height, "GlyphMask: ({x}, {y}) out of bounds");
        let index = self.index(x, y);
        self.data[index] = inside;
    }

    /// Number of ink pixels
    pub fn count_inside(&self) -> usize {
        self.data.iter().filter(|inside| **inside).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        usize::conv(y) * usize::conv(self.width) + usize::conv(x)
    }
}
