// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Support for rastering glyphs
//!
//! Glyph coverage is produced by a [`Rasterizer`]. The provided
//! [`FontRasterizer`] rasters glyphs from a font file using `ab_glyph` or
//! `fontdue` (depending on enabled features and the selected [`Backend`]);
//! other sources (pre-rendered bitmaps, test patterns) may implement the
//! trait directly.
//!
//! Every glyph is drawn onto a canvas of the full line height: the baseline
//! lies on row `ascent` and the left edge of the glyph's ink lies on column 0.
//! All glyphs of one font and size thus share the same height.

use crate::conv::area;
use crate::fonts::{FaceRef, FontData, FontError};
use easy_cast::{Cast, CastFloat, Conv, ConvFloat};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of the canvas used for glyphs without ink when no advance is known
pub const PLACEHOLDER_WIDTH: u32 = 1;

/// Glyph rastering errors
#[derive(Error, Debug)]
pub enum RasterError {
    #[error(transparent)]
    Font(#[from] FontError),
    /// The font has no glyph for this character
    #[error("font has no glyph for {0:?}")]
    MissingGlyph(char),
    /// The requested backend is not enabled in this build
    #[error("raster backend {0:?} is not enabled")]
    NoBackend(Backend),
}

/// Rastering backend
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Backend {
    /// Use `ab_glyph` (requires feature `ab_glyph`)
    #[default]
    AbGlyph,
    /// Use `fontdue` (requires feature `fontdue`)
    Fontdue,
}

impl Backend {
    /// True if support for this backend is compiled in
    pub fn is_available(self) -> bool {
        match self {
            Backend::AbGlyph => cfg!(feature = "ab_glyph"),
            Backend::Fontdue => cfg!(feature = "fontdue"),
        }
    }
}

/// Vertical metrics shared by all glyphs of a font at one size
///
/// Values are in whole pixels; both are non-negative distances from the
/// baseline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LineMetrics {
    pub ascent: u32,
    pub descent: u32,
}

impl LineMetrics {
    /// Height of every glyph canvas: `ascent + descent`
    #[inline]
    pub fn height(&self) -> u32 {
        self.ascent + self.descent
    }
}

/// Tight bounds of a glyph's ink
///
/// Offsets are in pixels relative to the glyph origin on the baseline, with
/// `y` increasing downwards (thus `top` is negative for ink above the
/// baseline).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl GlyphBounds {
    /// Width of the ink
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height of the ink
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True if the bounds enclose no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

/// A rastered glyph
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coverage {
    /// Bounds of the glyph's ink
    pub bounds: GlyphBounds,
    /// Size of the canvas in pixels
    pub size: (u32, u32),
    /// Coverage (alpha) image, row major order, length `size.0 * size.1`
    pub data: Vec<u8>,
}

impl Coverage {
    /// A canvas with no ink
    pub fn blank(width: u32, height: u32) -> Self {
        Coverage {
            bounds: GlyphBounds::default(),
            size: (width, height),
            data: vec![0; area(width, height)],
        }
    }

    /// Construct a canvas by evaluating `f(x, y)` for each pixel
    ///
    /// Bounds are set to the whole canvas (with the baseline at its bottom).
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity(area(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Coverage {
            bounds: GlyphBounds {
                left: 0,
                top: -i32::conv(height),
                right: i32::conv(width),
                bottom: 0,
            },
            size: (width, height),
            data,
        }
    }

    /// Canvas width
    #[inline]
    pub fn width(&self) -> u32 {
        self.size.0
    }

    /// Canvas height
    #[inline]
    pub fn height(&self) -> u32 {
        self.size.1
    }

    /// Coverage at `(x, y)`, or 0 outside the canvas
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.size.0 || y >= self.size.1 {
            return 0;
        }
        let index = usize::conv(y) * usize::conv(self.size.0) + usize::conv(x);
        self.data.get(index).cloned().unwrap_or(0)
    }
}

/// A source of rastered glyphs
///
/// Implementations must be deterministic: rastering the same character twice
/// yields the same coverage.
pub trait Rasterizer {
    /// Vertical metrics shared by all glyphs
    fn line_metrics(&self) -> LineMetrics;

    /// Raster a character
    ///
    /// The result has height [`LineMetrics::height`] and the width of the
    /// glyph's ink, with the ink's left edge on column 0 and the baseline on
    /// row `ascent`. A glyph without ink (e.g. space) yields a blank canvas of
    /// non-zero size rather than an error.
    fn rasterize(&self, c: char) -> Result<Coverage, RasterError>;
}

/// Rasters glyphs from a font at a fixed pixel size
pub struct FontRasterizer {
    font: FontData,
    dpem: f32,
    backend: Backend,
    metrics: LineMetrics,
    #[cfg(feature = "ab_glyph")]
    ab_glyph: ab_glyph::FontVec,
    #[cfg(feature = "fontdue")]
    fontdue: fontdue::Font,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("font", &self.font)
            .field("dpem", &self.dpem)
            .field("backend", &self.backend)
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl FontRasterizer {
    /// Construct
    ///
    /// Units: `dpem` is the nominal pixel size, in pixels per Em.
    pub fn new(font: FontData, dpem: f32, backend: Backend) -> Result<Self, RasterError> {
        if !backend.is_available() {
            return Err(RasterError::NoBackend(backend));
        }

        let metrics = font.with_face(|face| {
            let sf = face.scale_by_dpem(dpem);
            LineMetrics {
                ascent: u32::conv_ceil(sf.ascent().max(0.0)),
                descent: u32::conv_ceil((-sf.descent()).max(0.0)),
            }
        })?;
        log::debug!(
            "line metrics at {dpem} px: ascent={}, descent={}",
            metrics.ascent,
            metrics.descent
        );

        Ok(FontRasterizer {
            #[cfg(feature = "ab_glyph")]
            ab_glyph: ab_glyph::FontVec::try_from_vec_and_index(font.data().to_vec(), font.index())
                .map_err(|_| FontError::Backend("ab_glyph: invalid font"))?,
            #[cfg(feature = "fontdue")]
            fontdue: {
                let settings = fontdue::FontSettings {
                    collection_index: font.index(),
                    ..Default::default()
                };
                fontdue::Font::from_bytes(font.data(), settings).map_err(FontError::Backend)?
            },
            font,
            dpem,
            backend,
            metrics,
        })
    }

    /// The loaded font
    pub fn font(&self) -> &FontData {
        &self.font
    }

    /// Pixel size, in pixels per Em
    pub fn dpem(&self) -> f32 {
        self.dpem
    }

    /// Selected backend
    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[cfg(feature = "ab_glyph")]
    fn raster_ab(&self, c: char) -> Option<Coverage> {
        use ab_glyph::Font;

        let font = &self.ab_glyph;
        let scale = self.dpem * font.height_unscaled() / font.units_per_em()?;
        let ascent = i32::conv(self.metrics.ascent);
        let position = ab_glyph::point(0.0, f32::conv(self.metrics.ascent));
        let glyph = font.glyph_id(c).with_scale_and_position(scale, position);
        let outline = font.outline_glyph(glyph)?;

        let px = outline.px_bounds();
        let top_row = i32::conv_trunc(px.min.y);
        let bounds = GlyphBounds {
            left: px.min.x.cast_trunc(),
            top: top_row - ascent,
            right: px.max.x.cast_trunc(),
            bottom: i32::conv_trunc(px.max.y) - ascent,
        };
        if bounds.is_empty() {
            return None;
        }

        let mut coverage = Coverage::blank(bounds.width().cast(), self.metrics.height());
        coverage.bounds = bounds;
        let (width, height) = coverage.size;
        outline.draw(|x, y, c| {
            let Ok(row) = u32::try_conv(i64::from(y) + i64::from(top_row)) else {
                return;
            };
            if x < width && row < height {
                // Convert to u8 with saturating conversion, rounding down:
                coverage.data[usize::conv(row * width + x)] = (c * 256.0) as u8;
            }
        });

        Some(coverage)
    }

    #[cfg(feature = "fontdue")]
    fn raster_fontdue(&self, c: char) -> Option<Coverage> {
        let (metrics, data) = self.fontdue.rasterize(c, self.dpem);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }

        // fontdue measures ymin upwards from the baseline
        let glyph_height = i32::conv(metrics.height);
        let top = -(metrics.ymin + glyph_height);
        let bounds = GlyphBounds {
            left: metrics.xmin,
            top,
            right: metrics.xmin + i32::conv(metrics.width),
            bottom: top + glyph_height,
        };

        let mut coverage = Coverage::blank(metrics.width.cast(), self.metrics.height());
        coverage.bounds = bounds;
        let height = usize::conv(self.metrics.height());
        let first_row = i32::conv(self.metrics.ascent) + top;
        for (r, src) in data.chunks_exact(metrics.width).enumerate() {
            let Ok(row) = usize::try_conv(first_row + i32::conv(r)) else {
                continue;
            };
            if row < height {
                let start = row * metrics.width;
                coverage.data[start..start + metrics.width].copy_from_slice(src);
            }
        }

        Some(coverage)
    }

    fn raster_backend(&self, c: char) -> Result<Option<Coverage>, RasterError> {
        cfg_if::cfg_if! {
            if #[cfg(all(feature = "fontdue", feature = "ab_glyph"))] {
                Ok(match self.backend {
                    Backend::AbGlyph => self.raster_ab(c),
                    Backend::Fontdue => self.raster_fontdue(c),
                })
            } else if #[cfg(feature = "ab_glyph")] {
                Ok(self.raster_ab(c))
            } else if #[cfg(feature = "fontdue")] {
                Ok(self.raster_fontdue(c))
            } else {
                let _ = c;
                Err(RasterError::NoBackend(self.backend))
            }
        }
    }
}

impl Rasterizer for FontRasterizer {
    fn line_metrics(&self) -> LineMetrics {
        self.metrics
    }

    fn rasterize(&self, c: char) -> Result<Coverage, RasterError> {
        let face = self.font.face()?;
        let face = FaceRef(&face);
        let id = face.glyph_index(c).ok_or(RasterError::MissingGlyph(c))?;

        if let Some(coverage) = self.raster_backend(c)? {
            return Ok(coverage);
        }

        // No ink: keep the advance so that the glyph still spaces text
        let advance = face.scale_by_dpem(self.dpem).h_advance(id);
        let width = u32::conv_nearest(advance.max(0.0)).max(PLACEHOLDER_WIDTH);
        log::warn!("Zero-sized glyph: {c:?}; using blank {width}px canvas");
        Ok(Coverage::blank(width, self.metrics.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontSource;

    #[test]
    fn bounds_area() {
        let bounds = GlyphBounds {
            left: -1,
            top: -10,
            right: 5,
            bottom: 2,
        };
        assert_eq!(bounds.width(), 6);
        assert_eq!(bounds.height(), 12);
        assert!(!bounds.is_empty());
        assert!(GlyphBounds::default().is_empty());
    }

    #[test]
    fn coverage_access() {
        let cov = Coverage::from_fn(3, 2, |x, y| (x + 10 * y) as u8);
        assert_eq!(cov.data, vec![0, 1, 2, 10, 11, 12]);
        assert_eq!(cov.get(2, 1), 12);
        assert_eq!(cov.get(3, 0), 0);
        assert_eq!(cov.bounds.top, -2);
    }

    #[test]
    fn blank_canvas() {
        let cov = Coverage::blank(4, 7);
        assert_eq!(cov.data.len(), 28);
        assert!(cov.data.iter().all(|&a| a == 0));
        assert!(cov.bounds.is_empty());
    }

    #[test]
    fn line_height() {
        let m = LineMetrics {
            ascent: 59,
            descent: 16,
        };
        assert_eq!(m.height(), 75);
    }

    const DPEM: f32 = 24.0;

    /// Raster the system sans-serif font, if any is installed
    fn system_font(backend: Backend) -> Option<FontRasterizer> {
        if !backend.is_available() {
            return None;
        }
        let font = match FontData::load(&FontSource::Family("sans-serif".to_string())) {
            Ok(font) => font,
            Err(err) => {
                eprintln!("skipping: no system font ({err})");
                return None;
            }
        };
        let rasterizer = FontRasterizer::new(font, DPEM, backend).unwrap();
        assert_eq!(rasterizer.dpem(), DPEM);
        assert_eq!(rasterizer.backend(), backend);
        assert!(!rasterizer.font().data().is_empty());
        Some(rasterizer)
    }

    fn has_ink(cov: &Coverage, columns: impl Iterator<Item = u32> + Clone, rows: std::ops::Range<u32>) -> bool {
        rows.into_iter()
            .any(|y| columns.clone().any(|x| cov.get(x, y) > 0))
    }

    fn check_backend(backend: Backend) {
        let Some(r) = system_font(backend) else {
            return;
        };
        let metrics = r.line_metrics();
        assert!(metrics.ascent > 0 && metrics.descent > 0);
        let height = metrics.height();

        for c in ['A', 'g', 'x', '|', '~'] {
            let cov = r.rasterize(c).unwrap();
            assert_eq!(cov.height(), height, "{backend:?} {c:?}");
            assert!(cov.width() > 0, "{backend:?} {c:?}");
        }

        // Ink starts in column 0 and lies above the baseline
        let a = r.rasterize('A').unwrap();
        assert!(has_ink(&a, 0..1, 0..height), "{backend:?}: no ink in column 0");
        assert!(has_ink(&a, 0..a.width(), 0..metrics.ascent));
        assert!(!has_ink(&a, 0..a.width(), metrics.ascent + 1..height));

        // Descender lies below the baseline
        let g = r.rasterize('g').unwrap();
        assert!(has_ink(&g, 0..g.width(), metrics.ascent + 1..height), "{backend:?}: no descender");

        // Space has no ink but keeps its advance
        let space = r.rasterize(' ').unwrap();
        assert!(space.width() >= PLACEHOLDER_WIDTH);
        assert_eq!(space.height(), height);
        assert!(space.data.iter().all(|&a| a == 0));

        assert!(matches!(
            r.rasterize('\u{10FFFD}'),
            Err(RasterError::MissingGlyph('\u{10FFFD}'))
        ));
    }

    #[test]
    fn system_font_ab_glyph() {
        check_backend(Backend::AbGlyph);
    }

    #[test]
    fn system_font_fontdue() {
        check_backend(Backend::Fontdue);
    }

    #[cfg(all(feature = "ab_glyph", feature = "fontdue"))]
    #[test]
    fn backends_agree() {
        let (Some(ab), Some(fd)) = (system_font(Backend::AbGlyph), system_font(Backend::Fontdue)) else {
            return;
        };
        assert_eq!(ab.line_metrics(), fd.line_metrics());
        for c in ['A', 'H', 'g', 'o', '|'] {
            let a = ab.rasterize(c).unwrap();
            let b = fd.rasterize(c).unwrap();
            assert_eq!(a.height(), b.height(), "{c:?}");
            assert!(a.width().abs_diff(b.width()) <= 1, "{c:?}: {} vs {}", a.width(), b.width());
        }
    }
}
