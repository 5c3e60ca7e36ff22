// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Signed distance fields
//!
//! A [`GlyphMask`] is converted to an [`SdfRaster`] in four steps:
//!
//! 1.  Exact Euclidean distance transforms give, for each ink pixel, the
//!     distance to the nearest background pixel and, for each background
//!     pixel, the distance to the nearest ink pixel. Pixels outside the mask
//!     count as background, so ink touching the mask edge still has a
//!     boundary there.
//! 2.  The signed distance is `inside − outside`: positive on ink, negative
//!     on background. Distances are measured between pixel centres, thus the
//!     glyph edge lies halfway between an ink pixel (`+1`) and its background
//!     neighbour (`−1`).
//! 3.  The signed distance is normalized to `[0, 1]` over the field radius
//!     `R`: `clamp((d + R) / 2R, 0, 1)`.
//! 4.  Optionally, a [`smoothstep`] between two edge thresholds concentrates
//!     the encoded range near the glyph edge. The result is scaled to
//!     `[0, 255]` and truncated.
//!
//! Distance transforms use the lower-envelope-of-parabolas algorithm of
//! Felzenszwalb and Huttenlocher, applied to columns then rows.

use crate::config::ConfigError;
use crate::conv::area;
use crate::mask::GlyphMask;
use easy_cast::{Conv, ConvFloat};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default field radius, in pixels
pub const DEFAULT_RADIUS: f32 = 3.0;
/// Default lower smoothstep edge
pub const DEFAULT_EDGE_DOWN: f32 = 0.35;
/// Default upper smoothstep edge
pub const DEFAULT_EDGE_UP: f32 = 0.75;

/// Stand-in for an infinite squared distance
///
/// Must stay finite: the envelope computation subtracts these values.
const FAR: f64 = 1e20;

/// Distance transform errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    /// The mask has no pixels
    #[error("degenerate {width}×{height} mask")]
    Degenerate { width: u32, height: u32 },
}

/// Smoothstep thresholds, on the normalized `[0, 1]` scale
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeThresholds {
    pub down: f32,
    pub up: f32,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        EdgeThresholds {
            down: DEFAULT_EDGE_DOWN,
            up: DEFAULT_EDGE_UP,
        }
    }
}

/// Distance field parameters
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SdfParams {
    /// Field radius `R`, in pixels
    ///
    /// Distances from the glyph edge beyond `R` saturate to 0 or 255.
    pub radius: f32,
    /// Edge sharpening, if any
    pub sharpen: Option<EdgeThresholds>,
}

impl Default for SdfParams {
    fn default() -> Self {
        SdfParams {
            radius: DEFAULT_RADIUS,
            sharpen: Some(EdgeThresholds::default()),
        }
    }
}

impl SdfParams {
    /// Construct with edge sharpening
    pub fn new(radius: f32, edge_down: f32, edge_up: f32) -> Self {
        SdfParams {
            radius,
            sharpen: Some(EdgeThresholds {
                down: edge_down,
                up: edge_up,
            }),
        }
    }

    /// Construct without edge sharpening
    pub fn without_sharpening(radius: f32) -> Self {
        SdfParams {
            radius,
            sharpen: None,
        }
    }

    /// Check that parameters are usable
    ///
    /// Requires `radius > 0` and `0 ≤ edge_down < edge_up ≤ 1`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(ConfigError::Radius(self.radius));
        }
        if let Some(EdgeThresholds { down, up }) = self.sharpen {
            if !(0.0 <= down && down < up && up <= 1.0) {
                return Err(ConfigError::EdgeThresholds { down, up });
            }
        }
        Ok(())
    }

    /// Map a signed distance to an 8-bit field value
    pub fn field_value(&self, distance: f64) -> u8 {
        let mut value = normalize(distance, self.radius.into());
        if let Some(edges) = self.sharpen {
            value = smoothstep(edges.down.into(), edges.up.into(), value);
        }
        u8::conv_trunc((value * 255.0).clamp(0.0, 255.0))
    }
}

/// An 8-bit signed distance field
///
/// Values above 127 lie (roughly) inside the glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SdfRaster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl SdfRaster {
    /// Construct from row major pixel data
    ///
    /// Returns `None` unless `data.len() == width * height`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == area(width, height)).then_some(SdfRaster {
            width,
            height,
            data,
        })
    }

    /// Construct by evaluating `f(x, y)` for each pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity(area(width, height));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        SdfRaster {
            width,
            height,
            data,
        }
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

    /// Pixels in row major order
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Take the pixel data
    pub fn into_pixels(self) -> Vec<u8> {
        self.data
    }

    /// Value at `(x, y)`
    ///
    /// Panics if `(x, y)` is outside the raster.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "SdfRaster: ({x}, {y}) out of bounds");
        self.data[usize::conv(y) * usize::conv(self.width) + usize::conv(x)]
    }
}

/// Cubic smoothstep: 0 for `x ≤ edge0`, 1 for `x ≥ edge1`
///
/// Requires `edge0 < edge1`.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Normalize a signed distance over `radius` to `[0, 1]`
pub fn normalize(distance: f64, radius: f64) -> f64 {
    ((distance + radius) / (2.0 * radius)).clamp(0.0, 1.0)
}

/// Compute the signed distance of each pixel, row major
///
/// Positive on ink, negative on background. Where the mask has no ink at all,
/// background distances are effectively infinite.
pub fn signed_distance(mask: &GlyphMask) -> Vec<f64> {
    let width = usize::conv(mask.width());
    let height = usize::conv(mask.height());
    // One pixel of background padding on each side
    let pw = width + 2;
    let ph = height + 2;

    let mut to_background = vec![0.0; pw * ph];
    let mut to_ink = vec![FAR; pw * ph];
    for (y, row) in mask.pixels().chunks_exact(width.max(1)).enumerate() {
        for (x, inside) in row.iter().enumerate() {
            if *inside {
                let p = (y + 1) * pw + x + 1;
                to_background[p] = FAR;
                to_ink[p] = 0.0;
            }
        }
    }

    squared_distance(pw, ph, &mut to_background);
    squared_distance(pw, ph, &mut to_ink);

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let p = (y + 1) * pw + x + 1;
            out.push(to_background[p].sqrt() - to_ink[p].sqrt());
        }
    }
    out
}

/// Compute the distance field of a mask
///
/// The result has the dimensions of `mask`. Fails only for a degenerate
/// (zero-area) mask; empty and completely filled masks are valid.
pub fn distance_field(mask: &GlyphMask, params: &SdfParams) -> Result<SdfRaster, TransformError> {
    if mask.is_degenerate() {
        return Err(TransformError::Degenerate {
            width: mask.width(),
            height: mask.height(),
        });
    }

    let data = signed_distance(mask)
        .into_iter()
        .map(|d| params.field_value(d))
        .collect();
    Ok(SdfRaster {
        width: mask.width(),
        height: mask.height(),
        data,
    })
}

/// In-place 2D squared distance transform of a `width × height` grid
///
/// On input, `grid` holds 0 at source pixels and [`FAR`] elsewhere.
fn squared_distance(width: usize, height: usize, grid: &mut [f64]) {
    let n = width.max(height);
    let mut f = vec![0.0; n];
    let mut d = vec![0.0; n];
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];

    for x in 0..width {
        for y in 0..height {
            f[y] = grid[y * width + x];
        }
        transform_1d(&f[..height], &mut d[..height], &mut v, &mut z);
        for y in 0..height {
            grid[y * width + x] = d[y];
        }
    }

    for row in grid.chunks_exact_mut(width) {
        f[..width].copy_from_slice(row);
        transform_1d(&f[..width], &mut d[..width], &mut v, &mut z);
        row.copy_from_slice(&d[..width]);
    }
}

/// 1D squared distance transform of the sampled function `f`
///
/// `v` and `z` are scratch space of at least `f.len()` and `f.len() + 1`.
fn transform_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    // Intersection of the parabolas rooted at q and p
    let meet = |q: usize, p: usize| {
        let (qf, pf) = (q as f64, p as f64);
        ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
    };

    let mut k = 0;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = meet(q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = meet(q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        *out = dq * dq + f[v[k]];
    }
}
