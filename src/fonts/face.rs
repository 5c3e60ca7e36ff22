// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font face types

use crate::conv::DPU;
use ttf_parser::{Face, GlyphId};

/// Handle to a parsed font face
#[derive(Copy, Clone, Debug)]
pub struct FaceRef<'a>(pub(crate) &'a Face<'a>);

impl<'a> FaceRef<'a> {
    /// Get glyph identifier for a char
    ///
    /// Returns `None` if the face has no glyph for `c`. (GlyphId 0 is the
    /// 'missing glyph' and is never returned here.)
    #[inline]
    pub fn glyph_index(&self, c: char) -> Option<GlyphId> {
        self.0.glyph_index(c).filter(|id| id.0 != 0)
    }

    /// Convert `dpem` to `dpu`
    ///
    /// Output: a font-specific scale.
    ///
    /// Input: `dpem` is pixels/em (the nominal pixel size of the atlas).
    #[inline]
    pub fn dpu(self, dpem: f32) -> DPU {
        DPU(dpem / f32::from(self.0.units_per_em()))
    }

    /// Get a scaled reference
    ///
    /// Units: `dpem` is dots (pixels) per Em.
    #[inline]
    pub fn scale_by_dpem(self, dpem: f32) -> ScaledFaceRef<'a> {
        ScaledFaceRef(self.0, self.dpu(dpem))
    }
}

/// Handle to a parsed font face with a pixel scale
#[derive(Copy, Clone, Debug)]
pub struct ScaledFaceRef<'a>(&'a Face<'a>, DPU);

impl<'a> ScaledFaceRef<'a> {
    /// Horizontal advancement after this glyph, without shaping or kerning
    ///
    /// If unspecified by the font this resolves to 0.
    #[inline]
    pub fn h_advance(&self, id: GlyphId) -> f32 {
        let x = self.0.glyph_hor_advance(id).unwrap_or(0);
        self.1.u16_to_px(x)
    }

    /// Ascender (positive, above the baseline)
    #[inline]
    pub fn ascent(&self) -> f32 {
        self.1.i16_to_px(self.0.ascender())
    }

    /// Descender (usually negative, below the baseline)
    #[inline]
    pub fn descent(&self) -> f32 {
        self.1.i16_to_px(self.0.descender())
    }
}
