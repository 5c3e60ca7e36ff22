// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Atlas build pipeline
//!
//! Each glyph passes through the stages raster → mask → distance field →
//! encode independently of all others; the encoded glyphs are then appended
//! to an [`AtlasBuilder`] in ascending code order. With feature `parallel`,
//! per-glyph work runs on the `rayon` thread pool. The result is identical
//! either way.

use crate::atlas::{glyph_chars, Atlas, AtlasBuilder, LayoutError, GLYPH_COUNT};
use crate::codec::{self, CodecError, CodecMode, EncodedGlyph};
use crate::config::{Config, ConfigError};
use crate::fonts::{FontData, FontError};
use crate::mask::GlyphMask;
use crate::raster::{FontRasterizer, RasterError, Rasterizer};
use crate::sdf::{self, SdfParams, TransformError};
use thiserror::Error;

/// Failure processing a single glyph
#[derive(Error, Debug)]
pub enum GlyphError {
    #[error("raster failed")]
    Raster(#[from] RasterError),
    #[error("distance transform failed")]
    Transform(#[from] TransformError),
    #[error("encoding failed")]
    Codec(#[from] CodecError),
    #[error("layout failed")]
    Layout(#[from] LayoutError),
}

/// Failure building an atlas
///
/// No partial atlas is produced.
#[derive(Error, Debug)]
#[error("failed to build glyph {char_code}")]
pub struct BuildError {
    /// Code of the first glyph (in code order) which failed
    pub char_code: u32,
    #[source]
    pub source: GlyphError,
}

/// Failure of [`build_from_config`]
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("failed to load font")]
    Font(#[from] FontError),
    #[error("failed to prepare rasterizer")]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Raster, transform and encode one glyph
///
/// A glyph whose mask has no pixels is replaced by
/// [`GlyphMask::placeholder`] of the line height.
pub fn process_glyph<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    c: char,
    params: &SdfParams,
    mode: CodecMode,
) -> Result<EncodedGlyph, GlyphError> {
    let coverage = rasterizer.rasterize(c)?;
    let mut mask = GlyphMask::from_coverage(&coverage);
    if mask.is_degenerate() {
        let height = rasterizer.line_metrics().height();
        log::warn!(
            "Degenerate mask for {c:?} ({}×{}); using placeholder",
            mask.width(),
            mask.height()
        );
        mask = GlyphMask::placeholder(height);
    }

    let field = sdf::distance_field(&mask, params)?;
    let glyph = codec::encode(mode, &field)?;
    log::debug!(
        "glyph {} {c:?}: {}×{}, {} bytes",
        u32::from(c),
        glyph.width(),
        glyph.height(),
        glyph.len()
    );
    Ok(glyph)
}

/// Build an atlas of all glyphs
///
/// Glyphs are appended in ascending code order regardless of the order in
/// which they are processed. On failure the error names the lowest failing
/// character code.
pub fn build_atlas<R: Rasterizer + Sync + ?Sized>(
    rasterizer: &R,
    params: &SdfParams,
    mode: CodecMode,
) -> Result<Atlas, BuildError> {
    log::info!("building atlas of {GLYPH_COUNT} glyphs ({mode:?})");

    let result = assemble(rasterizer, params, mode);
    match &result {
        Ok(atlas) => {
            let pixels = atlas.pixel_count();
            let bytes = atlas.data().len();
            log::info!(
                "built atlas: {GLYPH_COUNT} glyphs, {pixels} pixels in {bytes} bytes (ratio {:.2})",
                pixels as f64 / bytes.max(1) as f64
            );
        }
        Err(err) => log::error!("atlas build aborted at glyph {}: {err:?}", err.char_code),
    }
    result
}

fn assemble<R: Rasterizer + Sync + ?Sized>(
    rasterizer: &R,
    params: &SdfParams,
    mode: CodecMode,
) -> Result<Atlas, BuildError> {
    let fail = |c: char, source: GlyphError| BuildError {
        char_code: c.into(),
        source,
    };

    let glyphs = process_all(rasterizer, params, mode);

    let mut builder = AtlasBuilder::new(mode);
    for (c, glyph) in glyphs {
        let glyph = glyph.map_err(|err| fail(c, err))?;
        builder
            .push(c.into(), &glyph)
            .map_err(|err| fail(c, err.into()))?;
    }

    // All codes have been pushed, so this cannot fail except on a bug
    let last = *glyph_chars().end();
    builder.finish().map_err(|err| fail(last, err.into()))
}

/// Process every glyph, returning results in code order
fn process_all<R: Rasterizer + Sync + ?Sized>(
    rasterizer: &R,
    params: &SdfParams,
    mode: CodecMode,
) -> Vec<(char, Result<EncodedGlyph, GlyphError>)> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "parallel")] {
            {
                use rayon::prelude::*;
                let chars: Vec<char> = glyph_chars().collect();
                chars
                    .par_iter()
                    .map(|&c| (c, process_glyph(rasterizer, c, params, mode)))
                    .collect()
            }
        } else {
            glyph_chars()
                .map(|c| (c, process_glyph(rasterizer, c, params, mode)))
                .collect()
        }
    }
}

/// Load the configured font and build its atlas
pub fn build_from_config(config: &Config) -> Result<Atlas, Error> {
    config.validate()?;
    let font = FontData::load(&config.font)?;
    let rasterizer = FontRasterizer::new(font, config.pixel_size, config.backend)?;
    Ok(build_atlas(&rasterizer, &config.sdf, config.mode)?)
}
