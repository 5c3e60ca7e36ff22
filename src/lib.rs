// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Signed distance field glyph atlases
//!
//! This library converts the printable ASCII glyphs (codes 32 to 126) of a
//! font into compact signed distance fields suitable for embedding in a
//! microcontroller's flash memory. Each glyph passes through:
//!
//! 1.  [`raster`]: coverage raster at a fixed pixel size
//! 2.  [`mask`]: threshold to a boolean ink mask
//! 3.  [`sdf`]: exact Euclidean distance transform, normalized and sharpened
//!     to one byte per pixel
//! 4.  [`codec`]: optional paired-nibble run-length encoding
//! 5.  [`atlas`]: concatenation into one buffer with a glyph table
//!
//! The [`emit`] module writes the result as C source.
//!
//! ```
//! use sdf_atlas::codec::CodecMode;
//! use sdf_atlas::raster::{Coverage, LineMetrics, RasterError, Rasterizer};
//! use sdf_atlas::{build_atlas, SdfParams};
//!
//! // Every glyph is a 4×8 solid block
//! struct Blocks;
//!
//! impl Rasterizer for Blocks {
//!     fn line_metrics(&self) -> LineMetrics {
//!         LineMetrics { ascent: 6, descent: 2 }
//!     }
//!
//!     fn rasterize(&self, _: char) -> Result<Coverage, RasterError> {
//!         Ok(Coverage::from_fn(4, 8, |_, _| 255))
//!     }
//! }
//!
//! let atlas = build_atlas(&Blocks, &SdfParams::default(), CodecMode::PairedNibble).unwrap();
//! assert_eq!(atlas.entries().len(), 95);
//! assert_eq!(atlas.entry(65).unwrap().width, 4);
//! ```

#![cfg_attr(doc_cfg, feature(doc_cfg))]

pub mod atlas;
pub mod codec;
pub mod config;
pub mod conv;
pub mod emit;
pub mod fonts;
pub mod mask;
pub mod pipeline;
pub mod raster;
pub mod sdf;

pub use atlas::{Atlas, AtlasBuilder, GlyphEntry};
pub use codec::{CodecMode, EncodedGlyph};
pub use config::Config;
pub use pipeline::{build_atlas, build_from_config, process_glyph, BuildError, Error};
pub use sdf::{SdfParams, SdfRaster};
