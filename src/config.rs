// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Atlas build configuration

use crate::codec::CodecMode;
use crate::fonts::FontSource;
use crate::raster::Backend;
use crate::sdf::SdfParams;
use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default nominal pixel size (pixels per Em)
pub const DEFAULT_PIXEL_SIZE: f32 = 64.0;

/// Invalid configuration
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("pixel size must be positive, got {0}")]
    PixelSize(f32),
    #[error("field radius must be positive, got {0}")]
    Radius(f32),
    #[error("edge thresholds must satisfy 0 ≤ edge_down < edge_up ≤ 1, got {down} and {up}")]
    EdgeThresholds { down: f32, up: f32 },
}

/// Destination files for emitted code
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputPaths {
    /// Source file holding the glyph data and table
    pub source: PathBuf,
    /// Header file declaring them
    pub header: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        OutputPaths {
            source: PathBuf::from("font.c"),
            header: PathBuf::from("font.h"),
        }
    }
}

/// Atlas build configuration
///
/// The default configuration rasters the system `sans-serif` font at 64
/// pixels per Em with field radius 3, edge thresholds 0.35 and 0.75, and
/// encodes glyphs with [`CodecMode::PairedNibble`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Font to raster
    pub font: FontSource,
    /// Nominal pixel size, in pixels per Em
    pub pixel_size: f32,
    /// Distance field parameters
    pub sdf: SdfParams,
    /// Glyph encoding
    pub mode: CodecMode,
    /// Rastering backend
    pub backend: Backend,
    /// Where to write emitted code
    ///
    /// If `None`, paths are chosen by [`crate::emit::output_paths`].
    pub output: Option<OutputPaths>,
    /// Font name used to qualify emitted symbols
    ///
    /// If `None`, symbols are unqualified (`sdf_data`, `glyphs`).
    pub name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            font: FontSource::default(),
            pixel_size: DEFAULT_PIXEL_SIZE,
            sdf: SdfParams::default(),
            mode: CodecMode::default(),
            backend: Backend::default(),
            output: None,
            name: None,
        }
    }
}

impl Config {
    /// Construct with default settings for the given font
    pub fn new(font: impl Into<FontSource>) -> Self {
        Config {
            font: font.into(),
            ..Config::default()
        }
    }

    /// Check that settings are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pixel_size > 0.0 && self.pixel_size.is_finite()) {
            return Err(ConfigError::PixelSize(self.pixel_size));
        }
        self.sdf.validate()
    }
}
