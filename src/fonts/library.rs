// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font loading

use super::FaceRef;
use std::path::{Path, PathBuf};
use thiserror::Error;
pub(crate) use ttf_parser::Face;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Font loading errors
#[derive(Error, Debug)]
pub enum FontError {
    /// The font file could not be read
    #[error("failed to read font file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The font data could not be parsed
    #[error("font load error")]
    Parse(#[from] ttf_parser::FaceParsingError),
    /// No installed font matches the requested family
    #[error("no installed font matches family {0:?}")]
    NoMatch(String),
    /// A rastering backend rejected the font data
    #[error("font load error: {0}")]
    Backend(&'static str),
}

/// Where to load a font from
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FontSource {
    /// A font file (TrueType or OpenType) on disk
    Path(PathBuf),
    /// An installed font, by family name
    ///
    /// The generic names `serif`, `sans-serif` and `monospace` are accepted.
    Family(String),
    /// Font file contents already in memory
    Bytes(Vec<u8>),
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Family("sans-serif".to_string())
    }
}

impl From<PathBuf> for FontSource {
    fn from(path: PathBuf) -> Self {
        FontSource::Path(path)
    }
}

impl From<&Path> for FontSource {
    fn from(path: &Path) -> Self {
        FontSource::Path(path.to_path_buf())
    }
}

/// Loaded font data
///
/// Owns the contents of a font file together with the index of the face to
/// use within it (non-zero only for font collections).
#[derive(Clone)]
pub struct FontData {
    data: Vec<u8>,
    index: u32,
}

impl std::fmt::Debug for FontData {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FontData")
            .field("len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl FontData {
    /// Construct from font file contents
    ///
    /// The data is validated by parsing face `index`.
    pub fn new(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
        Face::parse(&data, index)?;
        Ok(FontData { data, index })
    }

    /// Load a font from a [`FontSource`]
    pub fn load(source: &FontSource) -> Result<Self, FontError> {
        match source {
            FontSource::Path(path) => {
                let data = std::fs::read(path).map_err(|source| FontError::Io {
                    path: path.clone(),
                    source,
                })?;
                log::debug!("loaded font file {} ({} bytes)", path.display(), data.len());
                FontData::new(data, 0)
            }
            FontSource::Family(name) => {
                let (data, index) = super::find_system_font(name)?;
                FontData::new(data, index)
            }
            FontSource::Bytes(data) => FontData::new(data.clone(), 0),
        }
    }

    /// Raw font file contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Face index within the font file
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Parse the face
    ///
    /// Parsing is cheap (tables are read lazily) and has already succeeded
    /// once on construction.
    pub fn face(&self) -> Result<Face<'_>, FontError> {
        Ok(Face::parse(&self.data, self.index)?)
    }

    /// Run `f` with a [`FaceRef`] to the parsed face
    pub fn with_face<T>(&self, f: impl FnOnce(FaceRef<'_>) -> T) -> Result<T, FontError> {
        let face = self.face()?;
        Ok(f(FaceRef(&face)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_garbage() {
        let result = FontData::new(vec![0, 1, 2, 3, 4, 5, 6, 7], 0);
        assert!(matches!(result, Err(FontError::Parse(_))));
    }

    #[test]
    fn missing_file() {
        let source = FontSource::Path("/nonexistent/font.ttf".into());
        match FontData::load(&source) {
            Err(FontError::Io { path, .. }) => assert_eq!(path, PathBuf::from("/nonexistent/font.ttf")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
