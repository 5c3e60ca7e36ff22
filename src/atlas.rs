// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph atlas layout
//!
//! An [`Atlas`] is a flat byte buffer holding every glyph's encoded data back
//! to back, plus a table of [`GlyphEntry`] locating each glyph within it.
//! The table covers the printable ASCII range [`FIRST_CHAR`]`..=`[`LAST_CHAR`]
//! in ascending order, so a consumer finds the glyph for `code` at index
//! `code - FIRST_CHAR`. Glyph data is contiguous with no padding:
//! `entries[i].offset + entries[i].encoded_size == entries[i + 1].offset`.

use crate::codec::{self, CodecError, CodecMode, EncodedGlyph};
use crate::conv::{area, to_u32, to_usize};
use crate::sdf::SdfRaster;
use easy_cast::Conv;
use std::ops::{Range, RangeInclusive};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// First character code in an atlas (space)
pub const FIRST_CHAR: u32 = 0x20;
/// Last character code in an atlas (`~`)
pub const LAST_CHAR: u32 = 0x7E;
/// Number of glyphs in an atlas
pub const GLYPH_COUNT: usize = (LAST_CHAR - FIRST_CHAR + 1) as usize;

/// The characters of an atlas, in table order
pub fn glyph_chars() -> RangeInclusive<char> {
    ' '..='~'
}

/// Atlas layout errors
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Glyphs must be added in ascending code order without gaps
    #[error("glyph {found} out of order (expected {expected})")]
    OutOfOrder { expected: u32, found: u32 },
    /// All glyphs of an atlas must use the same encoding
    #[error("glyph encoded as {found:?} in a {expected:?} atlas")]
    ModeMismatch {
        expected: CodecMode,
        found: CodecMode,
    },
    /// Not every glyph has been added
    #[error("atlas incomplete: missing glyph {next}")]
    Incomplete { next: u32 },
    /// Glyph dimensions must fit the table's 8-bit fields
    #[error("glyph size {width}×{height} exceeds 255×255")]
    DimensionOverflow { width: u32, height: u32 },
    /// Glyph data must be addressable with 32-bit offsets
    #[error("atlas data exceeds 32-bit offsets")]
    OffsetOverflow,
    /// A table entry does not match its position or the data buffer
    #[error("glyph table entry {index} is inconsistent")]
    Inconsistent { index: usize },
}

/// Location and size of one glyph within an [`Atlas`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphEntry {
    /// Character code
    pub char_code: u32,
    /// Width in pixels
    pub width: u8,
    /// Height in pixels
    pub height: u8,
    /// Index of the first byte within [`Atlas::data`]
    pub offset: u32,
    /// Number of bytes
    pub encoded_size: u32,
}

impl GlyphEntry {
    /// The character
    pub fn char(&self) -> Option<char> {
        char::from_u32(self.char_code)
    }

    /// Byte range within [`Atlas::data`]
    pub fn range(&self) -> Range<usize> {
        let start = to_usize(self.offset);
        start..start + to_usize(self.encoded_size)
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        area(self.width.into(), self.height.into())
    }
}

/// A glyph within an [`Atlas`]
#[derive(Copy, Clone, Debug)]
pub struct GlyphView<'a> {
    pub entry: &'a GlyphEntry,
    pub bytes: &'a [u8],
    mode: CodecMode,
}

impl<'a> GlyphView<'a> {
    /// Decode the glyph's distance field
    pub fn decode(&self) -> Result<SdfRaster, CodecError> {
        codec::decode(
            self.mode,
            self.entry.width.into(),
            self.entry.height.into(),
            self.bytes,
        )
    }
}

/// A complete glyph atlas
///
/// Built by [`AtlasBuilder`]; immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Atlas {
    mode: CodecMode,
    entries: Vec<GlyphEntry>,
    data: Vec<u8>,
}

impl Atlas {
    /// Construct from a glyph table and data buffer
    ///
    /// The table is checked with [`Atlas::validate`].
    pub fn from_parts(
        mode: CodecMode,
        entries: Vec<GlyphEntry>,
        data: Vec<u8>,
    ) -> Result<Self, LayoutError> {
        let atlas = Atlas {
            mode,
            entries,
            data,
        };
        atlas.validate()?;
        Ok(atlas)
    }

    /// Glyph encoding
    #[inline]
    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// The glyph table, in ascending code order
    #[inline]
    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }

    /// Concatenated glyph data
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Find the entry for a character code
    pub fn entry(&self, char_code: u32) -> Option<&GlyphEntry> {
        let index = char_code.checked_sub(FIRST_CHAR)?;
        self.entries.get(to_usize(index))
    }

    /// Access a glyph by character code
    pub fn glyph(&self, char_code: u32) -> Option<GlyphView<'_>> {
        let entry = self.entry(char_code)?;
        let bytes = self.data.get(entry.range())?;
        Some(GlyphView {
            entry,
            bytes,
            mode: self.mode,
        })
    }

    /// Encoded bytes of a glyph
    pub fn glyph_bytes(&self, char_code: u32) -> Option<&[u8]> {
        self.glyph(char_code).map(|view| view.bytes)
    }

    /// Decode a glyph's distance field
    ///
    /// Returns `None` if `char_code` is not in the atlas.
    pub fn decode_glyph(&self, char_code: u32) -> Option<Result<SdfRaster, CodecError>> {
        self.glyph(char_code).map(|view| view.decode())
    }

    /// Iterate over all glyphs in table order
    pub fn glyphs(&self) -> impl Iterator<Item = GlyphView<'_>> + '_ {
        self.entries.iter().map(move |entry| GlyphView {
            entry,
            bytes: &self.data[entry.range()],
            mode: self.mode,
        })
    }

    /// Total pixels over all glyphs
    pub fn pixel_count(&self) -> usize {
        self.entries.iter().map(GlyphEntry::pixel_count).sum()
    }

    /// Largest encoded size of any glyph
    pub fn max_encoded_size(&self) -> u32 {
        self.entries
            .iter()
            .map(|entry| entry.encoded_size)
            .max()
            .unwrap_or(0)
    }

    /// Check table integrity
    ///
    /// Requires exactly one entry per code in ascending order, and that
    /// entries tile [`Atlas::data`] exactly.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut offset = 0usize;
        for (index, entry) in self.entries.iter().enumerate() {
            let expected = FIRST_CHAR + to_u32(index);
            if entry.char_code != expected {
                return Err(LayoutError::OutOfOrder {
                    expected,
                    found: entry.char_code,
                });
            }
            if to_usize(entry.offset) != offset || entry.encoded_size == 0 {
                return Err(LayoutError::Inconsistent { index });
            }
            offset += to_usize(entry.encoded_size);
        }
        if self.entries.len() != GLYPH_COUNT {
            return Err(LayoutError::Incomplete {
                next: FIRST_CHAR + to_u32(self.entries.len()),
            });
        }
        if offset != self.data.len() {
            return Err(LayoutError::Inconsistent {
                index: GLYPH_COUNT - 1,
            });
        }
        Ok(())
    }
}

/// Assembles encoded glyphs into an [`Atlas`]
///
/// Glyphs must be pushed in ascending code order starting from
/// [`FIRST_CHAR`].
#[derive(Clone, Debug)]
pub struct AtlasBuilder {
    mode: CodecMode,
    entries: Vec<GlyphEntry>,
    data: Vec<u8>,
}

impl AtlasBuilder {
    /// Construct for the given encoding
    pub fn new(mode: CodecMode) -> Self {
        AtlasBuilder {
            mode,
            entries: Vec::with_capacity(GLYPH_COUNT),
            data: Vec::new(),
        }
    }

    /// The code of the next glyph to push, if any remain
    pub fn next_char_code(&self) -> Option<u32> {
        (self.entries.len() < GLYPH_COUNT).then(|| FIRST_CHAR + to_u32(self.entries.len()))
    }

    /// Append a glyph
    ///
    /// Its data is placed directly after the previous glyph's.
    pub fn push(&mut self, char_code: u32, glyph: &EncodedGlyph) -> Result<&GlyphEntry, LayoutError> {
        let expected = FIRST_CHAR + to_u32(self.entries.len());
        if char_code != expected || expected > LAST_CHAR {
            return Err(LayoutError::OutOfOrder {
                expected,
                found: char_code,
            });
        }
        if glyph.mode() != self.mode {
            return Err(LayoutError::ModeMismatch {
                expected: self.mode,
                found: glyph.mode(),
            });
        }

        let overflow = LayoutError::DimensionOverflow {
            width: glyph.width(),
            height: glyph.height(),
        };
        let width = u8::try_conv(glyph.width()).map_err(|_| overflow.clone())?;
        let height = u8::try_conv(glyph.height()).map_err(|_| overflow)?;

        let offset = u32::try_conv(self.data.len()).map_err(|_| LayoutError::OffsetOverflow)?;
        let encoded_size = u32::try_conv(glyph.len()).map_err(|_| LayoutError::OffsetOverflow)?;
        if offset.checked_add(encoded_size).is_none() {
            return Err(LayoutError::OffsetOverflow);
        }

        self.data.extend_from_slice(glyph.bytes());
        self.entries.push(GlyphEntry {
            char_code,
            width,
            height,
            offset,
            encoded_size,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Finish
    ///
    /// Fails unless every glyph has been pushed.
    pub fn finish(self) -> Result<Atlas, LayoutError> {
        if let Some(next) = self.next_char_code() {
            return Err(LayoutError::Incomplete { next });
        }
        Ok(Atlas {
            mode: self.mode,
            entries: self.entries,
            data: self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn glyph(mode: CodecMode, code: u32) -> EncodedGlyph {
        let width = 1 + code % 5;
        let raster = SdfRaster::from_fn(width, 6, |x, y| ((x * 40 + y * code) % 256) as u8);
        encode(mode, &raster).unwrap()
    }

    fn build(mode: CodecMode) -> Atlas {
        let mut builder = AtlasBuilder::new(mode);
        for code in FIRST_CHAR..=LAST_CHAR {
            builder.push(code, &glyph(mode, code)).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn constants() {
        assert_eq!(GLYPH_COUNT, 95);
        assert_eq!(glyph_chars().count(), GLYPH_COUNT);
        assert_eq!(u32::from(*glyph_chars().start()), FIRST_CHAR);
        assert_eq!(u32::from(*glyph_chars().end()), LAST_CHAR);
    }

    #[test]
    fn contiguous_layout() {
        for mode in [CodecMode::Raw, CodecMode::PairedNibble] {
            let atlas = build(mode);
            assert!(atlas.validate().is_ok());
            let entries = atlas.entries();
            assert_eq!(entries.len(), GLYPH_COUNT);
            assert_eq!(entries[0].offset, 0);
            for pair in entries.windows(2) {
                assert_eq!(pair[0].char_code + 1, pair[1].char_code);
                assert_eq!(pair[0].offset + pair[0].encoded_size, pair[1].offset);
            }
            let last = entries[GLYPH_COUNT - 1];
            assert_eq!(to_usize(last.offset + last.encoded_size), atlas.data().len());
        }
    }

    #[test]
    fn self_describing() {
        let atlas = build(CodecMode::Raw);
        for code in [FIRST_CHAR, 0x41, LAST_CHAR] {
            let view = atlas.glyph(code).unwrap();
            let raster = view.decode().unwrap();
            let expected = glyph(CodecMode::Raw, code).decode().unwrap();
            assert_eq!(raster, expected);
        }
        assert_eq!(atlas.glyph_bytes(0x41), Some(&atlas.data()[atlas.entry(0x41).unwrap().range()]));
        assert!(atlas.decode_glyph(0x41).unwrap().is_ok());
        assert!(atlas.decode_glyph(0x7F).is_none());
        assert!(atlas.glyph(FIRST_CHAR - 1).is_none());
        assert!(atlas.glyph(LAST_CHAR + 1).is_none());
        assert_eq!(atlas.pixel_count(), atlas.data().len());
    }

    #[test]
    fn out_of_order() {
        let mode = CodecMode::PairedNibble;
        let mut builder = AtlasBuilder::new(mode);
        builder.push(FIRST_CHAR, &glyph(mode, FIRST_CHAR)).unwrap();
        assert_eq!(
            builder.push(FIRST_CHAR + 2, &glyph(mode, FIRST_CHAR + 2)),
            Err(LayoutError::OutOfOrder {
                expected: FIRST_CHAR + 1,
                found: FIRST_CHAR + 2
            })
        );
        assert_eq!(builder.next_char_code(), Some(FIRST_CHAR + 1));
    }

    #[test]
    fn incomplete() {
        let mode = CodecMode::Raw;
        let mut builder = AtlasBuilder::new(mode);
        builder.push(FIRST_CHAR, &glyph(mode, FIRST_CHAR)).unwrap();
        assert_eq!(
            builder.finish(),
            Err(LayoutError::Incomplete {
                next: FIRST_CHAR + 1
            })
        );
    }

    #[test]
    fn mode_mismatch() {
        let mut builder = AtlasBuilder::new(CodecMode::Raw);
        assert_eq!(
            builder.push(FIRST_CHAR, &glyph(CodecMode::PairedNibble, FIRST_CHAR)),
            Err(LayoutError::ModeMismatch {
                expected: CodecMode::Raw,
                found: CodecMode::PairedNibble
            })
        );
    }

    #[test]
    fn oversized_glyph() {
        let raster = SdfRaster::from_fn(300, 2, |_, _| 0);
        let encoded = encode(CodecMode::Raw, &raster).unwrap();
        let mut builder = AtlasBuilder::new(CodecMode::Raw);
        assert_eq!(
            builder.push(FIRST_CHAR, &encoded),
            Err(LayoutError::DimensionOverflow {
                width: 300,
                height: 2
            })
        );
    }

    #[test]
    fn from_parts_checks_layout() {
        let atlas = build(CodecMode::PairedNibble);
        let mode = atlas.mode();
        let mut entries = atlas.entries().to_vec();
        let data = atlas.data().to_vec();
        assert!(Atlas::from_parts(mode, entries.clone(), data.clone()).is_ok());

        entries[10].offset += 1;
        assert_eq!(
            Atlas::from_parts(mode, entries, data),
            Err(LayoutError::Inconsistent { index: 10 })
        );
    }
}
