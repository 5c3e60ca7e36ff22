// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph encoding
//!
//! Two encodings are supported, selected per atlas by [`CodecMode`].
//!
//! ### Raw
//!
//! The row major bytes of the [`SdfRaster`], unmodified.
//!
//! ### Paired-nibble run-length
//!
//! Each 8-bit value is quantized to a 4-bit *bucket* (`value >> 4`). The
//! pixel sequence is split into maximal runs of equal buckets, each at most
//! [`MAX_RUN`] long (longer runs are split). Runs are packed two at a time
//! into 3-byte records:
//!
//! ```none
//! byte 0: bucket_a << 4 | bucket_b
//! byte 1: count_a
//! byte 2: count_b
//! ```
//!
//! If the number of runs is odd, the last record has `count_b = 0` (and
//! `bucket_b = 0`), meaning there is no second run.
//!
//! A bucket decodes to `bucket * 16` ([`BUCKET_SCALE`]). Decoded values are
//! thus never above the original value and at most 15 below it.

use crate::conv::area;
use crate::sdf::SdfRaster;
use easy_cast::Conv;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest run stored in one record field
pub const MAX_RUN: u8 = 255;
/// Size of a run-length record, in bytes
pub const RECORD_LEN: usize = 3;
/// Multiplier reconstructing an 8-bit value from a 4-bit bucket
pub const BUCKET_SCALE: u8 = 16;

/// Glyph encoding errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// Rasters must have at least one pixel
    #[error("raster has no pixels")]
    Empty,
    /// Run-length data is not a whole number of records
    #[error("encoded length {0} is not a multiple of {RECORD_LEN}")]
    Misaligned(usize),
    /// A record's first run is empty
    #[error("record {0} has an empty first run")]
    EmptyRun(usize),
    /// Decoded data does not fill the raster exactly
    #[error("decoded {actual} pixels, expected {expected}")]
    PixelCount { expected: usize, actual: usize },
}

/// Glyph encoding
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CodecMode {
    /// Unmodified 8-bit pixels; supports O(1) random access
    Raw,
    /// 4-bit quantized runs, packed in pairs
    #[default]
    PairedNibble,
}

/// Quantize an 8-bit value to its 4-bit bucket
#[inline]
pub fn quantize(value: u8) -> u8 {
    value >> 4
}

/// Reconstruct an 8-bit value from a 4-bit bucket
#[inline]
pub fn reconstruct(bucket: u8) -> u8 {
    (bucket & 0xF) * BUCKET_SCALE
}

/// A run of pixels sharing one bucket
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Run {
    /// 4-bit bucket
    pub bucket: u8,
    /// Number of pixels, `1..=MAX_RUN`
    pub count: u8,
}

/// Iterator over the runs of a pixel sequence
///
/// Runs are maximal except where split at [`MAX_RUN`].
#[derive(Clone, Debug)]
pub struct Runs<'a> {
    pixels: &'a [u8],
    pos: usize,
}

impl<'a> Runs<'a> {
    /// Construct
    pub fn new(pixels: &'a [u8]) -> Self {
        Runs { pixels, pos: 0 }
    }
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let bucket = quantize(*self.pixels.get(self.pos)?);
        let rest = &self.pixels[self.pos + 1..];
        let len = rest
            .iter()
            .take(usize::from(MAX_RUN - 1))
            .take_while(|value| quantize(**value) == bucket)
            .count();
        self.pos += 1 + len;
        Some(Run {
            bucket,
            count: u8::conv(1 + len),
        })
    }
}

/// One run-length record: a run, optionally followed by a second
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunPair {
    pub first: Run,
    pub second: Option<Run>,
}

impl RunPair {
    /// Pack as a 3-byte record
    pub fn to_bytes(self) -> [u8; RECORD_LEN] {
        let second = self.second.unwrap_or(Run {
            bucket: 0,
            count: 0,
        });
        [
            (self.first.bucket << 4) | (second.bucket & 0xF),
            self.first.count,
            second.count,
        ]
    }

    /// Unpack a 3-byte record
    pub fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        let first = Run {
            bucket: bytes[0] >> 4,
            count: bytes[1],
        };
        let second = (bytes[2] > 0).then_some(Run {
            bucket: bytes[0] & 0xF,
            count: bytes[2],
        });
        RunPair { first, second }
    }

    /// Total pixels covered by this record
    pub fn pixel_count(&self) -> usize {
        usize::from(self.first.count) + self.second.map(|run| usize::from(run.count)).unwrap_or(0)
    }
}

/// Iterate over the records of run-length data
pub fn records(bytes: &[u8]) -> Result<impl Iterator<Item = RunPair> + '_, CodecError> {
    if bytes.len() % RECORD_LEN != 0 {
        return Err(CodecError::Misaligned(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(RECORD_LEN)
        .map(|chunk| RunPair::from_bytes([chunk[0], chunk[1], chunk[2]])))
}

/// An encoded glyph
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedGlyph {
    mode: CodecMode,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl EncodedGlyph {
    /// Encoding used
    #[inline]
    pub fn mode(&self) -> CodecMode {
        self.mode
    }

    /// Width of the source raster
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source raster
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded bytes
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if there are no bytes (never the case for output of [`encode`])
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode
    pub fn decode(&self) -> Result<SdfRaster, CodecError> {
        decode(self.mode, self.width, self.height, &self.bytes)
    }
}

/// Encode a raster
///
/// Fails only if the raster has no pixels.
pub fn encode(mode: CodecMode, raster: &SdfRaster) -> Result<EncodedGlyph, CodecError> {
    let pixels = raster.pixels();
    if pixels.is_empty() {
        return Err(CodecError::Empty);
    }

    let bytes = match mode {
        CodecMode::Raw => pixels.to_vec(),
        CodecMode::PairedNibble => {
            let mut runs = Runs::new(pixels);
            let mut bytes = Vec::new();
            while let Some(first) = runs.next() {
                let second = runs.next();
                bytes.extend_from_slice(&RunPair { first, second }.to_bytes());
            }
            bytes
        }
    };

    Ok(EncodedGlyph {
        mode,
        width: raster.width(),
        height: raster.height(),
        bytes,
    })
}

/// Decode a `width × height` raster from `bytes`
///
/// Requires that the data covers the raster exactly.
pub fn decode(
    mode: CodecMode,
    width: u32,
    height: u32,
    bytes: &[u8],
) -> Result<SdfRaster, CodecError> {
    let expected = area(width, height);
    if expected == 0 {
        return Err(CodecError::Empty);
    }

    let data = match mode {
        CodecMode::Raw => bytes.to_vec(),
        CodecMode::PairedNibble => {
            let mut data = Vec::with_capacity(expected);
            for (i, pair) in records(bytes)?.enumerate() {
                if pair.first.count == 0 {
                    return Err(CodecError::EmptyRun(i));
                }
                if data.len() + pair.pixel_count() > expected {
                    return Err(CodecError::PixelCount {
                        expected,
                        actual: data.len() + pair.pixel_count(),
                    });
                }
                for run in std::iter::once(pair.first).chain(pair.second) {
                    let value = reconstruct(run.bucket);
                    data.extend(std::iter::repeat(value).take(usize::from(run.count)));
                }
            }
            data
        }
    };

    let actual = data.len();
    SdfRaster::new(width, height, data).ok_or(CodecError::PixelCount { expected, actual })
}
