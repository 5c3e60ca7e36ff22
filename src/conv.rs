// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Offsets and sizes within an [`Atlas`](crate::Atlas) are stored as `u32`
//! since that is what the emitted glyph table holds. A glyph set never comes
//! close to `u32::MAX` bytes of data, so `u32` is always an appropriate index
//! type; overflow is still reported rather than wrapped where it could occur.

use easy_cast::{Cast, Conv};

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Number of pixels in a `width × height` grid
#[inline]
pub fn area(width: u32, height: u32) -> usize {
    usize::conv(width) * usize::conv(height)
}

/// Scale factor: pixels per font unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    pub(crate) fn i16_to_px(self, x: i16) -> f32 {
        f32::from(x) * self.0
    }
    pub(crate) fn u16_to_px(self, x: u16) -> f32 {
        f32::from(x) * self.0
    }
}
