// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font selection and loading
//!
//! A font is named by a [`FontSource`] and loaded into a [`FontData`], which
//! owns the raw file contents. Faces are parsed from this data on demand.
//!
//! ### Font sizes
//!
//! Atlases are built at a nominal *pixel size*, which is the number of
//! pixels per *em* (DPEM). Font files define their geometry in *font units*;
//! the scale between the two is [`crate::conv::DPU`] (pixels per font unit):
//!
//! ```none
//! dpu = dpem / units_per_em
//! ```
//!
//! The vertical extent of every glyph canvas is the scaled ascender plus the
//! scaled descender, each rounded up to whole pixels.

mod face;
mod families;
mod library;

pub use face::{FaceRef, ScaledFaceRef};
pub use families::find_system_font;
pub use library::{FontData, FontError, FontSource};
