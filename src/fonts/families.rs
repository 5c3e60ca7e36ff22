// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Installed fonts
//!
//! Family names are resolved against the fonts installed on the system.
//! Generic names (`serif`, `sans-serif`, `monospace`) resolve to the first
//! installed family from a preference list.
//!
//! NOTE: these lists were put together with limited testing. Font families
//! are listed in order of preference.

use super::FontError;
use fontdb::{Database, Family, Query};

const DEFAULT_SERIF: [&str; 8] = [
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Georgia",
    "Palatino Linotype",
    "Droid Serif",
    "Times New Roman",
    "Times",
];

const DEFAULT_SANS_SERIF: [&str; 11] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Open Sans",
    "Roboto",
    "Cantarell",
    "Droid Sans",
    "Tahoma",
    "Verdana",
    "Arial",
    "Helvetica",
];

const DEFAULT_MONOSPACE: [&str; 10] = [
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Roboto Mono",
    "Source Code Pro",
    "Droid Sans Mono",
    "Consolas",
    "Menlo",
    "Courier New",
    "Courier",
];

/// Set default font families after loading fonts
fn set_defaults(db: &mut Database) {
    // fontdb does not pick a default family for each category, so do that now.
    macro_rules! set_family {
        ($FAMILY:ident, $set_fn:ident) => {
            let installed = $FAMILY.iter().cloned().find(|name| {
                db.faces()
                    .any(|face| face.families.iter().any(|(family, _)| family == name))
            });
            if let Some(name) = installed {
                log::debug!("default {}: {name}", stringify!($FAMILY));
                db.$set_fn(name);
            }
        };
    }
    set_family!(DEFAULT_SERIF, set_serif_family);
    set_family!(DEFAULT_SANS_SERIF, set_sans_serif_family);
    set_family!(DEFAULT_MONOSPACE, set_monospace_family);
}

fn family(name: &str) -> Family<'_> {
    match name {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "monospace" => Family::Monospace,
        name => Family::Name(name),
    }
}

/// Find an installed font by family name
///
/// Returns the font file contents and the face index within that file. The
/// regular (normal weight, width and style) face is preferred.
pub fn find_system_font(name: &str) -> Result<(Vec<u8>, u32), FontError> {
    let mut db = Database::new();
    db.load_system_fonts();
    log::info!("Found {} fonts", db.len());
    set_defaults(&mut db);

    let families = [family(name)];
    let query = Query {
        families: &families,
        ..Query::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| FontError::NoMatch(name.to_string()))?;

    if let Some(face) = db.face(id) {
        if let Some((family, _)) = face.families.first() {
            log::debug!("match: {family}");
        }
    }

    db.with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| FontError::NoMatch(name.to_string()))
}
