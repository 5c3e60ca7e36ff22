// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! C code emission
//!
//! An [`Atlas`] is emitted as a C source file defining two arrays and a header
//! declaring them:
//! ```c
//! typedef struct {
//!     uint32_t offset;
//!     uint16_t size;
//!     uint8_t width;
//!     uint8_t height;
//! } Glyph;
//!
//! extern const uint8_t sdf_data[];
//! extern const Glyph glyphs[];
//! ```
//! The `size` field widens to `uint32_t` when some glyph does not fit 16
//! bits (see [`SizeType`]).
//!
//! Given a [`FontId`], symbols are qualified as `sdf_data_{name}_{size}` and
//! `glyphs_{name}_{size}` and the `Glyph` type is moved to a shared
//! `glyph.h`, so that multiple atlases may be linked together. A
//! [`FontSet`] emits a `font.h` indexing such atlases together with the one
//! `glyph.h` they all include; its `size` field is wide enough for every
//! atlas in the set.

use crate::atlas::Atlas;
use crate::config::{Config, OutputPaths};
use easy_cast::{Conv, ConvFloat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of data values per line of emitted source
pub const VALUES_PER_LINE: usize = 12;

/// Name of the shared header declaring `Glyph`
pub const GLYPH_HEADER: &str = "glyph.h";

/// Emission errors
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Font size must fit the `uint8_t size` field of `Font`
    #[error("pixel size {0} is not representable as a font size")]
    Size(f32),
}

/// C type of the `Glyph::size` field
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeType {
    #[default]
    U16,
    U32,
}

impl SizeType {
    /// The narrowest type holding every glyph's encoded size
    pub fn for_atlas(atlas: &Atlas) -> Self {
        if u16::try_conv(atlas.max_encoded_size()).is_ok() {
            SizeType::U16
        } else {
            SizeType::U32
        }
    }

    /// The C type name
    pub fn c_type(self) -> &'static str {
        match self {
            SizeType::U16 => "uint16_t",
            SizeType::U32 => "uint32_t",
        }
    }
}

/// Identifies an atlas among several in emitted code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontId {
    name: String,
    size: u8,
}

impl FontId {
    /// Construct
    ///
    /// Characters of `name` which are not valid in a C identifier are
    /// replaced with `_`.
    pub fn new(name: &str, size: u8) -> Self {
        let mut ident: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        FontId { name: ident, size }
    }

    /// Construct from a name and pixel size
    ///
    /// The pixel size is rounded to the nearest integer.
    pub fn from_pixel_size(name: &str, pixel_size: f32) -> Result<Self, EmitError> {
        let size = u8::try_conv_nearest(pixel_size).map_err(|_| EmitError::Size(pixel_size))?;
        Ok(FontId::new(name, size))
    }

    /// Sanitized name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Font size
    pub fn size(&self) -> u8 {
        self.size
    }

    /// Identifier of the data array
    pub fn data_symbol(&self) -> String {
        format!("sdf_data_{}_{}", self.name, self.size)
    }

    /// Identifier of the glyph table
    pub fn glyphs_symbol(&self) -> String {
        format!("glyphs_{}_{}", self.name, self.size)
    }

    /// `FontName` enumerator
    pub fn enumerator(&self) -> String {
        format!("{}_{}", self.name.to_ascii_uppercase(), self.size)
    }

    /// Conventional header file name
    pub fn header_file(&self) -> String {
        format!("font_{}_{}.h", self.name, self.size)
    }

    /// Conventional source file name
    pub fn source_file(&self) -> String {
        format!("font_{}_{}.c", self.name, self.size)
    }

    fn guard(&self) -> String {
        format!("FONT_{}_H", self.enumerator())
    }
}

fn symbols(id: Option<&FontId>) -> (String, String) {
    match id {
        Some(id) => (id.data_symbol(), id.glyphs_symbol()),
        None => ("sdf_data".to_string(), "glyphs".to_string()),
    }
}

fn write_glyph_type(w: &mut impl Write, size_type: SizeType) -> io::Result<()> {
    writeln!(w, "typedef struct {{")?;
    writeln!(w, "    uint32_t offset;")?;
    writeln!(w, "    {} size;", size_type.c_type())?;
    writeln!(w, "    uint8_t width;")?;
    writeln!(w, "    uint8_t height;")?;
    writeln!(w, "}} Glyph;")?;
    writeln!(w)
}

/// Write the shared `glyph.h` header
pub fn write_glyph_header(w: &mut impl Write, size_type: SizeType) -> io::Result<()> {
    writeln!(w, "#ifndef GLYPH_H")?;
    writeln!(w, "#define GLYPH_H")?;
    writeln!(w)?;
    writeln!(w, "#include <stdint.h>")?;
    writeln!(w)?;
    write_glyph_type(w, size_type)?;
    writeln!(w, "#endif // GLYPH_H")
}

/// Write a header declaring an atlas
///
/// Without an `id` the header also defines `Glyph`; otherwise it includes
/// [`GLYPH_HEADER`].
pub fn write_header(w: &mut impl Write, atlas: &Atlas, id: Option<&FontId>) -> io::Result<()> {
    let guard = id.map(FontId::guard).unwrap_or_else(|| "FONT_H".to_string());
    let (data, glyphs) = symbols(id);

    writeln!(w, "#ifndef {guard}")?;
    writeln!(w, "#define {guard}")?;
    writeln!(w)?;
    writeln!(w, "#include <stdint.h>")?;
    if id.is_some() {
        writeln!(w, "#include \"{GLYPH_HEADER}\"")?;
        writeln!(w)?;
    } else {
        writeln!(w)?;
        write_glyph_type(w, SizeType::for_atlas(atlas))?;
    }
    writeln!(w, "extern const uint8_t {data}[];")?;
    writeln!(w, "extern const Glyph {glyphs}[];")?;
    writeln!(w)?;
    writeln!(w, "#endif // {guard}")
}

/// Write a source file defining an atlas
///
/// `header` is the name of the header to include.
pub fn write_source(
    w: &mut impl Write,
    atlas: &Atlas,
    id: Option<&FontId>,
    header: &str,
) -> io::Result<()> {
    let (data, glyphs) = symbols(id);

    writeln!(w, "#include \"{header}\"")?;
    writeln!(w)?;

    writeln!(w, "const uint8_t {data}[] = {{")?;
    for line in atlas.data().chunks(VALUES_PER_LINE) {
        write!(w, "   ")?;
        for value in line {
            write!(w, " {value},")?;
        }
        writeln!(w)?;
    }
    writeln!(w, "}};")?;
    writeln!(w)?;

    writeln!(w, "const Glyph {glyphs}[] = {{")?;
    for entry in atlas.entries() {
        writeln!(
            w,
            "    {{ {}, {}, {}, {} }}, // {}",
            entry.offset, entry.encoded_size, entry.width, entry.height, entry.char_code
        )?;
    }
    writeln!(w, "}};")
}

/// A table of atlases linked into one program
///
/// Emits `font.h`: a `Font` struct, a `FontName` enumeration and a `fonts[]`
/// table, in insertion order. Also emits the [`GLYPH_HEADER`] shared by all
/// named atlases, which must not be generated per atlas.
#[derive(Clone, Debug, Default)]
pub struct FontSet {
    fonts: Vec<FontId>,
    size_type: SizeType,
}

impl FontSet {
    /// Construct an empty set
    pub fn new() -> Self {
        FontSet::default()
    }

    /// Add a font
    ///
    /// Returns false (and does nothing) if an equal id is already present.
    pub fn push(&mut self, id: FontId, atlas: &Atlas) -> bool {
        if self.fonts.contains(&id) {
            return false;
        }
        self.fonts.push(id);
        self.size_type = self.size_type.max(SizeType::for_atlas(atlas));
        true
    }

    /// Fonts in table order
    pub fn fonts(&self) -> &[FontId] {
        &self.fonts
    }

    /// Type of the shared `Glyph::size` field
    pub fn size_type(&self) -> SizeType {
        self.size_type
    }

    /// Write the shared [`GLYPH_HEADER`]
    pub fn write_glyph_header(&self, w: &mut impl Write) -> io::Result<()> {
        write_glyph_header(w, self.size_type)
    }

    /// Write the `font.h` header
    pub fn write_header(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "#ifndef FONT_H")?;
        writeln!(w, "#define FONT_H")?;
        writeln!(w)?;
        writeln!(w, "#include <stdint.h>")?;
        writeln!(w)?;
        for id in &self.fonts {
            writeln!(w, "#include \"{}\"", id.header_file())?;
        }
        writeln!(w)?;

        writeln!(w, "typedef struct {{")?;
        writeln!(w, "    uint8_t size;")?;
        writeln!(w, "    const uint8_t *sdf_data;")?;
        writeln!(w, "    const Glyph *glyphs;")?;
        writeln!(w, "}} Font;")?;
        writeln!(w)?;

        writeln!(w, "typedef enum {{")?;
        for id in &self.fonts {
            writeln!(w, "    {},", id.enumerator())?;
        }
        writeln!(w, "}} FontName;")?;
        writeln!(w)?;

        writeln!(w, "static const Font fonts[] = {{")?;
        for id in &self.fonts {
            writeln!(
                w,
                "    {{ {}, {}, {} }},",
                id.size,
                id.data_symbol(),
                id.glyphs_symbol()
            )?;
        }
        writeln!(w, "}};")?;
        writeln!(w)?;
        writeln!(w, "#endif // FONT_H")
    }

    /// Write `font.h` and [`GLYPH_HEADER`] into `dir`
    pub fn write_files(&self, dir: &Path) -> Result<(), EmitError> {
        write_file(&dir.join("font.h"), |w| self.write_header(w))?;
        write_file(&dir.join(GLYPH_HEADER), |w| self.write_glyph_header(w))?;
        log::info!("wrote font table of {} fonts to {}", self.fonts.len(), dir.display());
        Ok(())
    }
}

fn write_file(path: &Path, f: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>) -> Result<(), EmitError> {
    let wrap = |source| EmitError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut w = BufWriter::new(File::create(path).map_err(wrap)?);
    f(&mut w).map_err(wrap)?;
    w.flush().map_err(wrap)
}

/// Paths to write an atlas to
///
/// These are [`Config::output`] if set. Otherwise an unnamed atlas goes to
/// `font.c` and `font.h`, and a named one to [`FontId::source_file`] and
/// [`FontId::header_file`], leaving `font.h` to the [`FontSet`].
pub fn output_paths(config: &Config, id: Option<&FontId>) -> OutputPaths {
    match (&config.output, id) {
        (Some(paths), _) => paths.clone(),
        (None, Some(id)) => OutputPaths {
            source: PathBuf::from(id.source_file()),
            header: PathBuf::from(id.header_file()),
        },
        (None, None) => OutputPaths::default(),
    }
}

/// Write an atlas to the files given by [`output_paths`]
///
/// If [`Config::name`] is set, symbols are qualified by name and pixel size
/// and the header includes [`GLYPH_HEADER`], which is written by
/// [`FontSet::write_files`]. Returns the paths written.
pub fn write_files(atlas: &Atlas, config: &Config) -> Result<OutputPaths, EmitError> {
    let id = match config.name.as_deref() {
        Some(name) => Some(FontId::from_pixel_size(name, config.pixel_size)?),
        None => None,
    };
    let paths = output_paths(config, id.as_ref());
    let header_name = paths
        .header
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font.h".to_string());

    write_file(&paths.header, |w| write_header(w, atlas, id.as_ref()))?;
    write_file(&paths.source, |w| {
        write_source(w, atlas, id.as_ref(), &header_name)
    })?;

    log::info!(
        "wrote {} and {}",
        paths.source.display(),
        paths.header.display()
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{AtlasBuilder, FIRST_CHAR, LAST_CHAR};
    use crate::codec::{encode, CodecMode};
    use crate::sdf::SdfRaster;

    fn atlas() -> Atlas {
        let mut builder = AtlasBuilder::new(CodecMode::Raw);
        for code in FIRST_CHAR..=LAST_CHAR {
            let raster = SdfRaster::from_fn(1, 1, |_, _| (code - FIRST_CHAR) as u8);
            builder.push(code, &encode(CodecMode::Raw, &raster).unwrap()).unwrap();
        }
        builder.finish().unwrap()
    }

    fn emit(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn identifiers() {
        let id = FontId::new("Roboto-Mono", 32);
        assert_eq!(id.name(), "Roboto_Mono");
        assert_eq!(id.data_symbol(), "sdf_data_Roboto_Mono_32");
        assert_eq!(id.glyphs_symbol(), "glyphs_Roboto_Mono_32");
        assert_eq!(id.enumerator(), "ROBOTO_MONO_32");
        assert_eq!(id.header_file(), "font_Roboto_Mono_32.h");
        assert_eq!(FontId::new("9x", 8).name(), "_9x");
        assert_eq!(FontId::new("", 8).name(), "_");

        assert_eq!(FontId::from_pixel_size("a", 63.6).unwrap().size(), 64);
        assert!(matches!(
            FontId::from_pixel_size("a", 300.0),
            Err(EmitError::Size(_))
        ));
    }

    #[test]
    fn unnamed_header() {
        let text = emit(|w| write_header(w, &atlas(), None));
        assert!(text.starts_with("#ifndef FONT_H\n#define FONT_H\n"));
        assert!(text.contains("    uint16_t size;\n"));
        assert!(text.contains("extern const uint8_t sdf_data[];\n"));
        assert!(text.contains("extern const Glyph glyphs[];\n"));
    }

    #[test]
    fn named_header() {
        let id = FontId::new("roboto", 64);
        let text = emit(|w| write_header(w, &atlas(), Some(&id)));
        assert!(text.contains("#ifndef FONT_ROBOTO_64_H\n"));
        assert!(text.contains("#include \"glyph.h\"\n"));
        assert!(!text.contains("typedef"));
        assert!(text.contains("extern const Glyph glyphs_roboto_64[];\n"));
    }

    #[test]
    fn source_layout() {
        let atlas = atlas();
        let text = emit(|w| write_source(w, &atlas, None, "font.h"));
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("#include \"font.h\""));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("const uint8_t sdf_data[] = {"));
        assert_eq!(
            lines.next(),
            Some("    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11,")
        );

        // 95 values: 7 full lines and one of 11
        let data_lines = text
            .lines()
            .skip(3)
            .take_while(|line| *line != "};")
            .count();
        assert_eq!(data_lines, 8);

        assert!(text.contains("    { 0, 1, 1, 1 }, // 32\n"));
        assert!(text.contains("    { 94, 1, 1, 1 }, // 126\n"));
        assert!(text.ends_with("};\n"));
    }

    /// An atlas whose last glyph needs a 32-bit size field
    ///
    /// A 255×255 checkerboard has one run per pixel: 1.5 bytes per pixel.
    fn large_atlas() -> Atlas {
        let mode = CodecMode::PairedNibble;
        let mut builder = AtlasBuilder::new(mode);
        for code in FIRST_CHAR..=LAST_CHAR {
            let side = if code == LAST_CHAR { 255 } else { 1 };
            let raster = SdfRaster::from_fn(side, side, |x, y| if (x + y) % 2 == 0 { 0 } else { 255 });
            builder.push(code, &encode(mode, &raster).unwrap()).unwrap();
        }
        builder.finish().unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sdf-atlas-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn font_set() {
        let atlas = atlas();
        let mut set = FontSet::new();
        assert!(set.push(FontId::new("roboto", 32), &atlas));
        assert!(set.push(FontId::new("roboto", 64), &atlas));
        assert!(!set.push(FontId::new("roboto", 32), &atlas));
        assert_eq!(set.fonts().len(), 2);
        assert_eq!(set.size_type(), SizeType::U16);

        let text = emit(|w| set.write_header(w));
        assert!(text.contains("#include \"font_roboto_32.h\"\n#include \"font_roboto_64.h\"\n"));
        assert!(text.contains("    ROBOTO_32,\n    ROBOTO_64,\n} FontName;"));
        assert!(text.contains("    { 64, sdf_data_roboto_64, glyphs_roboto_64 },\n"));
    }

    #[test]
    fn font_set_shares_widest_size() {
        let mut set = FontSet::new();
        set.push(FontId::new("small", 16), &atlas());
        set.push(FontId::new("large", 200), &large_atlas());
        assert_eq!(set.size_type(), SizeType::U32);

        let dir = temp_dir("font-set");
        set.write_files(&dir).unwrap();
        let glyph_h = std::fs::read_to_string(dir.join(GLYPH_HEADER)).unwrap();
        assert!(glyph_h.contains("    uint32_t size;\n"));
        let font_h = std::fs::read_to_string(dir.join("font.h")).unwrap();
        assert!(font_h.contains("#include \"font_large_200.h\"\n"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn named_paths_avoid_font_h() {
        let mut config = Config {
            name: Some("roboto".to_string()),
            pixel_size: 32.0,
            ..Config::default()
        };
        let id = FontId::from_pixel_size("roboto", 32.0).unwrap();
        let paths = output_paths(&config, Some(&id));
        assert_eq!(paths.header, PathBuf::from("font_roboto_32.h"));
        assert_eq!(paths.source, PathBuf::from("font_roboto_32.c"));
        assert_eq!(output_paths(&config, None), OutputPaths::default());

        let dir = temp_dir("named");
        config.output = Some(OutputPaths {
            source: dir.join(id.source_file()),
            header: dir.join(id.header_file()),
        });
        let written = write_files(&atlas(), &config).unwrap();
        let header = std::fs::read_to_string(&written.header).unwrap();
        assert!(header.starts_with("#ifndef FONT_ROBOTO_32_H\n"));
        let source = std::fs::read_to_string(&written.source).unwrap();
        assert!(source.starts_with("#include \"font_roboto_32.h\"\n"));
        assert!(!dir.join(GLYPH_HEADER).exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn size_type() {
        assert_eq!(SizeType::for_atlas(&atlas()), SizeType::U16);
        let text = emit(|w| write_glyph_header(w, SizeType::U32));
        assert!(text.contains("    uint32_t size;\n"));
        assert!(text.ends_with("#endif // GLYPH_H\n"));
    }
}
