// Build whole atlases from synthetic glyphs
use sdf_atlas::atlas::{FIRST_CHAR, GLYPH_COUNT, LAST_CHAR};
use sdf_atlas::codec::{CodecMode, BUCKET_SCALE};
use sdf_atlas::mask::GlyphMask;
use sdf_atlas::pipeline::GlyphError;
use sdf_atlas::raster::{Coverage, LineMetrics, RasterError, Rasterizer};
use sdf_atlas::sdf::distance_field;
use sdf_atlas::{build_atlas, SdfParams};

const ASCENT: u32 = 12;
const DESCENT: u32 = 4;

/// Draws each glyph as a ring whose width varies with the code
///
/// Space has no ink. `missing` has no glyph at all.
struct Rings {
    missing: Option<char>,
}

impl Rings {
    fn width(c: char) -> u32 {
        4 + u32::from(c) % 7
    }
}

impl Rasterizer for Rings {
    fn line_metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: ASCENT,
            descent: DESCENT,
        }
    }

    fn rasterize(&self, c: char) -> Result<Coverage, RasterError> {
        if Some(c) == self.missing {
            return Err(RasterError::MissingGlyph(c));
        }
        let height = ASCENT + DESCENT;
        if c == ' ' {
            return Ok(Coverage::blank(5, height));
        }
        let width = Rings::width(c);
        Ok(Coverage::from_fn(width, height, |x, y| {
            let edge = x == 0 || x == width - 1 || y == 2 || y == ASCENT - 1;
            if edge && (2..ASCENT).contains(&y) {
                230
            } else {
                20
            }
        }))
    }
}

fn rings() -> Rings {
    Rings { missing: None }
}

#[test]
fn layout_integrity() {
    for mode in [CodecMode::Raw, CodecMode::PairedNibble] {
        let atlas = build_atlas(&rings(), &SdfParams::default(), mode).unwrap();
        assert_eq!(atlas.mode(), mode);
        assert!(atlas.validate().is_ok());

        let entries = atlas.entries();
        assert_eq!(entries.len(), GLYPH_COUNT);
        let mut offset = 0;
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.char_code, FIRST_CHAR + i as u32);
            assert_eq!(entry.offset, offset);
            assert!(entry.encoded_size > 0);
            offset += entry.encoded_size;
        }
        assert_eq!(offset as usize, atlas.data().len());
        assert_eq!(entries[GLYPH_COUNT - 1].char_code, LAST_CHAR);
    }
}

#[test]
fn raw_data_is_field() {
    let params = SdfParams::default();
    let atlas = build_atlas(&rings(), &params, CodecMode::Raw).unwrap();
    assert_eq!(atlas.data().len(), atlas.pixel_count());

    for view in atlas.glyphs() {
        let entry = view.entry;
        assert_eq!(entry.encoded_size as usize, entry.pixel_count());
        assert_eq!(u32::from(entry.height), ASCENT + DESCENT);

        let c = entry.char().unwrap();
        if c != ' ' {
            assert_eq!(u32::from(entry.width), Rings::width(c));
        }
        let coverage = rings().rasterize(c).unwrap();
        let expected = distance_field(&GlyphMask::from_coverage(&coverage), &params).unwrap();
        assert_eq!(view.bytes, expected.pixels());
    }
}

#[test]
fn nibble_decode_is_close() {
    let params = SdfParams::default();
    let raw = build_atlas(&rings(), &params, CodecMode::Raw).unwrap();
    let packed = build_atlas(&rings(), &params, CodecMode::PairedNibble).unwrap();

    for (a, b) in raw.glyphs().zip(packed.glyphs()) {
        assert_eq!(a.entry.width, b.entry.width);
        assert_eq!(a.entry.height, b.entry.height);
        let decoded = b.decode().unwrap();
        for (&orig, &dec) in a.bytes.iter().zip(decoded.pixels()) {
            assert!(dec <= orig);
            assert!(orig - dec < BUCKET_SCALE);
        }
    }
}

#[test]
fn space_is_blank() {
    let atlas = build_atlas(&rings(), &SdfParams::default(), CodecMode::Raw).unwrap();
    let space = atlas.entry(u32::from(' ')).unwrap();
    assert_eq!(space.offset, 0);
    assert_eq!((space.width, space.height), (5, 16));
    let bytes = atlas.glyph_bytes(u32::from(' ')).unwrap();
    assert!(bytes.iter().all(|&v| v == 0));
}

#[test]
fn missing_glyph_aborts() {
    let rasterizer = Rings { missing: Some('A') };
    let err = build_atlas(&rasterizer, &SdfParams::default(), CodecMode::PairedNibble).unwrap_err();
    assert_eq!(err.char_code, 65);
    assert!(matches!(
        err.source,
        GlyphError::Raster(RasterError::MissingGlyph('A'))
    ));
}

#[test]
fn deterministic() {
    let params = SdfParams::new(2.0, 0.3, 0.8);
    let a = build_atlas(&rings(), &params, CodecMode::PairedNibble).unwrap();
    let b = build_atlas(&rings(), &params, CodecMode::PairedNibble).unwrap();
    assert_eq!(a, b);
}
