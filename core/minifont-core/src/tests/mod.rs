//! Shared test support: a synthetic TrueType font built in memory.
//!
//! The font carries the full core table set with real checksums and four
//! glyphs (.notdef plus a triangle outline mapped to A, B and C), so pipeline
//! tests run against a valid font without binary fixtures.

use allsorts::binary::read::ReadScope;
use allsorts::font::MatchingPresentation;
use allsorts::font_data::FontData;
use allsorts::tables::FontTableProvider;

/// Characters the sample font maps, to glyphs 1 through 3.
pub(crate) const SAMPLE_CHARS: &str = "ABC";

const SFNT_CHECKSUM: u32 = 0xB1B0_AFBA;

/// A complete TrueType font: the ten core tables plus stub cvt /fpgm/prep
/// hinting tables.
pub(crate) fn sample_font() -> Vec<u8> {
    let glyph = triangle_glyph();
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    push_u16(&mut loca, 0);
    push_u16(&mut loca, 0); // .notdef is empty
    for _ in 0..3 {
        glyf.extend_from_slice(&glyph);
        push_u16(&mut loca, (glyf.len() / 2) as u16);
    }

    let mut hmtx = Vec::new();
    for _ in 0..4 {
        push_u16(&mut hmtx, 500); // advance width
        push_i16(&mut hmtx, 0); // left side bearing
    }

    let tables: Vec<([u8; 4], Vec<u8>)> = vec![
        (*b"OS/2", os2()),
        (*b"cmap", cmap()),
        (*b"cvt ", vec![0, 0, 0, 40]),
        (*b"fpgm", vec![0xB0, 0x00]),
        (*b"glyf", glyf),
        (*b"head", head()),
        (*b"hhea", hhea()),
        (*b"hmtx", hmtx),
        (*b"loca", loca),
        (*b"maxp", maxp()),
        (*b"name", name()),
        (*b"post", post()),
        (*b"prep", vec![0xB0, 0x00]),
    ];
    assemble(&tables)
}

/// Parse `font` (sfnt or WOFF2) with allsorts and check that every char of
/// `text` maps to a real glyph.
pub(crate) fn assert_maps_chars(font: &[u8], text: &str) {
    let scope = ReadScope::new(font);
    let font_file = scope.read::<FontData<'_>>().expect("parse font");
    let provider = font_file.table_provider(0).expect("table provider");
    let mut font = allsorts::Font::new(provider).expect("load font");
    for ch in text.chars() {
        let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_ne!(glyph_id, 0, "no glyph for {ch:?}");
    }
}

/// The inverse of [`assert_maps_chars`]: every char of `text` must map to
/// glyph 0.
pub(crate) fn assert_lacks_chars(font: &[u8], text: &str) {
    let scope = ReadScope::new(font);
    let font_file = scope.read::<FontData<'_>>().expect("parse font");
    let provider = font_file.table_provider(0).expect("table provider");
    let mut font = allsorts::Font::new(provider).expect("load font");
    for ch in text.chars() {
        let (glyph_id, _) = font.lookup_glyph_index(ch, MatchingPresentation::NotRequired, None);
        assert_eq!(glyph_id, 0, "unexpected glyph for {ch:?}");
    }
}

/// Number of glyphs in `font` (sfnt or WOFF2), from its maxp table.
pub(crate) fn glyph_count(font: &[u8]) -> u16 {
    let scope = ReadScope::new(font);
    let font_file = scope.read::<FontData<'_>>().expect("parse font");
    let provider = font_file.table_provider(0).expect("table provider");
    let maxp = provider
        .read_table_data(u32::from_be_bytes(*b"maxp"))
        .expect("read maxp");
    u16::from_be_bytes([maxp[4], maxp[5]])
}

/// One closed contour: (0,0), (500,0), (250,700).
fn triangle_glyph() -> Vec<u8> {
    let mut g = Vec::new();
    push_i16(&mut g, 1); // numberOfContours
    push_i16(&mut g, 0); // xMin
    push_i16(&mut g, 0); // yMin
    push_i16(&mut g, 500); // xMax
    push_i16(&mut g, 700); // yMax
    push_u16(&mut g, 2); // endPtsOfContours
    push_u16(&mut g, 0); // instructionLength
    g.extend_from_slice(&[0x31, 0x21, 0x03]); // point flags
    push_i16(&mut g, 500); // x deltas: (same), 500, then -250 as a short
    g.push(250);
    push_i16(&mut g, 700); // y deltas: (same), (same), 700
    g
}

fn head() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000); // version
    push_u32(&mut t, 0x0001_0000); // fontRevision
    push_u32(&mut t, 0); // checkSumAdjustment, patched in assemble
    push_u32(&mut t, 0x5F0F_3CF5); // magicNumber
    push_u16(&mut t, 0x0003); // flags
    push_u16(&mut t, 1000); // unitsPerEm
    t.extend_from_slice(&[0; 16]); // created + modified
    push_i16(&mut t, 0); // xMin
    push_i16(&mut t, 0); // yMin
    push_i16(&mut t, 500); // xMax
    push_i16(&mut t, 700); // yMax
    push_u16(&mut t, 0); // macStyle
    push_u16(&mut t, 8); // lowestRecPPEM
    push_i16(&mut t, 2); // fontDirectionHint
    push_i16(&mut t, 0); // indexToLocFormat, short
    push_i16(&mut t, 0); // glyphDataFormat
    t
}

fn maxp() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000);
    push_u16(&mut t, 4); // numGlyphs
    push_u16(&mut t, 3); // maxPoints
    push_u16(&mut t, 1); // maxContours
    push_u16(&mut t, 0); // maxCompositePoints
    push_u16(&mut t, 0); // maxCompositeContours
    push_u16(&mut t, 2); // maxZones
    push_u16(&mut t, 0); // maxTwilightPoints
    push_u16(&mut t, 0); // maxStorage
    push_u16(&mut t, 0); // maxFunctionDefs
    push_u16(&mut t, 0); // maxInstructionDefs
    push_u16(&mut t, 0); // maxStackElements
    push_u16(&mut t, 0); // maxSizeOfInstructions
    push_u16(&mut t, 0); // maxComponentElements
    push_u16(&mut t, 0); // maxComponentDepth
    t
}

fn hhea() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0001_0000);
    push_i16(&mut t, 800); // ascender
    push_i16(&mut t, -200); // descender
    push_i16(&mut t, 0); // lineGap
    push_u16(&mut t, 500); // advanceWidthMax
    push_i16(&mut t, 0); // minLeftSideBearing
    push_i16(&mut t, 0); // minRightSideBearing
    push_i16(&mut t, 500); // xMaxExtent
    push_i16(&mut t, 1); // caretSlopeRise
    push_i16(&mut t, 0); // caretSlopeRun
    push_i16(&mut t, 0); // caretOffset
    t.extend_from_slice(&[0; 8]); // reserved
    push_i16(&mut t, 0); // metricDataFormat
    push_u16(&mut t, 4); // numberOfHMetrics
    t
}

fn cmap() -> Vec<u8> {
    let mut t = Vec::new();
    push_u16(&mut t, 0); // version
    push_u16(&mut t, 1); // numTables
    push_u16(&mut t, 3); // platformID, Windows
    push_u16(&mut t, 1); // encodingID, Unicode BMP
    push_u32(&mut t, 12); // subtable offset

    // Format 4: one segment for A..C, plus the required 0xFFFF terminator.
    push_u16(&mut t, 4); // format
    push_u16(&mut t, 32); // length
    push_u16(&mut t, 0); // language
    push_u16(&mut t, 4); // segCountX2
    push_u16(&mut t, 4); // searchRange
    push_u16(&mut t, 1); // entrySelector
    push_u16(&mut t, 0); // rangeShift
    push_u16(&mut t, 0x43); // endCode
    push_u16(&mut t, 0xFFFF);
    push_u16(&mut t, 0); // reservedPad
    push_u16(&mut t, 0x41); // startCode
    push_u16(&mut t, 0xFFFF);
    push_u16(&mut t, 0xFFC0); // idDelta, maps 0x41 to glyph 1
    push_u16(&mut t, 1);
    push_u16(&mut t, 0); // idRangeOffset
    push_u16(&mut t, 0);
    t
}

fn name() -> Vec<u8> {
    let family: Vec<u8> = "Mini Sans"
        .encode_utf16()
        .flat_map(u16::to_be_bytes)
        .collect();
    let mut t = Vec::new();
    push_u16(&mut t, 0); // format
    push_u16(&mut t, 1); // count
    push_u16(&mut t, 18); // stringOffset
    push_u16(&mut t, 3); // platformID
    push_u16(&mut t, 1); // encodingID
    push_u16(&mut t, 0x0409); // languageID
    push_u16(&mut t, 1); // nameID, font family
    push_u16(&mut t, family.len() as u16);
    push_u16(&mut t, 0); // offset within string storage
    t.extend_from_slice(&family);
    t
}

fn os2() -> Vec<u8> {
    let mut t = Vec::new();
    push_u16(&mut t, 4); // version
    push_i16(&mut t, 500); // xAvgCharWidth
    push_u16(&mut t, 400); // usWeightClass
    push_u16(&mut t, 5); // usWidthClass
    push_u16(&mut t, 0); // fsType
    push_i16(&mut t, 650); // ySubscriptXSize
    push_i16(&mut t, 600); // ySubscriptYSize
    push_i16(&mut t, 0); // ySubscriptXOffset
    push_i16(&mut t, 75); // ySubscriptYOffset
    push_i16(&mut t, 650); // ySuperscriptXSize
    push_i16(&mut t, 600); // ySuperscriptYSize
    push_i16(&mut t, 0); // ySuperscriptXOffset
    push_i16(&mut t, 350); // ySuperscriptYOffset
    push_i16(&mut t, 50); // yStrikeoutSize
    push_i16(&mut t, 300); // yStrikeoutPosition
    push_i16(&mut t, 0); // sFamilyClass
    t.extend_from_slice(&[0; 10]); // panose
    push_u32(&mut t, 1); // ulUnicodeRange1, Basic Latin
    push_u32(&mut t, 0);
    push_u32(&mut t, 0);
    push_u32(&mut t, 0);
    t.extend_from_slice(b"MINI"); // achVendID
    push_u16(&mut t, 0x0040); // fsSelection, regular
    push_u16(&mut t, 0x41); // usFirstCharIndex
    push_u16(&mut t, 0x43); // usLastCharIndex
    push_i16(&mut t, 800); // sTypoAscender
    push_i16(&mut t, -200); // sTypoDescender
    push_i16(&mut t, 0); // sTypoLineGap
    push_u16(&mut t, 800); // usWinAscent
    push_u16(&mut t, 200); // usWinDescent
    push_u32(&mut t, 1); // ulCodePageRange1, Latin 1
    push_u32(&mut t, 0); // ulCodePageRange2
    push_i16(&mut t, 500); // sxHeight
    push_i16(&mut t, 700); // sCapHeight
    push_u16(&mut t, 0); // usDefaultChar
    push_u16(&mut t, 0x20); // usBreakChar
    push_u16(&mut t, 1); // usMaxContext
    t
}

fn post() -> Vec<u8> {
    let mut t = Vec::new();
    push_u32(&mut t, 0x0003_0000); // version, no glyph names
    push_u32(&mut t, 0); // italicAngle
    push_i16(&mut t, -100); // underlinePosition
    push_i16(&mut t, 50); // underlineThickness
    push_u32(&mut t, 0); // isFixedPitch
    t.extend_from_slice(&[0; 16]); // memory hints
    t
}

fn assemble(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let count = tables.len() as u16;
    let entry_selector = count.ilog2() as u16;
    let search_range = 16 * (1_u16 << entry_selector);
    let range_shift = 16 * count - search_range;

    let mut font = Vec::new();
    push_u32(&mut font, 0x0001_0000);
    push_u16(&mut font, count);
    push_u16(&mut font, search_range);
    push_u16(&mut font, entry_selector);
    push_u16(&mut font, range_shift);

    let data_start = 12 + tables.len() * 16;
    let mut heap = Vec::new();
    let mut head_offset = None;
    for (tag, data) in tables {
        let offset = data_start + heap.len();
        if tag == b"head" {
            head_offset = Some(offset);
        }
        let start = heap.len();
        heap.extend_from_slice(data);
        while heap.len() % 4 != 0 {
            heap.push(0);
        }
        font.extend_from_slice(tag);
        push_u32(&mut font, checksum(&heap[start..]));
        push_u32(&mut font, offset as u32);
        push_u32(&mut font, data.len() as u32);
    }
    font.extend_from_slice(&heap);

    let adjustment = SFNT_CHECKSUM.wrapping_sub(checksum(&font));
    if let Some(offset) = head_offset {
        font[offset + 8..offset + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    font
}

fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0_u32;
    for chunk in data.chunks(4) {
        let mut word = [0_u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

fn push_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_i16(buffer: &mut Vec<u8>, value: i16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

#[test]
fn sample_font_is_loadable() {
    let font = sample_font();
    assert_maps_chars(&font, SAMPLE_CHARS);
}

#[test]
fn sample_font_does_not_map_unused_chars() {
    let font = sample_font();
    assert_lacks_chars(&font, "DZz");
    assert_eq!(glyph_count(&font), 4);
}
