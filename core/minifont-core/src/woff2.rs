//! WOFF2 packaging of subset fonts.
//!
//! Only the container is produced here: the header, the flag/Base128 table
//! directory, and one brotli stream holding every table's bytes back to back.
//! Table data passes through untransformed; glyf and loca carry the null
//! transform marker so decoders reconstruct the original outlines bit for bit.

use std::borrow::Cow;
use std::io::Write;

use anyhow::{anyhow, bail, Result};

const WOFF2_SIGNATURE: u32 = 0x774F_4632;
const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
const SFNT_VERSION_CFF: u32 = u32::from_be_bytes(*b"OTTO");

const SFNT_HEADER_LEN: usize = 12;
const SFNT_RECORD_LEN: usize = 16;
const WOFF2_HEADER_LEN: usize = 48;

/// Transform version 3 in the two high flag bits: the null transform for
/// glyf and loca.
const NULL_TRANSFORM: u8 = 0b1100_0000;

/// Offset of checkSumAdjustment within the head table.
const HEAD_CHECKSUM_OFFSET: usize = 8;

/// TrueType instruction tables, dropped unless hinting is kept.
const HINTING_TAGS: [&[u8; 4]; 3] = [b"cvt ", b"fpgm", b"prep"];

/// The WOFF2 known-table array. A directory entry stores a table's index in
/// this array in its flags byte, or 63 followed by the explicit tag.
const KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post",
    b"cvt ", b"fpgm", b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT",
    b"EBLC", b"gasp", b"hdmx", b"kern", b"LTSH", b"PCLT", b"VDMX", b"vhea",
    b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC", b"JSTF", b"MATH",
    b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar",
    b"gvar", b"hsty", b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop",
    b"trak", b"Zapf", b"Silf", b"Glat", b"Gloc", b"Feat", b"Sill",
];

/// Package `sfnt` (a TrueType or CFF flavoured OpenType font) as a WOFF2
/// file. `keep_hinting` retains the cvt /fpgm/prep instruction tables, which
/// are otherwise stripped.
pub fn encode(sfnt: &[u8], keep_hinting: bool) -> Result<Vec<u8>> {
    Woff2Writer::new(sfnt, keep_hinting)?.into_bytes()
}

struct Table<'a> {
    tag: [u8; 4],
    data: Cow<'a, [u8]>,
}

struct Woff2Writer<'a> {
    flavor: u32,
    tables: Vec<Table<'a>>,
}

impl<'a> Woff2Writer<'a> {
    fn new(sfnt: &'a [u8], keep_hinting: bool) -> Result<Self> {
        let mut font = parse_sfnt(sfnt)?;
        if !keep_hinting {
            font.tables
                .retain(|table| !HINTING_TAGS.contains(&&table.tag));
        }
        if font.tables.is_empty() {
            bail!("font contains no tables");
        }
        move_loca_after_glyf(&mut font.tables);
        zero_head_checksum_adjustment(&mut font.tables);
        Ok(font)
    }

    fn into_bytes(self) -> Result<Vec<u8>> {
        let directory = self.directory()?;
        let compressed = compress(&self.stream())?;

        let mut file_len = WOFF2_HEADER_LEN + directory.len() + compressed.len();
        if file_len % 4 != 0 {
            file_len += 4 - file_len % 4;
        }

        let mut buffer = Vec::with_capacity(file_len);
        write_u32(&mut buffer, WOFF2_SIGNATURE);
        write_u32(&mut buffer, self.flavor);
        write_u32(&mut buffer, to_u32(file_len, "file length")?);
        write_u16(&mut buffer, to_u16(self.tables.len(), "table count")?);
        write_u16(&mut buffer, 0); // reserved
        write_u32(&mut buffer, to_u32(self.total_sfnt_size(), "sfnt size")?);
        write_u32(&mut buffer, to_u32(compressed.len(), "compressed length")?);
        write_u32(&mut buffer, 0); // WOFF version
        write_u32(&mut buffer, 0); // metadata offset
        write_u32(&mut buffer, 0); // metadata length
        write_u32(&mut buffer, 0); // original metadata length
        write_u32(&mut buffer, 0); // private block offset
        write_u32(&mut buffer, 0); // private block length
        debug_assert_eq!(buffer.len(), WOFF2_HEADER_LEN);

        buffer.extend_from_slice(&directory);
        buffer.extend_from_slice(&compressed);
        // The file itself is padded to a 4-byte boundary even without
        // metadata or private blocks.
        while buffer.len() % 4 != 0 {
            buffer.push(0);
        }
        Ok(buffer)
    }

    fn directory(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        for table in &self.tables {
            match known_tag_index(&table.tag) {
                Some(index) => {
                    let transform = if &table.tag == b"glyf" || &table.tag == b"loca" {
                        NULL_TRANSFORM
                    } else {
                        0
                    };
                    buffer.push(index | transform);
                }
                None => {
                    buffer.push(63);
                    buffer.extend_from_slice(&table.tag);
                }
            }
            write_uint_base128(&mut buffer, to_u32(table.data.len(), "table length")?);
        }
        Ok(buffer)
    }

    /// The uncompressed data stream: table contents in directory order with
    /// no padding between them.
    fn stream(&self) -> Vec<u8> {
        let mut stream = Vec::new();
        for table in &self.tables {
            stream.extend_from_slice(&table.data);
        }
        stream
    }

    /// Size of the sfnt a decoder reconstructs: header, directory, and every
    /// table padded back out to a 4-byte boundary.
    fn total_sfnt_size(&self) -> usize {
        let tables: usize = self
            .tables
            .iter()
            .map(|table| align4(table.data.len()))
            .sum();
        SFNT_HEADER_LEN + self.tables.len() * SFNT_RECORD_LEN + tables
    }
}

fn parse_sfnt(bytes: &[u8]) -> Result<Woff2Writer<'_>> {
    let mut cursor = bytes;
    let flavor = read_u32(&mut cursor)?;
    if flavor != SFNT_VERSION_TRUETYPE && flavor != SFNT_VERSION_CFF {
        bail!("unsupported sfnt version {flavor:#010x}");
    }
    let table_count = read_u16(&mut cursor)?;
    skip(&mut cursor, 6)?; // searchRange, entrySelector, rangeShift

    let mut tables = Vec::with_capacity(usize::from(table_count));
    for _ in 0..table_count {
        let tag = read_tag(&mut cursor)?;
        skip(&mut cursor, 4)?; // checksum
        let offset = read_u32(&mut cursor)? as usize;
        let length = read_u32(&mut cursor)? as usize;
        let data = offset
            .checked_add(length)
            .and_then(|end| bytes.get(offset..end))
            .ok_or_else(|| {
                anyhow!(
                    "table {} extends past end of font",
                    String::from_utf8_lossy(&tag)
                )
            })?;
        tables.push(Table {
            tag,
            data: Cow::Borrowed(data),
        });
    }

    Ok(Woff2Writer { flavor, tables })
}

/// WOFF2 requires loca to immediately follow glyf in the table directory;
/// sfnt directories sorted by tag put head/hhea/hmtx between them.
fn move_loca_after_glyf(tables: &mut Vec<Table<'_>>) {
    let Some(glyf) = tables.iter().position(|table| &table.tag == b"glyf") else {
        return;
    };
    let Some(loca) = tables.iter().position(|table| &table.tag == b"loca") else {
        return;
    };
    if loca == glyf + 1 {
        return;
    }
    let table = tables.remove(loca);
    let glyf = if loca < glyf { glyf - 1 } else { glyf };
    tables.insert(glyf + 1, table);
}

/// checkSumAdjustment goes stale the moment tables are dropped or reordered;
/// decoders recompute it while reconstructing the sfnt.
fn zero_head_checksum_adjustment(tables: &mut [Table<'_>]) {
    let Some(head) = tables.iter_mut().find(|table| &table.tag == b"head") else {
        return;
    };
    if head.data.len() < HEAD_CHECKSUM_OFFSET + 4 {
        return;
    }
    head.data.to_mut()[HEAD_CHECKSUM_OFFSET..HEAD_CHECKSUM_OFFSET + 4].fill(0);
}

fn compress(stream: &[u8]) -> Result<Vec<u8>> {
    let mut compressed = Vec::new();
    let mut writer = brotli::CompressorWriter::new(&mut compressed, 4096, 11, 22);
    writer.write_all(stream)?;
    drop(writer); // terminates the brotli stream
    Ok(compressed)
}

fn known_tag_index(tag: &[u8; 4]) -> Option<u8> {
    KNOWN_TAGS
        .iter()
        .position(|known| *known == tag)
        .map(|index| index as u8)
}

fn align4(len: usize) -> usize {
    len.div_ceil(4) * 4
}

fn read_u16(bytes: &mut &[u8]) -> Result<u16> {
    let [a, b, rest @ ..] = *bytes else {
        bail!("unexpected end of font data");
    };
    *bytes = rest;
    Ok(u16::from_be_bytes([*a, *b]))
}

fn read_u32(bytes: &mut &[u8]) -> Result<u32> {
    let [a, b, c, d, rest @ ..] = *bytes else {
        bail!("unexpected end of font data");
    };
    *bytes = rest;
    Ok(u32::from_be_bytes([*a, *b, *c, *d]))
}

fn read_tag(bytes: &mut &[u8]) -> Result<[u8; 4]> {
    let [a, b, c, d, rest @ ..] = *bytes else {
        bail!("unexpected end of font data");
    };
    *bytes = rest;
    Ok([*a, *b, *c, *d])
}

fn skip(bytes: &mut &[u8], count: usize) -> Result<()> {
    let rest = *bytes;
    if rest.len() < count {
        bail!("unexpected end of font data");
    }
    *bytes = &rest[count..];
    Ok(())
}

fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn write_uint_base128(buffer: &mut Vec<u8>, value: u32) {
    if value >= 1 << 28 {
        buffer.push(0x80 | (value >> 28) as u8);
    }
    if value >= 1 << 21 {
        buffer.push(0x80 | (value >> 21) as u8);
    }
    if value >= 1 << 14 {
        buffer.push(0x80 | (value >> 14) as u8);
    }
    if value >= 1 << 7 {
        buffer.push(0x80 | (value >> 7) as u8);
    }
    buffer.push((value & 127) as u8);
}

fn to_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| anyhow!("{what} overflows u16: {value}"))
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{what} overflows u32: {value}"))
}
