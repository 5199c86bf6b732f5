//! TrueType/OpenType faces backed by `ttf-parser`.
//!
//! Subsetting keeps the font structurally intact: glyph outlines that are not
//! needed are emptied, every other table is copied. Glyph ids and `cmap` stay
//! valid, so reading systems map text exactly as with the full font.

use std::collections::{BTreeSet, HashSet};

use ttf_parser::{Face, Permissions, name_id};

use super::FontFile;
use crate::css::{FontStyle, FontWeight};
use crate::error::{Error, Result};

/// A parsed TrueType or OpenType face.
#[derive(Debug, Clone)]
pub struct TrueTypeFont {
    data: Vec<u8>,
    index: u32,
    family: String,
    weight: FontWeight,
    style: FontStyle,
    codepoints: HashSet<u32>,
    embeddable: bool,
    subsettable: bool,
    outlines: Outlines,
    digest: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outlines {
    /// `glyf`/`loca` outlines: subset by emptying unused glyphs.
    TrueType,
    /// CFF or anything else: embedded whole.
    Other,
}

impl TrueTypeFont {
    /// Parse face `index` of `data` (0 unless `data` is a collection).
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = Face::parse(&data, index)?;

        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::TYPOGRAPHIC_FAMILY)
            .chain(
                face.names()
                    .into_iter()
                    .filter(|name| name.name_id == name_id::FAMILY),
            )
            .find_map(|name| name.to_string())
            .unwrap_or_default();

        let style = match face.style() {
            ttf_parser::Style::Normal => FontStyle::Normal,
            ttf_parser::Style::Italic => FontStyle::Italic,
            ttf_parser::Style::Oblique => FontStyle::Oblique,
        };

        let mut codepoints = HashSet::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if subtable.is_unicode() {
                    subtable.codepoints(|cp| {
                        codepoints.insert(cp);
                    });
                }
            }
        }

        let embeddable = !matches!(face.permissions(), Some(Permissions::Restricted));
        let subsettable = face.is_subsetting_allowed();
        let outlines = if face.tables().glyf.is_some() && face.raw_face().table(ttf_parser::Tag::from_bytes(b"loca")).is_some() {
            Outlines::TrueType
        } else {
            Outlines::Other
        };
        let weight = FontWeight(face.weight().to_number());
        let digest = sha1_smol::Sha1::from(&data).hexdigest();

        Ok(Self {
            data,
            index,
            family,
            weight,
            style,
            codepoints,
            embeddable,
            subsettable,
            outlines,
            digest,
        })
    }

    /// Family name from the `name` table (typographic family preferred).
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> FontWeight {
        self.weight
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn subset_glyf(&self, chars: &BTreeSet<char>) -> Result<Vec<u8>> {
        let face = Face::parse(&self.data, self.index)?;
        let mut keep: BTreeSet<u16> = BTreeSet::new();
        keep.insert(0);
        for &c in chars {
            if let Some(glyph) = face.glyph_index(c) {
                keep.insert(glyph.0);
            }
        }

        let sfnt = Sfnt::parse(&self.data, self.index)?;
        let head = sfnt.table(b"head")?;
        let maxp = sfnt.table(b"maxp")?;
        let loca = sfnt.table(b"loca")?;
        let glyf = sfnt.table(b"glyf")?;

        let long_loca = read_u16(head, 50)? == 1;
        let num_glyphs = read_u16(maxp, 4)? as usize;
        let offsets = parse_loca(loca, num_glyphs, long_loca)?;
        // pull in composite components
        let mut pending: Vec<u16> = keep.iter().copied().collect();
        while let Some(glyph) = pending.pop() {
            for component in composite_components(glyph_slice(glyf, &offsets, glyph as usize)) {
                if (component as usize) < num_glyphs && keep.insert(component) {
                    pending.push(component);
                }
            }
        }

        let mut new_glyf = Vec::new();
        let mut new_loca = Vec::with_capacity((num_glyphs + 1) * 4);
        for g in 0..num_glyphs {
            new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());
            if keep.contains(&(g as u16)) {
                new_glyf.extend_from_slice(glyph_slice(glyf, &offsets, g));
                while new_glyf.len() % 4 != 0 {
                    new_glyf.push(0);
                }
            }
        }
        new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());

        let mut new_head = head.to_vec();
        new_head[8..12].copy_from_slice(&[0; 4]);
        new_head[50..52].copy_from_slice(&1u16.to_be_bytes());

        let mut tables: Vec<([u8; 4], Vec<u8>)> = Vec::with_capacity(sfnt.records.len());
        for record in &sfnt.records {
            let data = match &record.tag {
                b"glyf" => new_glyf.clone(),
                b"loca" => new_loca.clone(),
                b"head" => new_head.clone(),
                // signatures no longer match the rewritten tables
                b"DSIG" => continue,
                _ => sfnt.record_data(record)?.to_vec(),
            };
            tables.push((record.tag, data));
        }

        log::debug!(
            "subset {}: kept {} of {num_glyphs} glyphs",
            self.family,
            keep.len()
        );
        Ok(write_sfnt(sfnt.version, tables))
    }
}

impl FontFile for TrueTypeFont {
    fn has_glyph(&self, c: char) -> bool {
        self.codepoints.contains(&(c as u32))
    }

    fn can_embed(&self) -> bool {
        self.embeddable
    }

    fn can_subset(&self) -> bool {
        self.subsettable
    }

    fn subset(&self, chars: &BTreeSet<char>) -> Result<Vec<u8>> {
        match self.outlines {
            Outlines::TrueType => self.subset_glyf(chars),
            Outlines::Other => Ok(self.data.clone()),
        }
    }

    fn extension(&self) -> &str {
        match self.outlines {
            Outlines::TrueType => "ttf",
            Outlines::Other => "otf",
        }
    }

    fn identity(&self) -> String {
        format!("{}:{}", self.digest, self.index)
    }
}

// ----------------------------------------------------------------------------
// Raw sfnt access
// ----------------------------------------------------------------------------

struct TableRecord {
    tag: [u8; 4],
    offset: usize,
    length: usize,
}

struct Sfnt<'a> {
    data: &'a [u8],
    version: u32,
    records: Vec<TableRecord>,
}

impl<'a> Sfnt<'a> {
    fn parse(data: &'a [u8], index: u32) -> Result<Self> {
        let mut start = 0;
        if data.starts_with(b"ttcf") {
            let count = read_u32(data, 8)?;
            if index >= count {
                return Err(Error::Subset(format!("no face {index} in collection")));
            }
            start = read_u32(data, 12 + 4 * index as usize)? as usize;
        }

        let version = read_u32(data, start)?;
        let num_tables = read_u16(data, start + 4)? as usize;
        let mut records = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let at = start + 12 + i * 16;
            let tag = data
                .get(at..at + 4)
                .and_then(|tag| <[u8; 4]>::try_from(tag).ok())
                .ok_or_else(|| truncated("table directory"))?;
            records.push(TableRecord {
                tag,
                offset: read_u32(data, at + 8)? as usize,
                length: read_u32(data, at + 12)? as usize,
            });
        }
        Ok(Self {
            data,
            version,
            records,
        })
    }

    fn record_data(&self, record: &TableRecord) -> Result<&'a [u8]> {
        self.data
            .get(record.offset..record.offset + record.length)
            .ok_or_else(|| truncated(&String::from_utf8_lossy(&record.tag)))
    }

    fn table(&self, tag: &[u8; 4]) -> Result<&'a [u8]> {
        let record = self
            .records
            .iter()
            .find(|record| &record.tag == tag)
            .ok_or_else(|| Error::Subset(format!("missing {} table", String::from_utf8_lossy(tag))))?;
        self.record_data(record)
    }
}

fn truncated(what: &str) -> Error {
    Error::Subset(format!("truncated {what}"))
}

fn read_u16(data: &[u8], at: usize) -> Result<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| truncated("font data"))
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| truncated("font data"))
}

fn parse_loca(loca: &[u8], num_glyphs: usize, long: bool) -> Result<Vec<usize>> {
    (0..=num_glyphs)
        .map(|i| {
            if long {
                read_u32(loca, i * 4).map(|o| o as usize)
            } else {
                read_u16(loca, i * 2).map(|o| o as usize * 2)
            }
        })
        .collect()
}

fn glyph_slice<'a>(glyf: &'a [u8], offsets: &[usize], glyph: usize) -> &'a [u8] {
    match (offsets.get(glyph), offsets.get(glyph + 1)) {
        (Some(&start), Some(&end)) if start <= end && end <= glyf.len() => &glyf[start..end],
        _ => &[],
    }
}

/// Glyph ids referenced by a composite glyph (empty for simple glyphs).
fn composite_components(glyph: &[u8]) -> Vec<u16> {
    const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
    const WE_HAVE_A_SCALE: u16 = 0x0008;
    const MORE_COMPONENTS: u16 = 0x0020;
    const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
    const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

    let mut components = Vec::new();
    let contours = match read_u16(glyph, 0) {
        Ok(n) => n as i16,
        Err(_) => return components,
    };
    if contours >= 0 {
        return components;
    }

    let mut at = 10;
    loop {
        let (Ok(flags), Ok(index)) = (read_u16(glyph, at), read_u16(glyph, at + 2)) else {
            break;
        };
        components.push(index);
        at += 4;
        at += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            at += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            at += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            at += 8;
        }
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    components
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Assemble a single-face sfnt from `(tag, data)` pairs.
fn write_sfnt(version: u32, mut tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by(|a, b| a.0.cmp(&b.0));

    let num_tables = tables.len() as u16;
    let entry_selector = if num_tables == 0 { 0 } else { 15 - num_tables.leading_zeros() as u16 };
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range.min(num_tables * 16);

    let mut out = Vec::new();
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut offset = 12 + 16 * tables.len();
    let mut head_offset = None;
    for (tag, data) in &tables {
        out.extend_from_slice(tag);
        out.extend_from_slice(&checksum(data).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        if tag == b"head" {
            head_offset = Some(offset);
        }
        offset += data.len().next_multiple_of(4);
    }
    for (_, data) in &tables {
        out.extend_from_slice(data);
        out.resize(out.len().next_multiple_of(4), 0);
    }

    if let Some(head) = head_offset {
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(checksum(&out));
        out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal glyf font: glyph 0 (.notdef), 1 ('A'), 2 ('B'), 3 composite
    /// ('C', built from glyph 2).
    fn tiny_font() -> Vec<u8> {
        let simple = |marker: u8| {
            // one contour, bbox, endPts, no instructions, one point
            let mut g = vec![0, 1, 0, 0, 0, 0, 0, 10, 0, 10, 0, 0, 0, 0, 0x37];
            g.push(marker);
            g.resize(16, 0);
            g
        };
        let composite = {
            let mut g = vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 10, 0, 10];
            // flags (ARGS_ARE_XY_VALUES), glyph 2, two byte args
            g.extend_from_slice(&[0x00, 0x02, 0x00, 0x02, 0, 0]);
            g
        };
        let glyphs = [simple(0), simple(1), simple(2), composite];

        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        for g in &glyphs {
            loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());
            glyf.extend_from_slice(g);
        }
        loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());

        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        // indexToLocFormat 0 (short)

        let mut maxp = vec![0u8; 6];
        maxp[0..4].copy_from_slice(&0x0000_5000u32.to_be_bytes());
        maxp[4..6].copy_from_slice(&(glyphs.len() as u16).to_be_bytes());

        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        hhea[34..36].copy_from_slice(&(glyphs.len() as u16).to_be_bytes());
        let hmtx = vec![0u8; glyphs.len() * 4];

        // cmap: format 4, A-C -> 1-3
        let mut sub = Vec::new();
        let seg_count = 2u16;
        sub.extend_from_slice(&4u16.to_be_bytes());
        sub.extend_from_slice(&(16 + seg_count * 8).to_be_bytes());
        sub.extend_from_slice(&0u16.to_be_bytes());
        sub.extend_from_slice(&(seg_count * 2).to_be_bytes());
        sub.extend_from_slice(&2u16.to_be_bytes());
        sub.extend_from_slice(&0u16.to_be_bytes());
        sub.extend_from_slice(&2u16.to_be_bytes());
        for end in [0x43u16, 0xFFFF] {
            sub.extend_from_slice(&end.to_be_bytes());
        }
        sub.extend_from_slice(&0u16.to_be_bytes());
        for start in [0x41u16, 0xFFFF] {
            sub.extend_from_slice(&start.to_be_bytes());
        }
        for delta in [(1i16 - 0x41) as u16, 1] {
            sub.extend_from_slice(&delta.to_be_bytes());
        }
        for _ in 0..seg_count {
            sub.extend_from_slice(&0u16.to_be_bytes());
        }
        let mut cmap = Vec::new();
        cmap.extend_from_slice(&0u16.to_be_bytes());
        cmap.extend_from_slice(&1u16.to_be_bytes());
        cmap.extend_from_slice(&3u16.to_be_bytes());
        cmap.extend_from_slice(&1u16.to_be_bytes());
        cmap.extend_from_slice(&12u32.to_be_bytes());
        cmap.extend_from_slice(&sub);

        write_sfnt(
            0x0001_0000,
            vec![
                (*b"cmap", cmap),
                (*b"glyf", glyf),
                (*b"head", head),
                (*b"hhea", hhea),
                (*b"hmtx", hmtx),
                (*b"loca", loca),
                (*b"maxp", maxp),
            ],
        )
    }

    #[test]
    fn test_parse_tiny_font() {
        let font = TrueTypeFont::from_data(tiny_font(), 0).unwrap();
        assert!(font.has_glyph('A'));
        assert!(font.has_glyph('C'));
        assert!(!font.has_glyph('Z'));
        // no OS/2 table: nothing restricts embedding
        assert!(font.can_embed());
        assert_eq!(font.extension(), "ttf");
        assert_eq!(font.weight(), FontWeight::NORMAL);
    }

    #[test]
    fn test_subset_keeps_used_and_components() {
        let font = TrueTypeFont::from_data(tiny_font(), 0).unwrap();
        let subset = font.subset(&['C'].into_iter().collect()).unwrap();

        let sfnt = Sfnt::parse(&subset, 0).unwrap();
        let head = sfnt.table(b"head").unwrap();
        assert_eq!(read_u16(head, 50).unwrap(), 1);
        let offsets = parse_loca(sfnt.table(b"loca").unwrap(), 4, true).unwrap();
        let sizes: Vec<usize> = offsets.windows(2).map(|w| w[1] - w[0]).collect();
        // .notdef, 'B' (component of 'C') and 'C' survive; 'A' is emptied
        assert!(sizes[0] > 0);
        assert_eq!(sizes[1], 0);
        assert!(sizes[2] > 0);
        assert!(sizes[3] > 0);

        // still a valid font with the same character map
        let reparsed = TrueTypeFont::from_data(subset.clone(), 0).unwrap();
        assert!(reparsed.has_glyph('A'));
        assert_eq!(checksum(&subset), 0xB1B0_AFBA);
        assert!(subset.len() < font.data().len() + 8);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            TrueTypeFont::from_data(b"not a font".to_vec(), 0),
            Err(Error::FontParse(_))
        ));
    }

    #[test]
    fn test_composite_components() {
        let mut glyph = vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0, 0, 0];
        // first component: words, more components
        glyph.extend_from_slice(&[0x00, 0x21, 0x00, 0x05, 0, 0, 0, 0]);
        // second component: byte args and a scale
        glyph.extend_from_slice(&[0x00, 0x08, 0x00, 0x07, 0, 0, 0x40, 0x00]);
        assert_eq!(composite_components(&glyph), vec![5, 7]);
        assert!(composite_components(&[0, 1, 0, 0]).is_empty());
    }
}
