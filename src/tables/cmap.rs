use std::io::{Read, Seek};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{
    CmapDumpError,
    buffer::{FontBufReader, FontBufReaderError},
};

use super::{TableEncodingError, TableMetadata};

/// Highest valid Unicode scalar value, group ranges are clamped to it
const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// A representation of the [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
/// with every encoding subtable decoded in the order the table stores them.
#[derive(Debug)]
pub struct Cmap {
    /// The version of the cmap table
    /// it's almost guarenteed to be set to zero
    version: u16,

    subtables: Vec<Subtable>,
}

impl Cmap {
    /// Parses the cmap table described by `metadata`.
    ///
    /// Every encoding record is followed to its subtable; subtables in a
    /// format without a codepoint mapping here are kept with an empty
    /// mapping so the subtable order stays intact.
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut FontBufReader<B>,
        metadata: &TableMetadata,
    ) -> Result<Self, CmapDumpError> {
        if metadata.length < 4 {
            return Err(TableEncodingError::InvalidBufferLength(4, metadata.length as usize).into());
        }

        let table_start = u64::from(metadata.offset);
        reader.seek_to(table_start)?;

        let version = reader.read_u16()?;
        let num_tables = reader.read_u16()?;

        // 8 bytes per encoding record
        let mut records = Vec::with_capacity(usize::from(num_tables));
        for _ in 0..num_tables {
            records.push(EncodingRecord {
                platform_id: PlatformId::from(reader.read_u16()?),
                encoding_id: reader.read_u16()?,
                offset: reader.read_u32()?,
            });
        }

        let mut subtables = Vec::with_capacity(records.len());
        for record in records {
            reader.seek_to(table_start + u64::from(record.offset))?;
            let subtable = Subtable::from_reader(reader, record)?;
            debug!(
                "cmap subtable platform {:?} encoding {} format {} with {} codepoint(s)",
                subtable.platform_id(),
                subtable.encoding_id(),
                subtable.format(),
                subtable.len()
            );
            subtables.push(subtable);
        }

        Ok(Self { version, subtables })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// The subtables in stored order
    pub fn subtables(&self) -> &[Subtable] {
        &self.subtables
    }

    /// The subtable a text renderer would map characters with: the
    /// Unicode encoding with the widest coverage. Subtables whose
    /// platform/encoding pair has no priority are never picked, ties go
    /// to the first one stored.
    pub fn preferred_subtable(&self) -> Option<&Subtable> {
        self.subtables
            .iter()
            .filter_map(|subtable| Some((subtable.priority()?, subtable)))
            .min_by_key(|(priority, _)| *priority)
            .map(|(_, subtable)| subtable)
    }
}

/// An encoding record, pointing at a subtable relative to the
/// start of the cmap table
#[derive(Debug, Clone, Copy)]
struct EncodingRecord {
    platform_id: PlatformId,
    encoding_id: u16,
    offset: u32,
}

/// Represents the platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    Reserved,
    Microsoft,
    Custom,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Reserved,
            3 => Self::Microsoft,
            4 => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

/// Subtable formats which carry a codepoint mapping this crate decodes
pub const SUPPORTED_FORMATS: [u16; 6] = [0, 4, 6, 10, 12, 13];

/// A decoded cmap [sub table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
#[derive(Debug)]
pub struct Subtable {
    platform_id: PlatformId,

    /// The platform specific encoding identifier
    encoding_id: u16,

    format: u16,

    /// Codepoint to glyph id, in the order the subtable lists them.
    /// A codepoint listed twice keeps its first glyph.
    mapping: IndexMap<u32, u16>,
}

impl Subtable {
    fn from_reader<B: Read + Seek>(
        reader: &mut FontBufReader<B>,
        record: EncodingRecord,
    ) -> Result<Self, FontBufReaderError> {
        let format = reader.read_u16()?;
        let mut mapping = IndexMap::new();

        match format {
            0 => read_format0(reader, &mut mapping)?,
            4 => read_format4(reader, &mut mapping)?,
            6 => read_format6(reader, &mut mapping)?,
            10 => read_format10(reader, &mut mapping)?,
            12 => read_groups(reader, &mut mapping, |start_glyph, offset| {
                start_glyph.wrapping_add(offset)
            })?,
            13 => read_groups(reader, &mut mapping, |glyph, _| glyph)?,
            _ => warn!(
                "cmap subtable format {format} (platform {:?}, encoding {}) is not decoded",
                record.platform_id, record.encoding_id
            ),
        }

        Ok(Self {
            platform_id: record.platform_id,
            encoding_id: record.encoding_id,
            format,
            mapping,
        })
    }

    pub fn platform_id(&self) -> PlatformId {
        self.platform_id
    }

    pub fn encoding_id(&self) -> u16 {
        self.encoding_id
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    /// Rank of this subtable's encoding, lower is preferred. `None` for
    /// encodings that are not Unicode.
    pub fn priority(&self) -> Option<u8> {
        match (self.platform_id, self.encoding_id) {
            // UCS-4
            (PlatformId::Microsoft, 10) => Some(0),
            // Unicode full repertoire
            (PlatformId::Unicode, 6) => Some(1),
            // Unicode 2.0 full repertoire
            (PlatformId::Unicode, 4) => Some(2),
            // UCS-2
            (PlatformId::Microsoft, 1) => Some(3),
            (PlatformId::Unicode, 3) => Some(4),
            (PlatformId::Unicode, 2) => Some(5),
            (PlatformId::Unicode, 1) => Some(6),
            (PlatformId::Unicode, 0) => Some(7),
            _ => None,
        }
    }

    /// Iterates the codepoints in mapping order
    pub fn codepoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.mapping.keys().copied()
    }

    /// Iterates (codepoint, glyph id) pairs in mapping order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        self.mapping.iter().map(|(&cp, &gid)| (cp, gid))
    }

    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.mapping.get(&codepoint).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

fn insert(mapping: &mut IndexMap<u32, u16>, codepoint: u32, glyph_id: u16) {
    mapping.entry(codepoint).or_insert(glyph_id);
}

/// Byte encoding table, 256 single byte glyph ids
fn read_format0<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    mapping: &mut IndexMap<u32, u16>,
) -> Result<(), FontBufReaderError> {
    reader.skip(4)?; // length, language

    let mut glyphs = [0u8; 256];
    reader.read_exact(&mut glyphs)?;

    for (codepoint, glyph) in (0u32..).zip(glyphs) {
        insert(mapping, codepoint, u16::from(glyph));
    }
    Ok(())
}

/// Segment mapping to delta values
fn read_format4<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    mapping: &mut IndexMap<u32, u16>,
) -> Result<(), FontBufReaderError> {
    let length = usize::from(reader.read_u16()?);
    reader.skip(2)?; // language
    let seg_count = usize::from(reader.read_u16()? / 2);
    reader.skip(6)?; // searchRange, entrySelector, rangeShift

    let end_codes = read_u16_array(reader, seg_count)?;
    reader.skip(2)?; // reservedPad
    let start_codes = read_u16_array(reader, seg_count)?;
    let id_deltas = read_u16_array(reader, seg_count)?;
    let id_range_offsets = read_u16_array(reader, seg_count)?;

    // whatever the declared length leaves after the segment arrays
    let glyph_count = length.saturating_sub(16 + 8 * seg_count) / 2;
    let glyph_id_array = read_u16_array(reader, glyph_count)?;

    for (i, (&start, &end)) in start_codes.iter().zip(&end_codes).enumerate() {
        // the final segment only terminates the search
        if i + 1 == seg_count {
            break;
        }
        if end < start {
            warn!("cmap format 4 segment {i} ends (0x{end:04x}) before it starts (0x{start:04x})");
            continue;
        }

        let delta = id_deltas[i];
        let range_offset = usize::from(id_range_offsets[i]);

        for codepoint in start..=end {
            let glyph_id = if range_offset == 0 {
                codepoint.wrapping_add(delta)
            } else {
                // idRangeOffset is relative to its own slot in the array
                let index = (range_offset / 2 + usize::from(codepoint - start))
                    .checked_sub(seg_count - i);
                match index.and_then(|index| glyph_id_array.get(index)) {
                    Some(0) | None => 0,
                    Some(&glyph) => glyph.wrapping_add(delta),
                }
            };
            insert(mapping, u32::from(codepoint), glyph_id);
        }
    }
    Ok(())
}

fn read_u16_array<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    count: usize,
) -> Result<Vec<u16>, FontBufReaderError> {
    (0..count).map(|_| reader.read_u16()).collect()
}

/// Trimmed table mapping
fn read_format6<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    mapping: &mut IndexMap<u32, u16>,
) -> Result<(), FontBufReaderError> {
    reader.skip(4)?; // length, language
    let first_code = u32::from(reader.read_u16()?);
    let entry_count = u32::from(reader.read_u16()?);

    for i in 0..entry_count {
        let glyph_id = reader.read_u16()?;
        insert(mapping, first_code + i, glyph_id);
    }
    Ok(())
}

/// Trimmed array, the 32 bit sibling of format 6
fn read_format10<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    mapping: &mut IndexMap<u32, u16>,
) -> Result<(), FontBufReaderError> {
    reader.skip(10)?; // reserved, length, language
    let start_char_code = reader.read_u32()?;
    let num_chars = reader.read_u32()?;

    for i in 0..num_chars {
        let glyph_id = reader.read_u16()?;
        match start_char_code.checked_add(i) {
            Some(codepoint) if codepoint <= MAX_CODEPOINT => insert(mapping, codepoint, glyph_id),
            _ => break,
        }
    }
    Ok(())
}

/// Sequential (format 12) and many-to-one (format 13) range groups.
/// `glyph_for` maps the group's start glyph and the codepoint's offset in
/// the group to a glyph id.
fn read_groups<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    mapping: &mut IndexMap<u32, u16>,
    glyph_for: impl Fn(u32, u32) -> u32,
) -> Result<(), FontBufReaderError> {
    reader.skip(10)?; // reserved, length, language
    let num_groups = reader.read_u32()?;

    for _ in 0..num_groups {
        let start_char_code = reader.read_u32()?;
        let end_char_code = reader.read_u32()?;
        let start_glyph_id = reader.read_u32()?;

        let end = end_char_code.min(MAX_CODEPOINT);
        if end < end_char_code {
            warn!("cmap group 0x{start_char_code:x}..0x{end_char_code:x} clamped to 0x{MAX_CODEPOINT:x}");
        }

        for codepoint in start_char_code..=end {
            // glyph ids are 16 bit in every other table
            let glyph_id = glyph_for(start_glyph_id, codepoint - start_char_code) as u16;
            insert(mapping, codepoint, glyph_id);
        }
    }
    Ok(())
}
