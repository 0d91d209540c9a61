use std::{
    fmt,
    io::{Read, Seek},
};

use log::debug;
use thiserror::Error;

use crate::{
    CmapDumpError,
    buffer::{FontBufReader, FontBufReaderError},
};

pub mod cmap;

/// TrueType outlines
pub const SFNT_VERSION_1_0: u32 = 0x0001_0000;
/// CFF outlines
pub const SFNT_TAG_OTTO: u32 = u32::from_be_bytes(*b"OTTO");
/// Apple TrueType
pub const SFNT_TAG_TRUE: u32 = u32::from_be_bytes(*b"true");

/// A 4 byte table identifier as found in the table directory.
/// For the list of registered tags, see the [Apple Documentation Table 2](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const CMAP: Tag = Tag(*b"cmap");
    pub const GLYF: Tag = Tag(*b"glyf");
    /// TrueType Collection header
    pub const TTCF: Tag = Tag(*b"ttcf");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // tags are supposed to be printable ascii, escape anything else
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// Represents the error messages which may occur when trying
/// to parse tables from raw binary buffers
#[derive(Error, Debug)]
pub enum TableEncodingError {
    #[error("The required buffer length for this table is {0} bytes, got {1} bytes")]
    InvalidBufferLength(usize, usize),

    #[error("Unknown sfnt version 0x{0:08x}, not a TrueType or OpenType font")]
    InvalidSfntVersion(u32),

    #[error("Font index {index} is out of range, the file holds {count} font(s)")]
    FontIndexOutOfRange { index: u32, count: u32 },

    #[error("Unsupported cmap subtable format {0}")]
    UnsupportedFormat(u16),
}

/// Represents the offset subtable directory and it's metadata
/// providing us with a important info such as the number of tables
#[derive(Debug)]
pub struct OffsetTable {
    scalar_type: u32,
    num_tables: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl OffsetTable {
    /// Constructs the offset sub table from a raw buffer
    /// the offset sub table buffer size must be 12 per the reference manual.
    pub fn from_buffer(buf: &[u8; 12]) -> Result<Self, TableEncodingError> {
        let scalar_type = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);

        if !matches!(
            scalar_type,
            SFNT_VERSION_1_0 | SFNT_TAG_OTTO | SFNT_TAG_TRUE
        ) {
            return Err(TableEncodingError::InvalidSfntVersion(scalar_type));
        }

        Ok(Self {
            scalar_type,
            num_tables: u16::from_be_bytes([buf[4], buf[5]]),
            search_range: u16::from_be_bytes([buf[6], buf[7]]),
            entry_selector: u16::from_be_bytes([buf[8], buf[9]]),
            range_shift: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }

    /// Parses an offset table which starts at `offset`, zero for plain
    /// fonts and the collection's font offset for members of a TTC
    pub(crate) fn from_reader<B: Read + Seek>(
        reader: &mut FontBufReader<B>,
        offset: u64,
    ) -> Result<Self, CmapDumpError> {
        reader.seek_to(offset)?;

        let mut buffer = [0u8; 12];
        reader.read_exact(&mut buffer)?;

        Ok(Self::from_buffer(&buffer)?)
    }

    /// Returns the number of tables exists in the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }

    /// Returns the sfnt version, either 0x00010000, 'OTTO' or 'true'
    pub fn scalar_type(&self) -> u32 {
        self.scalar_type
    }

    /// (maximum power of 2 <= num_tables) * 16
    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    /// log2(maximum power of 2 <= num_tables)
    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    /// num_tables * 16 - search_range
    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }
}

/// Resolves which offset table to read: 0 for a single font, otherwise
/// the `index`th entry of a TrueType Collection header.
pub(crate) fn offset_table_position<B: Read + Seek>(
    reader: &mut FontBufReader<B>,
    index: u32,
) -> Result<u64, CmapDumpError> {
    reader.seek_to(0)?;
    let tag = reader.read_tag()?;

    if tag != Tag::TTCF {
        if index != 0 {
            return Err(TableEncodingError::FontIndexOutOfRange { index, count: 1 }.into());
        }
        return Ok(0);
    }

    reader.read_u16()?; // major version
    reader.read_u16()?; // minor version
    let num_fonts = reader.read_u32()?;
    debug!("collection with {num_fonts} font(s)");

    if index >= num_fonts {
        return Err(TableEncodingError::FontIndexOutOfRange {
            index,
            count: num_fonts,
        }
        .into());
    }

    reader.skip(i64::from(index) * 4)?;
    Ok(u64::from(reader.read_u32()?))
}

/// Represents all of the tables and their respective data types.
#[derive(Debug)]
pub struct Tables {
    /// The offset table, which provides the number of table records.
    pub offset: OffsetTable,
    pub headers: TablesHeaders,
}

impl Tables {
    /// Constructs a `Tables` instance by reading the offset table at
    /// `position` and the table directory right after it.
    ///
    /// # Errors
    ///
    /// Fails when the sfnt version is not recognised or when the buffer
    /// ends in the middle of the directory.
    pub fn from_reader<B: Read + Seek>(
        reader: &mut FontBufReader<B>,
        position: u64,
    ) -> Result<Self, CmapDumpError> {
        let offset_table = OffsetTable::from_reader(reader, position)?;
        let headers = TablesHeaders::from_reader(reader, offset_table.num_tables())?;
        Ok(Self {
            offset: offset_table,
            headers,
        })
    }
}

/// Represents the table headers in the order the font stores them
#[derive(Debug)]
pub struct TablesHeaders {
    inner: Vec<TableMetadata>,
}

impl TablesHeaders {
    pub fn from_reader<B: Read + Seek>(
        reader: &mut FontBufReader<B>,
        num_tables: u16,
    ) -> Result<Self, FontBufReaderError> {
        // a table header is 16 bytes, read the whole directory at once
        // and process it in chunks
        let mut buffer = vec![0u8; usize::from(num_tables) * 16];
        reader.read_exact(&mut buffer)?;

        let headers = buffer
            .chunks_exact(16)
            .map(|raw_table| {
                let mut record = [0u8; 16];
                record.copy_from_slice(raw_table);
                TableMetadata::from_buffer(&record)
            })
            .inspect(|meta| {
                debug!(
                    "table {} offset 0x{:08x} length {}",
                    meta.tag, meta.offset, meta.length
                )
            })
            .collect();

        Ok(Self { inner: headers })
    }

    /// Looks a table record up by tag
    pub fn get(&self, tag: Tag) -> Option<&TableMetadata> {
        self.inner.iter().find(|meta| meta.tag == tag)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableMetadata> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<'a> IntoIterator for &'a TablesHeaders {
    type Item = &'a TableMetadata;

    type IntoIter = std::slice::Iter<'a, TableMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Represents metadata for a table within a larger data structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// The tag identifying the table
    pub tag: Tag,
    /// The checksum of the table. This value can be used to verify the
    /// integrity of the table data.
    pub checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file
    /// or buffer containing the data structure. This indicates where the
    /// actual table data starts.
    pub offset: u32,
    /// The length of this table in bytes, not including any padding.
    pub length: u32,
}

impl TableMetadata {
    /// Constructs a `TableMetadata` instance from a raw 16 byte record.
    ///
    /// The bytes are interpreted as follows (all values are in big-endian order):
    ///
    /// * Bytes 0-3: Table tag
    /// * Bytes 4-7: Checksum of the table
    /// * Bytes 8-11: Offset of the table from the beginning of the file
    /// * Bytes 12-15: Length of the table in bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use cmap_dump::tables::{TableMetadata, Tag};
    ///
    /// let buffer: [u8; 16] = [
    ///     b'c', b'm', b'a', b'p', // Tag
    ///     0x12, 0x34, 0x56, 0x78, // Checksum: 0x12345678
    ///     0x00, 0x01, 0x00, 0x00, // Offset: 0x00010000
    ///     0x00, 0x00, 0x0A, 0x00, // Length: 0x00000A00
    /// ];
    ///
    /// let metadata = TableMetadata::from_buffer(&buffer);
    /// assert_eq!(metadata.tag, Tag::CMAP);
    /// assert_eq!(metadata.checksum, 0x12345678);
    /// assert_eq!(metadata.offset, 0x00010000);
    /// assert_eq!(metadata.length, 0x00000A00);
    /// ```
    pub fn from_buffer(buf: &[u8; 16]) -> Self {
        Self {
            tag: Tag::new([buf[0], buf[1], buf[2], buf[3]]),
            checksum: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            offset: u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
            length: u32::from_be_bytes([buf[12], buf[13], buf[14], buf[15]]),
        }
    }
}
