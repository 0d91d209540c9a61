use std::{
    fs::File,
    io::{self, Read, Seek},
    path::{Path, PathBuf},
};

use buffer::{FontBufReader, FontBufReaderError};
use tables::{TableEncodingError, TableMetadata, Tables, Tag, cmap::Cmap};
use thiserror::Error;

pub mod buffer;
pub mod dump;
pub mod tables;


#[derive(Debug, Error)]
pub enum CmapDumpError {
    #[error(transparent)]
    TableEncodingError(#[from] TableEncodingError),

    #[error(transparent)]
    FontBufReaderError(#[from] FontBufReaderError),

    #[error("The font has no '{0}' table")]
    MissingTable(Tag),

    #[error("Failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
}

/// A parsed font: the table directory plus the reader it came from,
/// tables are decoded on request.
pub struct Font<B: Read + Seek> {
    reader: FontBufReader<B>,
    tables: Tables,
}

impl Font<File> {
    /// Opens the font file at `path`; for a TrueType Collection the
    /// first font is used
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CmapDumpError> {
        Self::open_index(path, 0)
    }

    /// Opens the `index`th font of the file at `path`
    pub fn open_index(path: impl AsRef<Path>, index: u32) -> Result<Self, CmapDumpError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CmapDumpError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_reader(file, index)
    }
}

impl<B> Font<B>
where
    B: Read + Seek,
{
    /// Parses the font header and table directory out of `buffer`.
    /// `index` selects a font inside a TrueType Collection and must be
    /// zero for a plain font file.
    pub fn from_reader(buffer: B, index: u32) -> Result<Self, CmapDumpError> {
        let mut reader = FontBufReader::from_buffer(buffer);
        let position = tables::offset_table_position(&mut reader, index)?;
        let tables = Tables::from_reader(&mut reader, position)?;

        Ok(Self { reader, tables })
    }

    /// The table records in the order the font stores them
    pub fn table_records(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.headers.iter()
    }

    pub fn table(&self, tag: Tag) -> Option<&TableMetadata> {
        self.tables.headers.get(tag)
    }

    /// Decodes the cmap table
    ///
    /// # Errors
    ///
    /// `CmapDumpError::MissingTable` when the font has no cmap, or a read
    /// error when the table is truncated.
    pub fn cmap(&mut self) -> Result<Cmap, CmapDumpError> {
        let metadata = self
            .tables
            .headers
            .get(Tag::CMAP)
            .ok_or(CmapDumpError::MissingTable(Tag::CMAP))?;

        Cmap::from_reader(&mut self.reader, metadata)
    }
}
