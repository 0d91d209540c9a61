use std::io::{self, BufReader, Read, Seek, SeekFrom};

use thiserror::Error;

use crate::tables::Tag;

macro_rules! impl_read {
    ($fn_name:ident, $typ:ty) => {
        pub fn $fn_name(&mut self) -> Result<$typ, FontBufReaderError> {
            let mut buf = [0u8; size_of::<$typ>()];

            self.inner.read_exact(&mut buf)?;

            Ok(<$typ>::from_be_bytes(buf))
        }
    };
}

/// Represents the possible errors that can occur when using `FontBufReader`.
#[derive(Error, Debug)]
pub enum FontBufReaderError {
    /// An error occurred during a read operation on the underlying buffer.
    /// This variant transparently wraps `std::io::Error`.
    #[error(transparent)]
    ReadError(#[from] io::Error),

    /// An error occurred during a seek operation on the underlying buffer.
    /// This variant contains the `std::io::Error` that caused the seek failure.
    #[error("Failed to seek, error context: {0}")]
    FailedToSeek(io::Error),
}

/// A Struct which encapsulates and provides a big-endian API
/// for reading sfnt data out of a buffer
pub struct FontBufReader<B: Read + Seek> {
    inner: BufReader<B>,
}

impl<B> FontBufReader<B>
where
    B: Read + Seek,
{
    /// Returns a new buf reader from anything which implements read
    /// the most obvious use case would be a File
    /// but it's also useful for loading fonts off an in-memory buffer
    pub fn from_buffer(buffer: B) -> Self {
        Self {
            inner: BufReader::new(buffer),
        }
    }

    /// Seeks to a specifc place in the buffer
    /// from the start of the file
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use cmap_dump::buffer::FontBufReader;
    ///
    /// let data = vec![0, 0, 0, 10, 0, 0, 0, 20]; // two big-endian u32 values: 10 and 20
    /// let mut reader = FontBufReader::from_buffer(Cursor::new(data));
    ///
    /// reader.seek_to(4).unwrap();
    /// assert_eq!(reader.read_u32().unwrap(), 20);
    /// ```
    pub fn seek_to(&mut self, pos: u64) -> Result<(), FontBufReaderError> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(FontBufReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor positon
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use cmap_dump::buffer::FontBufReader;
    ///
    /// let data = vec![0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = FontBufReader::from_buffer(Cursor::new(data));
    ///
    /// assert_eq!(reader.read_u32().unwrap(), 10);
    /// reader.skip(4).unwrap();
    ///
    /// // Nothing left to read
    /// assert!(reader.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: i64) -> Result<(), FontBufReaderError> {
        self.inner
            .seek_relative(n)
            .map_err(FontBufReaderError::FailedToSeek)?;

        Ok(())
    }

    /// Fills `buf` completely, failing if the buffer ends first
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), FontBufReaderError> {
        self.inner.read_exact(buf)?;

        Ok(())
    }

    /// Reads a 4 byte table tag
    pub fn read_tag(&mut self) -> Result<Tag, FontBufReaderError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;

        Ok(Tag::new(buf))
    }

    impl_read!(read_i32, i32);
    impl_read!(read_u32, u32);
    impl_read!(read_i16, i16);
    impl_read!(read_u16, u16);
    impl_read!(read_i8, i8);
    impl_read!(read_u8, u8);
}
