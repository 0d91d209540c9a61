//! Turns decoded cmap subtables into the printed codepoint lines.

use std::io::{self, Write};

use crate::tables::{
    TableEncodingError,
    cmap::{Cmap, SUPPORTED_FORMATS, Subtable},
};

/// How codepoints are selected and ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variant {
    /// Format 4 and 12 subtables, codepoints sorted ascending
    #[default]
    Sorted,
    /// Format 12 subtables only, codepoints in mapping order
    Raw,
}

impl Variant {
    /// The subtable formats this variant dumps by default
    pub fn formats(self) -> &'static [u16] {
        match self {
            Variant::Sorted => &[4, 12],
            Variant::Raw => &[12],
        }
    }
}

/// Writes one line of codepoints per cmap subtable
#[derive(Debug, Clone)]
pub struct Dumper {
    variant: Variant,
    formats: Vec<u16>,
}

impl Dumper {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            formats: variant.formats().to_vec(),
        }
    }

    /// Replaces the variant's format filter.
    ///
    /// # Errors
    ///
    /// `TableEncodingError::UnsupportedFormat` for a format whose
    /// mapping is never decoded, since it could only produce empty lines.
    pub fn with_formats(mut self, formats: &[u16]) -> Result<Self, TableEncodingError> {
        if let Some(&format) = formats.iter().find(|f| !SUPPORTED_FORMATS.contains(f)) {
            return Err(TableEncodingError::UnsupportedFormat(format));
        }

        self.formats = formats.to_vec();
        Ok(self)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn includes(&self, subtable: &Subtable) -> bool {
        self.formats.contains(&subtable.format())
    }

    /// One line per subtable, in the order the cmap stores them. Subtables
    /// outside the format filter get an empty line.
    pub fn lines(&self, cmap: &Cmap) -> Vec<String> {
        cmap.subtables()
            .iter()
            .map(|subtable| match self.variant {
                _ if !self.includes(subtable) => String::new(),
                Variant::Sorted => {
                    let mut codepoints: Vec<u32> = subtable.codepoints().collect();
                    codepoints.sort_unstable();
                    format_codepoints(codepoints)
                }
                Variant::Raw => format_codepoints(subtable.codepoints()),
            })
            .collect()
    }

    /// Writes every line followed by a newline
    pub fn write<W: Write>(&self, cmap: &Cmap, mut out: W) -> io::Result<()> {
        for line in self.lines(cmap) {
            writeln!(out, "{line}")?;
        }
        out.flush()
    }
}

impl Default for Dumper {
    fn default() -> Self {
        Self::new(Variant::default())
    }
}

/// Formats codepoints as `0x%04x`, joined by `", "`
///
/// ```
/// use cmap_dump::dump::format_codepoints;
///
/// assert_eq!(format_codepoints([0x20, 0x41, 0x1F600]), "0x0020, 0x0041, 0x1f600");
/// assert_eq!(format_codepoints(Vec::new()), "");
/// ```
pub fn format_codepoints(codepoints: impl IntoIterator<Item = u32>) -> String {
    codepoints
        .into_iter()
        .map(|cp| format!("0x{cp:04x}"))
        .collect::<Vec<_>>()
        .join(", ")
}
