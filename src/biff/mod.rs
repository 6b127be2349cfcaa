//! BIFF8 record encoding
//!
//! This module turns the in-memory workbook model (fonts, cell formats, shared strings,
//! cells, column overrides and merge regions) into the byte stream stored in the
//! `Workbook` stream of the compound file.

mod encoder;
pub mod records;
mod shared_strings;
mod sheet;

pub use encoder::BiffEncoder;
pub use shared_strings::SharedStrings;
pub use sheet::{CellEntry, CellValue, ColumnInfo, RowEntry, SheetData};

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Record identifiers
pub mod record_id {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const WINDOW1: u16 = 0x003D;
    pub const DATE1904: u16 = 0x0022;
    pub const FONT: u16 = 0x0031;
    pub const XF: u16 = 0x00E0;
    pub const STYLE: u16 = 0x0293;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SST: u16 = 0x00FC;
    pub const CONTINUE: u16 = 0x003C;
    pub const COLINFO: u16 = 0x007D;
    pub const ROW: u16 = 0x0208;
    pub const NUMBER: u16 = 0x0203;
    pub const BLANK: u16 = 0x0201;
    pub const LABELSST: u16 = 0x00FD;
    pub const MERGECELLS: u16 = 0x00E5;
}

/// Largest payload a single record may carry
pub const MAX_RECORD_DATA: usize = 8224;

/// Merge ranges per MERGECELLS record, keeping the record under [`MAX_RECORD_DATA`]
pub const MAX_MERGE_RANGES: usize = 1026;

/// Sheet names are limited to 31 characters
pub const MAX_SHEET_NAME: usize = 31;

/// Font names carry an 8-bit length
pub const MAX_FONT_NAME: usize = 255;

/// Shared strings carry a 16-bit length
pub const MAX_SST_STRING: usize = 0xFFFF;

/// Reserved built-in fonts at the start of the font table
pub const BUILTIN_FONTS: u16 = 5;

/// Reserved built-in style XFs at the start of the style table
pub const BUILTIN_STYLE_XFS: u16 = 15;

pub(crate) const DEFAULT_FONT_NAME: &str = "Arial";
pub(crate) const DEFAULT_FONT_SIZE: u16 = 10;
pub(crate) const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Write the 4-byte record header
pub(crate) fn write_record_header<W: Write>(
    writer: &mut W,
    record_type: u16,
    data_len: usize,
) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(record_type)?;
    writer.write_u16::<LittleEndian>(data_len as u16)?;
    Ok(())
}

/// Unicode string in BIFF8 form: UTF-16 units stored either compressed (one byte per
/// unit, all units <= 0xFF) or uncompressed (UTF-16LE)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BiffString {
    units: Vec<u16>,
    compressed: bool,
}

impl BiffString {
    /// Encode `text`, clamping it to `max_units` UTF-16 units
    pub(crate) fn new(text: &str, max_units: usize, what: &str) -> Self {
        let mut units: Vec<u16> = text.encode_utf16().collect();
        if units.len() > max_units {
            log::warn!(
                "{} of {} characters truncated to {}",
                what,
                units.len(),
                max_units
            );
            units.truncate(max_units);
            // Drop a dangling high surrogate
            if matches!(units.last(), Some(0xD800..=0xDBFF)) {
                units.pop();
            }
        }
        let compressed = units.iter().all(|&u| u <= 0xFF);
        BiffString { units, compressed }
    }

    /// Number of UTF-16 units
    pub(crate) fn len(&self) -> usize {
        self.units.len()
    }

    /// Option flags byte: 0x00 compressed, 0x01 UTF-16LE
    pub(crate) fn flags(&self) -> u8 {
        if self.compressed {
            0x00
        } else {
            0x01
        }
    }

    /// Bytes per character in the stored form
    pub(crate) fn char_size(&self) -> usize {
        if self.compressed {
            1
        } else {
            2
        }
    }

    /// Size of the character data in bytes
    pub(crate) fn byte_len(&self) -> usize {
        self.units.len() * self.char_size()
    }

    /// Write the characters `units[start..end]` without any header
    pub(crate) fn write_chars<W: Write>(
        &self,
        writer: &mut W,
        start: usize,
        end: usize,
    ) -> io::Result<()> {
        for &unit in &self.units[start..end] {
            if self.compressed {
                writer.write_u8(unit as u8)?;
            } else {
                writer.write_u16::<LittleEndian>(unit)?;
            }
        }
        Ok(())
    }

    /// Short form used by FONT and BOUNDSHEET: 8-bit length, flags, characters
    pub(crate) fn write_short<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.units.len() as u8)?;
        writer.write_u8(self.flags())?;
        self.write_chars(writer, 0, self.units.len())
    }

    pub(crate) fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_header() {
        let mut buf = Vec::new();
        write_record_header(&mut buf, record_id::SST, 12).unwrap();
        assert_eq!(buf, vec![0xFC, 0x00, 0x0C, 0x00]);
    }

    #[test]
    fn test_compressed_string() {
        let s = BiffString::new("Café", 255, "name");
        assert_eq!(s.flags(), 0x00);
        let mut buf = Vec::new();
        s.write_short(&mut buf).unwrap();
        assert_eq!(buf, vec![4, 0, b'C', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_uncompressed_string() {
        let s = BiffString::new("Σ", 255, "name");
        assert_eq!(s.flags(), 0x01);
        assert_eq!(s.byte_len(), 2);
        let mut buf = Vec::new();
        s.write_short(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 1, 0xA3, 0x03]);
    }

    #[test]
    fn test_truncation_keeps_surrogates_whole() {
        // "a" followed by U+1F600 (two UTF-16 units)
        let s = BiffString::new("a\u{1F600}", 2, "name");
        assert_eq!(s.len(), 1);
        assert_eq!(s.to_string_lossy(), "a");
    }
}
