//! Individual BIFF8 record layouts
//!
//! Each record is a plain struct with named fields and a `write` method that performs
//! the bit packing explicitly.

use super::{record_id, write_record_header, BiffString, MAX_MERGE_RANGES};
use crate::types::{Border, Font, MergeRange};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

const BIFF8_VERSION: u16 = 0x0600;
const BUILD_ID: u16 = 0x0DBB;
const BUILD_YEAR: u16 = 0x07CC;
const FILE_HISTORY: u32 = 0x0000_0041;
const LOWEST_VERSION: u32 = 0x0000_0006;

/// Substream type carried by a BOF record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substream {
    WorkbookGlobals = 0x0005,
    Worksheet = 0x0010,
}

/// Beginning of a substream
pub fn write_bof<W: Write>(writer: &mut W, substream: Substream) -> io::Result<()> {
    write_record_header(writer, record_id::BOF, 16)?;
    writer.write_u16::<LittleEndian>(BIFF8_VERSION)?;
    writer.write_u16::<LittleEndian>(substream as u16)?;
    writer.write_u16::<LittleEndian>(BUILD_ID)?;
    writer.write_u16::<LittleEndian>(BUILD_YEAR)?;
    writer.write_u32::<LittleEndian>(FILE_HISTORY)?;
    writer.write_u32::<LittleEndian>(LOWEST_VERSION)?;
    Ok(())
}

pub fn write_eof<W: Write>(writer: &mut W) -> io::Result<()> {
    write_record_header(writer, record_id::EOF, 0)
}

/// Workbook window: position, size and the horizontal scroll / vertical scroll / tab bar flags
pub fn write_window1<W: Write>(writer: &mut W) -> io::Result<()> {
    const SHOW_HSCROLL_VSCROLL_TABS: u16 = 0x0038;

    write_record_header(writer, record_id::WINDOW1, 18)?;
    writer.write_u16::<LittleEndian>(0)?; // x
    writer.write_u16::<LittleEndian>(0)?; // y
    writer.write_u16::<LittleEndian>(0x25BC)?;
    writer.write_u16::<LittleEndian>(0x1572)?;
    writer.write_u16::<LittleEndian>(SHOW_HSCROLL_VSCROLL_TABS)?;
    writer.write_u16::<LittleEndian>(0)?; // active tab
    writer.write_u16::<LittleEndian>(0)?; // first visible tab
    writer.write_u16::<LittleEndian>(1)?; // selected tabs
    writer.write_u16::<LittleEndian>(0x0258)?; // tab bar width ratio
    Ok(())
}

/// 1900 date system
pub fn write_date1904<W: Write>(writer: &mut W) -> io::Result<()> {
    write_record_header(writer, record_id::DATE1904, 2)?;
    writer.write_u16::<LittleEndian>(0)
}

/// FONT record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRecord {
    /// Height in twips (1/20 point)
    pub height: u16,
    pub attributes: u16,
    pub color: u16,
    pub weight: u16,
    pub script: u16,
    pub underline: u8,
    pub family: u8,
    pub charset: u8,
    pub(crate) name: BiffString,
}

impl FontRecord {
    pub const WEIGHT_NORMAL: u16 = 0x0190;
    pub const WEIGHT_BOLD: u16 = 0x02BC;

    /// Largest height accepted, in twips
    pub const MAX_HEIGHT: u16 = 0x7FFF;

    pub fn from_font(font: &Font) -> Self {
        let height = u32::from(font.size) * 20;
        let height = if height > u32::from(Self::MAX_HEIGHT) {
            log::warn!(
                "Font size {} of {} clamped to {} twips",
                font.size,
                font.name,
                Self::MAX_HEIGHT
            );
            Self::MAX_HEIGHT
        } else {
            height as u16
        };
        FontRecord {
            height,
            attributes: font.style.bits(),
            color: font.color,
            weight: if font.bold {
                Self::WEIGHT_BOLD
            } else {
                Self::WEIGHT_NORMAL
            },
            script: font.script as u16,
            underline: font.underline as u8,
            family: 0,
            charset: 0,
            name: BiffString::new(&font.name, super::MAX_FONT_NAME, "Font name"),
        }
    }

    pub fn name(&self) -> String {
        self.name.to_string_lossy()
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= Self::WEIGHT_BOLD
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_record_header(writer, record_id::FONT, 16 + self.name.byte_len())?;
        writer.write_u16::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.attributes)?;
        writer.write_u16::<LittleEndian>(self.color)?;
        writer.write_u16::<LittleEndian>(self.weight)?;
        writer.write_u16::<LittleEndian>(self.script)?;
        writer.write_u8(self.underline)?;
        writer.write_u8(self.family)?;
        writer.write_u8(self.charset)?;
        writer.write_u8(0)?;
        self.name.write_short(writer)
    }
}

/// Extended format (XF) record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfRecord {
    /// Font index as stored in the file (index 4 skipped)
    pub font: u16,
    pub format: u16,
    pub locked: bool,
    pub hidden: bool,
    pub is_style: bool,
    /// Parent style XF, 0xFFF for style XFs
    pub parent: u16,
    pub align: u8,
    pub wrap: bool,
    pub valign: u8,
    pub rotation: u8,
    pub indent: u8,
    pub shrink: bool,
    pub merge: bool,
    /// Six "attribute group used" bits
    pub used_attributes: u8,
    pub border: Border,
    pub fill: u8,
    pub foreground: u8,
    pub background: u8,
}

impl XfRecord {
    pub const NO_PARENT: u16 = 0x0FFF;

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let b = &self.border;

        let protection = self.locked as u16
            | (self.hidden as u16) << 1
            | (self.is_style as u16) << 2
            | (self.parent & 0x0FFF) << 4;
        let alignment = (self.align as u16 & 0x07)
            | (self.wrap as u16) << 3
            | (self.valign as u16 & 0x07) << 4
            | (self.rotation as u16) << 8;
        let options = (self.indent as u16 & 0x0F)
            | (self.shrink as u16) << 4
            | (self.merge as u16) << 5
            | (self.used_attributes as u16 & 0x3F) << 10;
        let lines = (b.left as u16 & 0x0F)
            | (b.right as u16 & 0x0F) << 4
            | (b.top as u16 & 0x0F) << 8
            | (b.bottom as u16 & 0x0F) << 12;
        let side_colors = (b.left_color as u16 & 0x7F)
            | (b.right_color as u16 & 0x7F) << 7
            | (b.diagonal as u16 & 0x03) << 14;
        let edge_colors = (b.top_color as u32 & 0x7F)
            | (b.bottom_color as u32 & 0x7F) << 7
            | (b.diagonal_color as u32 & 0x7F) << 14
            | (b.diagonal_style as u32 & 0x0F) << 21
            | (self.fill as u32 & 0x3F) << 26;
        let pattern_colors =
            (self.foreground as u16 & 0x7F) | (self.background as u16 & 0x7F) << 7;

        write_record_header(writer, record_id::XF, 20)?;
        writer.write_u16::<LittleEndian>(self.font)?;
        writer.write_u16::<LittleEndian>(self.format)?;
        writer.write_u16::<LittleEndian>(protection)?;
        writer.write_u16::<LittleEndian>(alignment)?;
        writer.write_u16::<LittleEndian>(options)?;
        writer.write_u16::<LittleEndian>(lines)?;
        writer.write_u16::<LittleEndian>(side_colors)?;
        writer.write_u32::<LittleEndian>(edge_colors)?;
        writer.write_u16::<LittleEndian>(pattern_colors)?;
        Ok(())
    }
}

/// Built-in "Normal" style bound to XF 0
pub fn write_normal_style<W: Write>(writer: &mut W) -> io::Result<()> {
    const BUILTIN_XF0: u16 = 0x8000;

    write_record_header(writer, record_id::STYLE, 4)?;
    writer.write_u16::<LittleEndian>(BUILTIN_XF0)?;
    writer.write_u8(0)?; // Normal
    writer.write_u8(0xFF)?; // outline level
    Ok(())
}

/// Write a BOUNDSHEET record with a zero stream position. Returns the offset of the
/// position field within `buf` so the caller can patch it once the sheet BOF is placed.
pub(crate) fn write_boundsheet(buf: &mut Vec<u8>, name: &BiffString) -> io::Result<usize> {
    write_record_header(buf, record_id::BOUNDSHEET, 8 + name.byte_len())?;
    let position_offset = buf.len();
    buf.write_u32::<LittleEndian>(0)?;
    buf.write_u8(0)?; // visible
    buf.write_u8(0)?; // worksheet
    name.write_short(buf)?;
    Ok(position_offset)
}

/// Column width and default format for a column range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColInfoRecord {
    pub first_col: u16,
    pub last_col: u16,
    /// Width in 1/256 of a character
    pub width: u16,
    pub xf: u16,
}

impl ColInfoRecord {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_record_header(writer, record_id::COLINFO, 12)?;
        writer.write_u16::<LittleEndian>(self.first_col)?;
        writer.write_u16::<LittleEndian>(self.last_col)?;
        writer.write_u16::<LittleEndian>(self.width)?;
        writer.write_u16::<LittleEndian>(self.xf)?;
        writer.write_u16::<LittleEndian>(0)?; // options
        writer.write_u16::<LittleEndian>(0)?;
        Ok(())
    }
}

/// Row description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRecord {
    pub row: u16,
    pub first_col: u16,
    /// One past the last occupied column
    pub last_col_plus_one: u16,
    /// Explicit height in twips
    pub height: Option<u16>,
}

impl RowRecord {
    const DEFAULT_HEIGHT: u16 = 0x00FF;
    const FLAG_ALWAYS_SET: u16 = 0x0100;
    const FLAG_CUSTOM_HEIGHT: u16 = 0x0040;
    const DEFAULT_XF: u16 = 0x000F;

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let (height, flags) = match self.height {
            Some(twips) => (
                twips & 0x7FFF,
                Self::FLAG_ALWAYS_SET | Self::FLAG_CUSTOM_HEIGHT,
            ),
            None => (Self::DEFAULT_HEIGHT, Self::FLAG_ALWAYS_SET),
        };

        write_record_header(writer, record_id::ROW, 16)?;
        writer.write_u16::<LittleEndian>(self.row)?;
        writer.write_u16::<LittleEndian>(self.first_col)?;
        writer.write_u16::<LittleEndian>(self.last_col_plus_one)?;
        writer.write_u16::<LittleEndian>(height)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u16::<LittleEndian>(flags)?;
        writer.write_u16::<LittleEndian>(Self::DEFAULT_XF)?;
        Ok(())
    }
}

pub fn write_number<W: Write>(
    writer: &mut W,
    row: u16,
    col: u16,
    xf: u16,
    value: f64,
) -> io::Result<()> {
    write_record_header(writer, record_id::NUMBER, 14)?;
    writer.write_u16::<LittleEndian>(row)?;
    writer.write_u16::<LittleEndian>(col)?;
    writer.write_u16::<LittleEndian>(xf)?;
    writer.write_f64::<LittleEndian>(value)?;
    Ok(())
}

pub fn write_blank<W: Write>(writer: &mut W, row: u16, col: u16, xf: u16) -> io::Result<()> {
    write_record_header(writer, record_id::BLANK, 6)?;
    writer.write_u16::<LittleEndian>(row)?;
    writer.write_u16::<LittleEndian>(col)?;
    writer.write_u16::<LittleEndian>(xf)?;
    Ok(())
}

pub fn write_label_sst<W: Write>(
    writer: &mut W,
    row: u16,
    col: u16,
    xf: u16,
    sst_index: u32,
) -> io::Result<()> {
    write_record_header(writer, record_id::LABELSST, 10)?;
    writer.write_u16::<LittleEndian>(row)?;
    writer.write_u16::<LittleEndian>(col)?;
    writer.write_u16::<LittleEndian>(xf)?;
    writer.write_u32::<LittleEndian>(sst_index)?;
    Ok(())
}

/// MERGECELLS records, split every [`MAX_MERGE_RANGES`] ranges
pub fn write_merge_cells<W: Write>(writer: &mut W, ranges: &[MergeRange]) -> io::Result<()> {
    for chunk in ranges.chunks(MAX_MERGE_RANGES) {
        write_record_header(writer, record_id::MERGECELLS, 2 + chunk.len() * 8)?;
        writer.write_u16::<LittleEndian>(chunk.len() as u16)?;
        for range in chunk {
            writer.write_u16::<LittleEndian>(range.first_row)?;
            writer.write_u16::<LittleEndian>(range.last_row)?;
            writer.write_u16::<LittleEndian>(range.first_col)?;
            writer.write_u16::<LittleEndian>(range.last_col)?;
        }
    }
    Ok(())
}
