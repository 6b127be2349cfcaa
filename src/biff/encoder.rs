use super::records::{self, FontRecord, Substream, XfRecord};
use super::sheet::{CellEntry, CellValue, ColumnInfo, SheetData};
use super::{
    BiffString, SharedStrings, BUILTIN_FONTS, BUILTIN_STYLE_XFS, DEFAULT_FONT_NAME,
    DEFAULT_FONT_SIZE, DEFAULT_SHEET_NAME, MAX_SHEET_NAME,
};
use crate::error::{Result, XlsError};
use crate::types::{
    Border, CellData, CellFormat, Font, FontId, FontParams, MergeRange, StyleId,
    DEFAULT_BACKGROUND, DEFAULT_FOREGROUND, MAX_COL,
};
use byteorder::{ByteOrder, LittleEndian};

/// Widest column accepted, in characters
const MAX_COL_WIDTH: u16 = 255;

/// Builds the BIFF8 workbook stream for a single worksheet
///
/// The encoder owns every table of the document. Fonts and cell styles are
/// append-only and start after the reserved built-in entries, so the first
/// [`add_font`](BiffEncoder::add_font) returns font 5 and the first
/// [`add_cell_style`](BiffEncoder::add_cell_style) returns style 16.
///
/// # Examples
///
/// ```
/// use biffwriter::biff::BiffEncoder;
/// use biffwriter::types::{CellFormat, Font, HAlign, VAlign};
///
/// let mut encoder = BiffEncoder::new();
/// let font = encoder.add_font(&Font::new("Arial", 10));
/// let style = encoder.add_cell_style(&CellFormat::new(font, 0, HAlign::General, VAlign::Bottom));
/// encoder.add_data(42.5, 0, 0, style);
///
/// let stream = encoder.get_biff_data().unwrap();
/// assert_eq!(&stream[..2], &[0x09, 0x08]);
/// ```
#[derive(Debug, Clone)]
pub struct BiffEncoder {
    fonts: Vec<FontRecord>,
    styles: Vec<XfRecord>,
    strings: SharedStrings,
    sheet: SheetData,
    sheet_name: String,
    strict: bool,
}

impl BiffEncoder {
    pub fn new() -> Self {
        let mut encoder = BiffEncoder {
            fonts: Vec::new(),
            styles: Vec::new(),
            strings: SharedStrings::new(),
            sheet: SheetData::new(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            strict: false,
        };
        encoder.add_builtins();
        encoder
    }

    fn add_builtins(&mut self) {
        let default_font = FontRecord::from_font(&Font::new(DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE));
        self.fonts = vec![default_font; BUILTIN_FONTS as usize];

        let style_xf = XfRecord {
            font: 0,
            format: 0,
            locked: true,
            hidden: false,
            is_style: true,
            parent: XfRecord::NO_PARENT,
            align: 0,
            wrap: false,
            valign: 1,
            rotation: 0,
            indent: 0,
            shrink: false,
            merge: false,
            used_attributes: 0,
            border: Border::default(),
            fill: 0,
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
        };
        self.styles = vec![style_xf; BUILTIN_STYLE_XFS as usize];
        self.styles.push(XfRecord {
            is_style: false,
            parent: 0,
            ..style_xf
        });
    }

    /// Register a font and return its index. Identical fonts get separate indices.
    pub fn add_font(&mut self, font: &Font) -> FontId {
        self.fonts.push(FontRecord::from_font(font));
        FontId((self.fonts.len() - 1) as u16)
    }

    /// Register a cell format and return its index
    ///
    /// The font is not checked here. Strict mode reports unknown fonts when the stream
    /// is built.
    pub fn add_cell_style(&mut self, format: &CellFormat) -> StyleId {
        self.styles.push(XfRecord {
            font: format.font.biff_index(),
            format: format.number_format,
            locked: true,
            hidden: false,
            is_style: false,
            parent: 0,
            align: format.align as u8,
            wrap: format.wrap,
            valign: format.valign as u8,
            rotation: format.rotation,
            indent: 0,
            shrink: false,
            merge: format.merge,
            used_attributes: 0x3F,
            border: format.border.unwrap_or_default(),
            fill: format.fill as u8,
            foreground: format.foreground,
            background: format.background,
        });
        StyleId((self.styles.len() - 1) as u16)
    }

    /// Store a value at (`row`, `col`), replacing what was there
    ///
    /// Text is added to the shared string table. Empty text is stored as a blank,
    /// formatted cell.
    pub fn add_data(&mut self, value: impl Into<CellData>, row: u16, col: u16, style: StyleId) {
        let value = match value.into() {
            CellData::Number(number) => CellValue::Number(number),
            CellData::Text(text) if text.is_empty() => CellValue::Blank,
            CellData::Text(text) => CellValue::Text(self.strings.add_string(&text)),
            CellData::Blank => CellValue::Blank,
        };
        self.sheet.insert(row, col, CellEntry { value, style });
    }

    /// Set the width (in characters) and default style of columns `from_col..=to_col`
    pub fn set_col_width(&mut self, width: u16, from_col: u16, to_col: u16, style: StyleId) {
        let width = if width > MAX_COL_WIDTH {
            log::warn!("Column width {} clamped to {}", width, MAX_COL_WIDTH);
            MAX_COL_WIDTH
        } else {
            width
        };
        self.sheet.add_column(ColumnInfo {
            first_col: from_col,
            last_col: to_col,
            width: 256 * width,
            style,
        });
    }

    /// Add a merge region. Overlapping regions are accepted unless strict mode is on.
    pub fn merge_cells(&mut self, first_row: u16, last_row: u16, first_col: u16, last_col: u16) {
        self.sheet.add_merge(MergeRange {
            first_row,
            last_row,
            first_col,
            last_col,
        });
    }

    /// Set an explicit row height in points
    pub fn set_row_height(&mut self, row: u16, points: f64) {
        let twips = (points * 20.0).round();
        let twips = if !(0.0..=f64::from(0x7FFF)).contains(&twips) {
            log::warn!("Row height {} clamped to the BIFF8 range", points);
            twips.clamp(0.0, f64::from(0x7FFF))
        } else {
            twips
        };
        self.sheet.set_row_height(row, twips as u16);
    }

    /// Rename the worksheet. Empty names are ignored, long names are cut to 31 characters.
    pub fn set_sheet_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.sheet_name = BiffString::new(name, MAX_SHEET_NAME, "Sheet name").to_string_lossy();
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Font name, size and weight used by a cell style
    pub fn font_params(&self, style: StyleId) -> Option<FontParams> {
        let xf = self.styles.get(style.index() as usize)?;
        let font = FontId::from_biff_index(xf.font)?;
        let record = self.fonts.get(font.index() as usize)?;
        Some(FontParams {
            name: record.name(),
            size: record.height / 20,
            bold: record.is_bold(),
        })
    }

    /// Reject dangling references, out-of-range columns and overlapping merges when
    /// the stream is built
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.strings
    }

    pub fn sheet(&self) -> &SheetData {
        &self.sheet
    }

    /// Check every cross-reference of the document
    pub fn validate(&self) -> Result<()> {
        for (index, xf) in self.styles.iter().enumerate() {
            let known = FontId::from_biff_index(xf.font)
                .map(|font| (font.index() as usize) < self.fonts.len())
                .unwrap_or(false);
            if !known {
                return Err(XlsError::InvalidFont {
                    style: index as u16,
                    font: xf.font,
                });
            }
        }

        for (row, col, cell) in self.sheet.cells() {
            if col > MAX_COL {
                return Err(XlsError::ColumnOutOfRange { col });
            }
            if !self.has_style(cell.style) {
                return Err(XlsError::InvalidStyle {
                    row,
                    col,
                    style: cell.style.index(),
                });
            }
        }

        for info in self.sheet.columns() {
            if info.first_col > info.last_col {
                return Err(XlsError::InvalidRange(format!(
                    "columns {}..={}",
                    info.first_col, info.last_col
                )));
            }
            if info.last_col > MAX_COL {
                return Err(XlsError::ColumnOutOfRange { col: info.last_col });
            }
            if !self.has_style(info.style) {
                return Err(XlsError::InvalidColumnStyle {
                    first_col: info.first_col,
                    last_col: info.last_col,
                    style: info.style.index(),
                });
            }
        }

        let mut merges = self.sheet.merges().to_vec();
        for range in &merges {
            if range.first_row > range.last_row || range.first_col > range.last_col {
                return Err(XlsError::InvalidRange(range.to_string()));
            }
            if range.last_col > MAX_COL {
                return Err(XlsError::ColumnOutOfRange { col: range.last_col });
            }
        }
        merges.sort_by_key(|range| range.first_row);
        for (i, range) in merges.iter().enumerate() {
            for other in merges[i + 1..]
                .iter()
                .take_while(|other| other.first_row <= range.last_row)
            {
                if range.overlaps(other) {
                    return Err(XlsError::OverlappingMerge {
                        first: range.to_string(),
                        second: other.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    fn has_style(&self, style: StyleId) -> bool {
        (style.index() as usize) < self.styles.len()
    }

    /// Serialize the workbook globals and the worksheet into one BIFF8 stream
    pub fn get_biff_data(&self) -> Result<Vec<u8>> {
        if self.strict {
            self.validate()?;
        }

        let mut buf = Vec::new();
        records::write_bof(&mut buf, Substream::WorkbookGlobals)?;
        records::write_window1(&mut buf)?;
        records::write_date1904(&mut buf)?;
        for font in &self.fonts {
            font.write(&mut buf)?;
        }
        for xf in &self.styles {
            xf.write(&mut buf)?;
        }
        records::write_normal_style(&mut buf)?;

        let name = BiffString::new(&self.sheet_name, MAX_SHEET_NAME, "Sheet name");
        let position_offset = records::write_boundsheet(&mut buf, &name)?;
        let text_cells = self.sheet.text_cell_count();
        self.strings.write_sst(&mut buf, text_cells as u32)?;
        records::write_eof(&mut buf)?;

        let sheet_offset = buf.len() as u32;
        LittleEndian::write_u32(&mut buf[position_offset..position_offset + 4], sheet_offset);

        records::write_bof(&mut buf, Substream::Worksheet)?;
        self.sheet.write(&mut buf)?;
        records::write_eof(&mut buf)?;

        log::trace!(
            "BIFF stream: {} fonts, {} styles, {} shared strings, {} text cells, {} merges, {} bytes",
            self.fonts.len(),
            self.styles.len(),
            self.strings.count(),
            text_cells,
            self.sheet.merges().len(),
            buf.len()
        );
        Ok(buf)
    }

    /// Return to the freshly constructed state. The strict flag is kept.
    pub fn clear(&mut self) {
        self.strings.clear();
        self.sheet.clear();
        self.sheet_name = DEFAULT_SHEET_NAME.to_string();
        self.add_builtins();
    }
}

impl Default for BiffEncoder {
    fn default() -> Self {
        Self::new()
    }
}
