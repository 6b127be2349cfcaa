//! Type definitions for workbook content: fonts, cell formats, borders and cell values

use bitflags::bitflags;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// Palette index meaning "automatic" (black) font color
pub const AUTOMATIC_FONT_COLOR: u16 = 0x7FFF;

/// Default pattern foreground palette index
pub const DEFAULT_FOREGROUND: u8 = 0x40;

/// Default pattern background palette index
pub const DEFAULT_BACKGROUND: u8 = 0x41;

/// Highest column index a BIFF8 sheet can address
pub const MAX_COL: u16 = 255;

/// Index of a font in the workbook font table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontId(pub(crate) u16);

impl FontId {
    /// First built-in font (Arial 10)
    pub const DEFAULT: FontId = FontId(0);

    /// Wrap a raw font table index
    pub const fn new(index: u16) -> Self {
        FontId(index)
    }

    /// Position in the font table
    pub fn index(&self) -> u16 {
        self.0
    }

    /// Index as written into XF records. BIFF8 has no font number 4, so every
    /// table entry from the fifth one onwards is shifted up by one.
    pub(crate) fn biff_index(&self) -> u16 {
        if self.0 > 3 {
            self.0.saturating_add(1)
        } else {
            self.0
        }
    }

    /// Inverse of [`FontId::biff_index`]. `None` for the non-existent font 4.
    pub(crate) fn from_biff_index(index: u16) -> Option<FontId> {
        match index {
            4 => None,
            0..=3 => Some(FontId(index)),
            _ => Some(FontId(index - 1)),
        }
    }
}

/// Index of a cell format (XF record) in the workbook style table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleId(pub(crate) u16);

impl StyleId {
    /// Built-in default cell format
    pub const DEFAULT: StyleId = StyleId(15);

    /// Wrap a raw XF index
    pub const fn new(index: u16) -> Self {
        StyleId(index)
    }

    /// Position in the style table
    pub fn index(&self) -> u16 {
        self.0
    }
}

impl Default for StyleId {
    fn default() -> Self {
        StyleId::DEFAULT
    }
}

bitflags! {
    /// Font attribute flags as stored in the FONT record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u16 {
        const ITALIC = 0x0002;
        const STRIKEOUT = 0x0008;
        const OUTLINE = 0x0010;
        const SHADOW = 0x0020;
    }
}

/// Superscript / subscript selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Script {
    #[default]
    None = 0,
    Superscript = 1,
    Subscript = 2,
}

/// Underline type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Underline {
    #[default]
    None = 0,
    Single = 1,
    Double = 2,
    SingleAccounting = 0x21,
    DoubleAccounting = 0x22,
}

/// Font definition
///
/// # Examples
///
/// ```
/// use biffwriter::types::{Font, FontStyle};
///
/// let font = Font::new("Arial", 12).bold().style(FontStyle::ITALIC);
/// assert!(font.bold);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Face name
    pub name: String,
    /// Size in points
    pub size: u16,
    /// Bold weight
    pub bold: bool,
    /// Palette color index
    pub color: u16,
    /// Italic, strikeout, outline and shadow flags
    pub style: FontStyle,
    /// Superscript / subscript
    pub script: Script,
    /// Underline type
    pub underline: Underline,
}

impl Font {
    /// Create a regular font with automatic color
    pub fn new(name: impl Into<String>, size: u16) -> Self {
        Font {
            name: name.into(),
            size,
            bold: false,
            color: AUTOMATIC_FONT_COLOR,
            style: FontStyle::empty(),
            script: Script::None,
            underline: Underline::None,
        }
    }

    /// Use bold weight
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Set palette color index
    pub fn color(mut self, color: u16) -> Self {
        self.color = color;
        self
    }

    /// Set attribute flags
    pub fn style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    /// Set superscript / subscript
    pub fn script(mut self, script: Script) -> Self {
        self.script = script;
        self
    }

    /// Set underline type
    pub fn underline(mut self, underline: Underline) -> Self {
        self.underline = underline;
        self
    }
}

/// Font properties resolved from a cell style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontParams {
    pub name: String,
    pub size: u16,
    pub bold: bool,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HAlign {
    #[default]
    General = 0,
    Left = 1,
    Center = 2,
    Right = 3,
    Fill = 4,
    Justify = 5,
    CenterAcrossSelection = 6,
}

/// Vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VAlign {
    Top = 0,
    Center = 1,
    #[default]
    Bottom = 2,
    Justify = 3,
}

/// Border line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineStyle {
    #[default]
    None = 0,
    Thin = 1,
    Medium = 2,
    Dashed = 3,
    Dotted = 4,
    Thick = 5,
    Double = 6,
    Hair = 7,
    MediumDashed = 8,
    DashDot = 9,
    MediumDashDot = 10,
    DashDotDot = 11,
    MediumDashDotDot = 12,
    SlantedDashDot = 13,
}

/// Which diagonal lines are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Diagonal {
    #[default]
    None = 0,
    Down = 1,
    Up = 2,
    Both = 3,
}

/// Cell background fill pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillPattern {
    #[default]
    None = 0,
    Solid = 1,
    MediumGray = 2,
    DarkGray = 3,
    LightGray = 4,
}

/// Per-edge border styles and palette colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Border {
    pub left: LineStyle,
    pub right: LineStyle,
    pub top: LineStyle,
    pub bottom: LineStyle,
    pub left_color: u8,
    pub right_color: u8,
    pub top_color: u8,
    pub bottom_color: u8,
    pub diagonal: Diagonal,
    pub diagonal_style: LineStyle,
    pub diagonal_color: u8,
}

impl Border {
    /// Same line style and color on all four edges, no diagonal
    pub fn all(style: LineStyle, color: u8) -> Self {
        Border {
            left: style,
            right: style,
            top: style,
            bottom: style,
            left_color: color,
            right_color: color,
            top_color: color,
            bottom_color: color,
            ..Border::default()
        }
    }

    /// Edge styles given as (left, top, right, bottom). Drawn edges get `color`, empty
    /// edges keep color 0.
    pub fn sides(
        left: LineStyle,
        top: LineStyle,
        right: LineStyle,
        bottom: LineStyle,
        color: u8,
    ) -> Self {
        let color_of = |style: LineStyle| if style == LineStyle::None { 0 } else { color };
        Border {
            left,
            right,
            top,
            bottom,
            left_color: color_of(left),
            right_color: color_of(right),
            top_color: color_of(top),
            bottom_color: color_of(bottom),
            ..Border::default()
        }
    }
}

/// Ready-made combinations of thick and thin cell edges
///
/// Names list the thick edges first, then the thin ones. Edges that are not named
/// stay empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderPreset {
    LeftTopThick,
    RightTopThick,
    LeftBottomThick,
    RightBottomThick,
    LeftTopThin,
    RightTopThin,
    LeftBottomThin,
    RightBottomThin,
    LeftThick,
    RightThick,
    TopThick,
    BottomThick,
    /// Thick on all four edges
    Thick,
    LeftThin,
    RightThin,
    TopThin,
    BottomThin,
    /// Thin on all four edges
    Thin,
    LeftTopThickRightBottomThin,
    RightTopThickLeftBottomThin,
    LeftBottomThickRightTopThin,
    RightBottomThickLeftTopThin,
    LeftTopRightThickBottomThin,
    LeftBottomRightThickTopThin,
    LeftRightThickTopBottomThin,
    TopThickLeftBottomRightThin,
    LeftThickTopBottomRightThin,
    BottomThickTopLeftRightThin,
    RightThickTopLeftBottomThin,
    LeftTopBottomThickRightThin,
    RightTopBottomThickLeftThin,
    TopBottomThickLeftRightThin,
}

impl BorderPreset {
    pub const ALL: [BorderPreset; 32] = [
        BorderPreset::LeftTopThick,
        BorderPreset::RightTopThick,
        BorderPreset::LeftBottomThick,
        BorderPreset::RightBottomThick,
        BorderPreset::LeftTopThin,
        BorderPreset::RightTopThin,
        BorderPreset::LeftBottomThin,
        BorderPreset::RightBottomThin,
        BorderPreset::LeftThick,
        BorderPreset::RightThick,
        BorderPreset::TopThick,
        BorderPreset::BottomThick,
        BorderPreset::Thick,
        BorderPreset::LeftThin,
        BorderPreset::RightThin,
        BorderPreset::TopThin,
        BorderPreset::BottomThin,
        BorderPreset::Thin,
        BorderPreset::LeftTopThickRightBottomThin,
        BorderPreset::RightTopThickLeftBottomThin,
        BorderPreset::LeftBottomThickRightTopThin,
        BorderPreset::RightBottomThickLeftTopThin,
        BorderPreset::LeftTopRightThickBottomThin,
        BorderPreset::LeftBottomRightThickTopThin,
        BorderPreset::LeftRightThickTopBottomThin,
        BorderPreset::TopThickLeftBottomRightThin,
        BorderPreset::LeftThickTopBottomRightThin,
        BorderPreset::BottomThickTopLeftRightThin,
        BorderPreset::RightThickTopLeftBottomThin,
        BorderPreset::LeftTopBottomThickRightThin,
        BorderPreset::RightTopBottomThickLeftThin,
        BorderPreset::TopBottomThickLeftRightThin,
    ];

    /// Line styles as `[left, top, right, bottom]`
    pub fn edges(self) -> [LineStyle; 4] {
        use LineStyle::{None as N, Thick as K, Thin as T};

        match self {
            BorderPreset::LeftTopThick => [K, K, N, N],
            BorderPreset::RightTopThick => [N, K, K, N],
            BorderPreset::LeftBottomThick => [K, N, N, K],
            BorderPreset::RightBottomThick => [N, N, K, K],
            BorderPreset::LeftTopThin => [T, T, N, N],
            BorderPreset::RightTopThin => [N, T, T, N],
            BorderPreset::LeftBottomThin => [T, N, N, T],
            BorderPreset::RightBottomThin => [N, N, T, T],
            BorderPreset::LeftThick => [K, N, N, N],
            BorderPreset::RightThick => [N, N, K, N],
            BorderPreset::TopThick => [N, K, N, N],
            BorderPreset::BottomThick => [N, N, N, K],
            BorderPreset::Thick => [K, K, K, K],
            BorderPreset::LeftThin => [T, N, N, N],
            BorderPreset::RightThin => [N, N, T, N],
            BorderPreset::TopThin => [N, T, N, N],
            BorderPreset::BottomThin => [N, N, N, T],
            BorderPreset::Thin => [T, T, T, T],
            BorderPreset::LeftTopThickRightBottomThin => [K, K, T, T],
            BorderPreset::RightTopThickLeftBottomThin => [T, K, K, T],
            BorderPreset::LeftBottomThickRightTopThin => [K, T, T, K],
            BorderPreset::RightBottomThickLeftTopThin => [T, T, K, K],
            BorderPreset::LeftTopRightThickBottomThin => [K, K, K, T],
            BorderPreset::LeftBottomRightThickTopThin => [K, T, K, K],
            BorderPreset::LeftRightThickTopBottomThin => [K, T, K, T],
            BorderPreset::TopThickLeftBottomRightThin => [T, K, T, T],
            BorderPreset::LeftThickTopBottomRightThin => [K, T, T, T],
            BorderPreset::BottomThickTopLeftRightThin => [T, T, T, K],
            BorderPreset::RightThickTopLeftBottomThin => [T, T, K, T],
            BorderPreset::LeftTopBottomThickRightThin => [K, K, T, K],
            BorderPreset::RightTopBottomThickLeftThin => [T, K, K, K],
            BorderPreset::TopBottomThickLeftRightThin => [T, K, T, K],
        }
    }

    /// The preset drawn in palette color `color`
    pub fn border(self, color: u8) -> Border {
        let [left, top, right, bottom] = self.edges();
        Border::sides(left, top, right, bottom, color)
    }
}

/// Cell format description, registered with `add_cell_style`
///
/// # Examples
///
/// ```
/// use biffwriter::types::{Border, CellFormat, FontId, HAlign, LineStyle, VAlign};
///
/// let format = CellFormat::new(FontId::DEFAULT, 0, HAlign::Center, VAlign::Center)
///     .border(Border::all(LineStyle::Thin, 8))
///     .wrap();
/// assert!(format.wrap);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellFormat {
    pub font: FontId,
    /// Built-in number format index (0 = General)
    pub number_format: u16,
    pub align: HAlign,
    pub valign: VAlign,
    pub border: Option<Border>,
    pub wrap: bool,
    pub merge: bool,
    /// Text rotation: 0-90 counterclockwise, 91-180 clockwise, 255 vertical
    pub rotation: u8,
    pub foreground: u8,
    pub background: u8,
    pub fill: FillPattern,
}

impl CellFormat {
    pub fn new(font: FontId, number_format: u16, align: HAlign, valign: VAlign) -> Self {
        CellFormat {
            font,
            number_format,
            align,
            valign,
            border: None,
            wrap: false,
            merge: false,
            rotation: 0,
            foreground: DEFAULT_FOREGROUND,
            background: DEFAULT_BACKGROUND,
            fill: FillPattern::None,
        }
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = Some(border);
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn merged(mut self) -> Self {
        self.merge = true;
        self
    }

    pub fn rotation(mut self, rotation: u8) -> Self {
        self.rotation = rotation;
        self
    }

    /// Pattern colors. Only visible together with a [`FillPattern`].
    pub fn colors(mut self, foreground: u8, background: u8) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn fill(mut self, fill: FillPattern) -> Self {
        self.fill = fill;
        self
    }
}

impl Default for CellFormat {
    fn default() -> Self {
        CellFormat::new(FontId::DEFAULT, 0, HAlign::General, VAlign::Bottom)
    }
}

/// Value stored in a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    /// IEEE 754 number (NUMBER record)
    Number(f64),
    /// Text, stored in the shared string table (LABELSST record)
    Text(String),
    /// Formatted but empty cell (BLANK record)
    Blank,
}

impl CellData {
    /// Convert a date/time into an Excel serial number (1900 date system)
    pub fn excel_serial(dt: NaiveDateTime) -> f64 {
        // 1899-12-30 is day zero for every date after February 1900.
        const EPOCH_DAYS_FROM_CE: i32 = 693_594;
        let days = dt.date().num_days_from_ce() - EPOCH_DAYS_FROM_CE;
        let time = dt.time();
        let seconds = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
        days as f64 + seconds / 86_400.0
    }
}

impl From<f64> for CellData {
    fn from(value: f64) -> Self {
        CellData::Number(value)
    }
}

impl From<i32> for CellData {
    fn from(value: i32) -> Self {
        CellData::Number(value as f64)
    }
}

impl From<&str> for CellData {
    fn from(value: &str) -> Self {
        CellData::Text(value.to_string())
    }
}

impl From<String> for CellData {
    fn from(value: String) -> Self {
        CellData::Text(value)
    }
}

impl From<NaiveDateTime> for CellData {
    fn from(value: NaiveDateTime) -> Self {
        CellData::Number(CellData::excel_serial(value))
    }
}

impl From<NaiveDate> for CellData {
    fn from(value: NaiveDate) -> Self {
        CellData::Number(CellData::excel_serial(value.and_time(Default::default())))
    }
}

/// Rectangular merge region, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRange {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
}

impl MergeRange {
    /// Whether the two regions share at least one cell
    pub fn overlaps(&self, other: &MergeRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    /// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
    fn col_to_letter(col: u16) -> String {
        let mut result = String::new();
        let mut col = col as u32 + 1;

        while col > 0 {
            col -= 1;
            result.insert(0, (b'A' + (col % 26) as u8) as char);
            col /= 26;
        }

        result
    }
}

impl fmt::Display for MergeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            Self::col_to_letter(self.first_col),
            self.first_row as u32 + 1,
            Self::col_to_letter(self.last_col),
            self.last_row as u32 + 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_range_reference() {
        let range = MergeRange {
            first_row: 0,
            last_row: 1,
            first_col: 0,
            last_col: 26,
        };
        assert_eq!(range.to_string(), "A1:AA2");
    }

    #[test]
    fn test_border_presets() {
        let border = BorderPreset::LeftTopThick.border(8);
        assert_eq!(border.left, LineStyle::Thick);
        assert_eq!(border.top, LineStyle::Thick);
        assert_eq!(border.right, LineStyle::None);
        assert_eq!((border.left_color, border.right_color), (8, 0));

        assert_eq!(BorderPreset::Thin.border(8), Border::all(LineStyle::Thin, 8));
        assert_eq!(
            BorderPreset::LeftRightThickTopBottomThin.edges(),
            [LineStyle::Thick, LineStyle::Thin, LineStyle::Thick, LineStyle::Thin]
        );

        // every preset is a distinct combination
        let unique: std::collections::HashSet<_> =
            BorderPreset::ALL.iter().map(|preset| preset.edges()).collect();
        assert_eq!(unique.len(), BorderPreset::ALL.len());
    }

    #[test]
    fn test_merge_overlap() {
        let a = MergeRange {
            first_row: 0,
            last_row: 1,
            first_col: 0,
            last_col: 1,
        };
        let b = MergeRange {
            first_row: 1,
            last_row: 3,
            first_col: 1,
            last_col: 2,
        };
        let c = MergeRange {
            first_row: 2,
            last_row: 3,
            first_col: 0,
            last_col: 0,
        };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_font_biff_index_skips_four() {
        assert_eq!(FontId(3).biff_index(), 3);
        assert_eq!(FontId(4).biff_index(), 5);
        assert_eq!(FontId(5).biff_index(), 6);
        assert_eq!(FontId::from_biff_index(6), Some(FontId(5)));
        assert_eq!(FontId::from_biff_index(4), None);
    }

    #[test]
    fn test_excel_serial() {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(CellData::from(date), CellData::Number(25569.0));

        let noon = date.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(CellData::excel_serial(noon), 25569.5);
    }

    #[test]
    fn test_cell_data_conversions() {
        assert_eq!(CellData::from(42.5), CellData::Number(42.5));
        assert_eq!(CellData::from(7), CellData::Number(7.0));
        assert_eq!(CellData::from("Total"), CellData::Text("Total".to_string()));
    }
}
