//! # biffwriter
//!
//! A Rust library for writing legacy Excel 97-2003 (`.xls`) workbooks.
//!
//! ## Features
//!
//! - **BIFF8 records**: fonts, cell formats with borders and fills, numbers, text, blanks,
//!   column widths, row heights and merged cells
//! - **Shared strings**: text is deduplicated and split across CONTINUE records as needed
//! - **OLE2 container**: header, allocation tables and directory are computed from the
//!   stream size, including master allocation tables for large files
//! - **Safe writes**: files are written to a temporary path and renamed into place
//! - **Strict mode**: optional validation of style, font, column and merge references
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biffwriter::types::{Border, CellFormat, Font, HAlign, LineStyle, VAlign};
//! use biffwriter::XlsWriter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut writer = XlsWriter::new("report.xls");
//! writer.set_sheet_name("Summary");
//!
//! let bold = writer.add_font(&Font::new("Arial", 10).bold());
//! let header = writer.add_cell_style(
//!     &CellFormat::new(bold, 0, HAlign::Center, VAlign::Center)
//!         .border(Border::all(LineStyle::Thin, 8)),
//! );
//!
//! writer.add_data("Item", 0, 0, header);
//! writer.add_data("Amount", 0, 1, header);
//! writer.add_data("Total", 1, 0, header);
//! writer.add_data(42.5, 1, 1, header);
//! writer.set_col_width(6, 0, 1, header);
//! writer.merge_cells(2, 2, 0, 1);
//!
//! writer.upload()?;
//! # Ok(())
//! # }
//! ```
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Truncated names and
//! clamped values are reported at `warn` level.

pub mod biff;
pub mod error;
pub mod ole;
pub mod types;
pub mod writer;

pub use error::{Result, XlsError};
pub use types::{BorderPreset, CellData, CellFormat, Font, FontId, StyleId};
pub use writer::{WriterOptions, WriterState, XlsWriter, XlsWriterBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let mut writer = XlsWriter::with_options("unused.xls", WriterOptions::default());
        let font = writer.add_font(&Font::new("Arial", 12));
        let style = writer.add_cell_style(&CellFormat {
            font,
            ..CellFormat::default()
        });
        writer.add_data(CellData::from("x"), 0, 0, style);

        assert_eq!(font, FontId::new(5));
        assert_eq!(style, StyleId::new(16));
        assert_eq!(writer.state(), WriterState::Building);
        assert!(XlsWriterBuilder::new("unused.xls").build().options().atomic);

        let err: XlsError = std::io::Error::other("denied").into();
        let result: Result<()> = Err(err);
        assert!(result.is_err());
    }

    #[test]
    fn test_types_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<XlsWriter>();
        assert_send::<biff::BiffEncoder>();
    }
}
