//! Workbook writer: builds the BIFF8 stream and stores it in a compound file on disk

use crate::biff::BiffEncoder;
use crate::error::Result;
use crate::ole::{self, SectorLayout};
use crate::types::{
    BorderPreset, CellData, CellFormat, Font, FontId, FontParams, HAlign, StyleId, VAlign,
};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

const DEFAULT_WORKBOOK_NAME: &str = "Workbook";

/// Lifecycle of a [`XlsWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterState {
    /// Nothing added since construction or the last `clear`
    #[default]
    Empty,
    /// Content changed since the last successful upload
    Building,
    /// The file on disk matches the current content
    Written,
}

/// Writer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Reject unregistered styles and fonts, columns past 255 and overlapping merges
    pub strict: bool,
    /// Write to a temporary file next to the target and rename it into place
    pub atomic: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            strict: false,
            atomic: true,
        }
    }
}

/// Legacy Excel (.xls) writer for a single worksheet
///
/// Content is kept in memory. [`upload`](XlsWriter::upload) serializes everything and
/// rewrites the whole file on every call.
///
/// # Examples
///
/// ```no_run
/// use biffwriter::types::{CellFormat, Font, HAlign, VAlign};
/// use biffwriter::writer::XlsWriter;
///
/// let mut writer = XlsWriter::new("report.xls");
/// let bold = writer.add_font(&Font::new("Arial", 10).bold());
/// let header = writer.add_cell_style(&CellFormat::new(bold, 0, HAlign::Center, VAlign::Bottom));
///
/// writer.add_data("Total", 0, 0, header);
/// writer.add_data(42.5, 0, 1, header);
/// writer.upload().unwrap();
/// ```
#[derive(Debug)]
pub struct XlsWriter {
    encoder: BiffEncoder,
    path: PathBuf,
    workbook_name: String,
    options: WriterOptions,
    state: WriterState,
    layout: Option<SectorLayout>,
}

impl XlsWriter {
    /// Create a writer targeting `path`. Nothing is written until [`upload`](XlsWriter::upload).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_options(path, WriterOptions::default())
    }

    pub fn with_options<P: AsRef<Path>>(path: P, options: WriterOptions) -> Self {
        let mut encoder = BiffEncoder::new();
        encoder.set_strict(options.strict);
        XlsWriter {
            encoder,
            path: path.as_ref().to_path_buf(),
            workbook_name: DEFAULT_WORKBOOK_NAME.to_string(),
            options,
            state: WriterState::Empty,
            layout: None,
        }
    }

    /// Name of the stream inside the compound file. Empty names are ignored.
    pub fn set_workbook_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.workbook_name = name.to_string();
        self.touch();
    }

    pub fn workbook_name(&self) -> &str {
        &self.workbook_name
    }

    /// Worksheet name. Empty names are ignored.
    pub fn set_sheet_name(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.encoder.set_sheet_name(name);
        self.touch();
    }

    pub fn sheet_name(&self) -> &str {
        self.encoder.sheet_name()
    }

    /// Output path. Empty paths are ignored.
    pub fn set_file_name<P: AsRef<Path>>(&mut self, path: P) {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || path == self.path {
            return;
        }
        self.path = path.to_path_buf();
        self.touch();
    }

    pub fn file_name(&self) -> &Path {
        &self.path
    }

    pub fn add_font(&mut self, font: &Font) -> FontId {
        self.touch();
        self.encoder.add_font(font)
    }

    pub fn add_cell_style(&mut self, format: &CellFormat) -> StyleId {
        self.touch();
        self.encoder.add_cell_style(format)
    }

    /// Register a cell style drawing `preset` in palette color `color`, with general
    /// number format and alignment, vertically centered
    pub fn add_border_style(&mut self, font: FontId, preset: BorderPreset, color: u8) -> StyleId {
        self.add_cell_style(
            &CellFormat::new(font, 0, HAlign::General, VAlign::Center).border(preset.border(color)),
        )
    }

    /// Store a number, text, date or blank at (`row`, `col`)
    pub fn add_data(&mut self, value: impl Into<CellData>, row: u16, col: u16, style: StyleId) {
        self.touch();
        self.encoder.add_data(value, row, col, style);
    }

    /// Store `text` as a number when it parses as one, as text otherwise
    ///
    /// ```
    /// use biffwriter::types::StyleId;
    /// use biffwriter::writer::XlsWriter;
    ///
    /// let mut writer = XlsWriter::new("unused.xls");
    /// writer.add_text_or_number(" 12.5 ", 0, 0, StyleId::DEFAULT);
    /// writer.add_text_or_number("12 apples", 0, 1, StyleId::DEFAULT);
    /// assert_eq!(writer.encoder().shared_strings().count(), 1);
    /// ```
    pub fn add_text_or_number(&mut self, text: &str, row: u16, col: u16, style: StyleId) {
        match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => self.add_data(number, row, col, style),
            _ => self.add_data(text, row, col, style),
        }
    }

    /// Size columns `from_col..=to_col` for text of `max_len` characters plus one
    /// character of padding
    pub fn set_col_width(&mut self, max_len: u16, from_col: u16, to_col: u16, style: StyleId) {
        self.touch();
        self.encoder
            .set_col_width(max_len.saturating_add(1), from_col, to_col, style);
    }

    pub fn merge_cells(&mut self, first_row: u16, last_row: u16, first_col: u16, last_col: u16) {
        self.touch();
        self.encoder
            .merge_cells(first_row, last_row, first_col, last_col);
    }

    /// Row height in points
    pub fn set_row_height(&mut self, row: u16, points: f64) {
        self.touch();
        self.encoder.set_row_height(row, points);
    }

    pub fn font_params(&self, style: StyleId) -> Option<FontParams> {
        self.encoder.font_params(style)
    }

    pub fn encoder(&self) -> &BiffEncoder {
        &self.encoder
    }

    pub fn options(&self) -> WriterOptions {
        self.options
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Sector layout of the last successful upload
    pub fn layout(&self) -> Option<SectorLayout> {
        self.layout
    }

    /// Write the workbook to the output path
    ///
    /// In atomic mode the data goes to a temporary file in the target directory that
    /// only replaces the target once everything is written, so a failed upload never
    /// leaves a truncated file behind. The replacement keeps the permissions of the file
    /// it overwrites. In direct mode the stream is built before the target is opened, and
    /// a write error removes the partial file.
    pub fn upload(&mut self) -> Result<()> {
        log::debug!(
            "Uploading workbook to {} (atomic: {})",
            self.path.display(),
            self.options.atomic
        );

        let layout = if self.options.atomic {
            self.write_atomic()?
        } else {
            self.write_direct()?
        };

        log::debug!(
            "Wrote {} ({} sectors)",
            self.path.display(),
            layout.first_free_sector()
        );
        self.layout = Some(layout);
        self.state = WriterState::Written;
        Ok(())
    }

    fn write_atomic(&self) -> Result<SectorLayout> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = temp_file_like(dir, &self.path)?;

        let stream = self.encoder.get_biff_data()?;
        let layout = {
            let mut out = BufWriter::new(temp.as_file());
            ole::write_compound_file(&mut out, stream, &self.workbook_name)?
        };

        temp.persist(&self.path)?;
        Ok(layout)
    }

    fn write_direct(&self) -> Result<SectorLayout> {
        // Build first so a rejected document leaves the target untouched
        let stream = self.encoder.get_biff_data()?;
        let file = File::create(&self.path)?;

        let written = ole::write_compound_file(BufWriter::new(&file), stream, &self.workbook_name);
        if written.is_err() {
            drop(file);
            if let Err(err) = fs::remove_file(&self.path) {
                log::warn!(
                    "Failed to remove incomplete {}: {}",
                    self.path.display(),
                    err
                );
            }
        }
        written
    }

    /// Reset all content and names to the freshly constructed state. The output path
    /// and options are kept.
    pub fn clear(&mut self) {
        self.encoder.clear();
        self.workbook_name = DEFAULT_WORKBOOK_NAME.to_string();
        self.layout = None;
        self.state = WriterState::Empty;
    }

    fn touch(&mut self) {
        self.state = WriterState::Building;
    }
}

/// Temporary file in `dir` whose permissions match what a plain create of `target`
/// would give: those of the existing target, or 0o666 minus the umask
fn temp_file_like(dir: &Path, target: &Path) -> io::Result<NamedTempFile> {
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir)?;

    if let Ok(metadata) = fs::metadata(target) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(temp)
}

/// Builder for creating configured writers
pub struct XlsWriterBuilder {
    path: PathBuf,
    workbook_name: Option<String>,
    sheet_name: Option<String>,
    options: WriterOptions,
}

impl XlsWriterBuilder {
    /// Create a new builder
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        XlsWriterBuilder {
            path: path.as_ref().to_path_buf(),
            workbook_name: None,
            sheet_name: None,
            options: WriterOptions::default(),
        }
    }

    /// Set the stream name inside the compound file
    pub fn with_workbook_name(mut self, name: &str) -> Self {
        self.workbook_name = Some(name.to_string());
        self
    }

    /// Set the worksheet name
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    /// Enable strict validation
    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Enable or disable temp-file-and-rename writes
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.options.atomic = atomic;
        self
    }

    /// Build the writer
    pub fn build(self) -> XlsWriter {
        let mut writer = XlsWriter::with_options(&self.path, self.options);
        if let Some(name) = &self.workbook_name {
            writer.set_workbook_name(name);
        }
        if let Some(name) = &self.sheet_name {
            writer.set_sheet_name(name);
        }
        writer.state = WriterState::Empty;
        writer
    }
}
