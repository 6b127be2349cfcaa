//! Sparse cell storage for the single worksheet

use super::records::{self, ColInfoRecord, RowRecord};
use crate::types::{MergeRange, StyleId};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Stored cell content
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Number(f64),
    /// Index into the shared string table
    Text(u32),
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEntry {
    pub value: CellValue,
    pub style: StyleId,
}

/// One row: optional explicit height and its cells keyed by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowEntry {
    /// Height in twips
    pub height: Option<u16>,
    pub cells: BTreeMap<u16, CellEntry>,
}

impl RowEntry {
    /// First occupied column and one past the last one, (0, 0) for an empty row
    pub fn col_span(&self) -> (u16, u16) {
        match (self.cells.keys().next(), self.cells.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last.saturating_add(1)),
            _ => (0, 0),
        }
    }
}

/// Column width override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub first_col: u16,
    pub last_col: u16,
    /// Width in 1/256 of a character
    pub width: u16,
    pub style: StyleId,
}

/// Everything that goes into the worksheet substream
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    rows: BTreeMap<u16, RowEntry>,
    columns: Vec<ColumnInfo>,
    merges: Vec<MergeRange>,
}

impl SheetData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cell, replacing any previous content at the same position
    pub fn insert(&mut self, row: u16, col: u16, entry: CellEntry) {
        self.rows.entry(row).or_default().cells.insert(col, entry);
    }

    pub fn set_row_height(&mut self, row: u16, twips: u16) {
        self.rows.entry(row).or_default().height = Some(twips);
    }

    pub fn add_column(&mut self, info: ColumnInfo) {
        self.columns.push(info);
    }

    pub fn add_merge(&mut self, range: MergeRange) {
        self.merges.push(range);
    }

    pub fn rows(&self) -> &BTreeMap<u16, RowEntry> {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    pub fn cell(&self, row: u16, col: u16) -> Option<&CellEntry> {
        self.rows.get(&row).and_then(|r| r.cells.get(&col))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (u16, u16, &CellEntry)> {
        self.rows
            .iter()
            .flat_map(|(&row, entry)| {
                entry
                    .cells
                    .iter()
                    .map(move |(&col, cell)| (row, col, cell))
            })
    }

    /// Number of cells referencing the shared string table
    pub fn text_cell_count(&self) -> usize {
        self.cells()
            .filter(|(_, _, cell)| matches!(cell.value, CellValue::Text(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty() && self.merges.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.merges.clear();
    }

    /// Write COLINFO records, then every row followed by its cells, then MERGECELLS
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for info in &self.columns {
            ColInfoRecord {
                first_col: info.first_col,
                last_col: info.last_col,
                width: info.width,
                xf: info.style.index(),
            }
            .write(writer)?;
        }

        for (&row, entry) in &self.rows {
            let (first_col, last_col_plus_one) = entry.col_span();
            RowRecord {
                row,
                first_col,
                last_col_plus_one,
                height: entry.height,
            }
            .write(writer)?;

            for (&col, cell) in &entry.cells {
                let xf = cell.style.index();
                match cell.value {
                    CellValue::Number(value) => {
                        records::write_number(writer, row, col, xf, value)?
                    }
                    CellValue::Text(index) => {
                        records::write_label_sst(writer, row, col, xf, index)?
                    }
                    CellValue::Blank => records::write_blank(writer, row, col, xf)?,
                }
            }
        }

        if !self.merges.is_empty() {
            records::write_merge_cells(writer, &self.merges)?;
        }
        Ok(())
    }
}
