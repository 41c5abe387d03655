//! Workbook container access.
//!
//! A workbook is a zip archive holding an ordered list of named sheets.
//! This module reads the container structure once (sheet inventory, date
//! system, shared strings, number formats) and then materializes individual
//! sheets as sparse cell grids on demand. The input stream is only held for
//! the lifetime of the `Workbook` value.

pub(crate) mod cell;
pub(crate) mod sheet;
mod xlsx;

pub use sheet::SheetGrid;

use crate::error::FixtureSheetError;
use crate::workbook::cell::DateSystem;
use crate::workbook::cell::NumberFormat;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use thiserror::Error;

/// Errors raised while opening or reading a workbook container.
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// A required archive part is absent or unreadable
    #[error("Workbook part not found: '{0}'")]
    MissingPart(String),

    /// Requested sheet does not exist in the workbook
    #[error("Sheet not found: '{0}'")]
    SheetNotFound(String),

    /// A cell references a shared string index beyond the table
    #[error("Shared string index {0} out of range")]
    SharedStringIndex(usize),
}

/// An opened workbook: ordered sheet inventory plus the container-wide
/// tables needed to interpret cells.
pub struct Workbook<RS: Read + Seek> {
    zip: zip::ZipArchive<RS>,
    /// (sheet name, archive path) pairs in source order
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    number_formats: Vec<NumberFormat>,
    date_system: DateSystem,
}

impl Workbook<BufReader<File>> {
    /// Opens a workbook file from a path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FixtureSheetError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}

impl<RS: Read + Seek> Workbook<RS> {
    /// Opens a workbook from any seekable byte stream.
    pub fn from_reader(reader: RS) -> Result<Self, FixtureSheetError> {
        let mut zip = zip::ZipArchive::new(reader)?;
        let (sheets, date_system) = xlsx::load_workbook(&mut zip)?;
        let number_formats = xlsx::load_number_formats(&mut zip)?;
        let shared_strings = xlsx::load_shared_strings(&mut zip)?;
        log::debug!(
            "opened workbook: {} sheet(s), {} shared string(s)",
            sheets.len(),
            shared_strings.len()
        );
        Ok(Workbook {
            zip,
            sheets,
            shared_strings,
            number_formats,
            date_system,
        })
    }

    /// Sheet names in source order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads one sheet by name into a sparse cell grid.
    pub fn read_sheet(&mut self, sheet_name: &str) -> Result<SheetGrid, FixtureSheetError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| WorkbookError::SheetNotFound(sheet_name.to_owned()))?;
        xlsx::read_sheet(
            &mut self.zip,
            sheet_name,
            &zip_path,
            &self.shared_strings,
            &self.number_formats,
            self.date_system,
        )
    }

    /// Reads every sheet in source order.
    pub(crate) fn read_sheets(&mut self) -> Result<Vec<SheetGrid>, FixtureSheetError> {
        let names = self.sheet_names();
        names.iter().map(|name| self.read_sheet(name)).collect()
    }
}
