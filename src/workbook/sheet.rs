use crate::workbook::cell::Cell;
use crate::workbook::cell::DateSystem;
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Sparse grid of raw cells for one sheet, indexed by (row, col).
/// Row 0 is the header row; fully empty rows are simply absent.
#[derive(Debug)]
pub struct SheetGrid {
    /// Sheet name, which becomes the table name
    pub(crate) name: String,
    /// Date system inherited from the workbook
    pub(crate) date_system: DateSystem,
    cells: Vec<Cell>,
    /// Index mapping from (row, col) to position in `cells`
    index: HashMap<(usize, usize), usize>,
    /// Row indexes that contain at least one cell, in order
    occupied_rows: BTreeSet<usize>,
    /// Highest column index seen, if any cell exists
    col_upper_bound: Option<usize>,
}

impl SheetGrid {
    pub(crate) fn new(name: &str, date_system: DateSystem) -> SheetGrid {
        SheetGrid {
            name: name.to_owned(),
            date_system,
            cells: Vec::new(),
            index: HashMap::new(),
            occupied_rows: BTreeSet::new(),
            col_upper_bound: None,
        }
    }

    /// Adds a cell, replacing any previous cell at the same position.
    pub(crate) fn push(&mut self, cell: Cell) {
        let position = (cell.row, cell.col);
        self.occupied_rows.insert(cell.row);
        self.col_upper_bound = Some(
            self.col_upper_bound
                .map_or(cell.col, |bound| bound.max(cell.col)),
        );
        match self.index.get(&position) {
            Some(existing) => self.cells[*existing] = cell,
            None => {
                self.index.insert(position, self.cells.len());
                self.cells.push(cell);
            }
        }
    }

    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index.get(&(row, col)).map(|index| &self.cells[*index])
    }

    /// True if the sheet contains no cells at all.
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if the header row (row 0) exists.
    pub(crate) fn has_header_row(&self) -> bool {
        self.occupied_rows.contains(&0)
    }

    /// Highest column index seen across the sheet, if any.
    pub(crate) fn col_upper_bound(&self) -> Option<usize> {
        self.col_upper_bound
    }

    /// Body row indexes (everything after the header row) in source order.
    /// Fully empty rows never appear because they own no cells.
    pub(crate) fn body_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.occupied_rows.iter().copied().filter(|row| *row > 0)
    }
}
