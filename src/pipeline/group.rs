//! Row grouping: impose row/column order on a table's loose cells.
//!
//! The service returns cells in no guaranteed order. Sorting on
//! `(row_index, column_index)` and cutting the sorted run wherever the row
//! index changes gives rows in ascending order with cells left to right.

use crate::model::{Cell, RawTable};

/// Cells sharing one `row_index`, sorted by `column_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedRow {
    pub row_index: usize,
    pub cells: Vec<Cell>,
}

impl OrderedRow {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Rows in ascending `row_index` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedTable {
    pub rows: Vec<OrderedRow>,
}

impl GroupedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total cell count over all rows.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(OrderedRow::len).sum()
    }

    /// The table without its first row (used once a title row is detected).
    pub fn without_first_row(mut self) -> Self {
        if !self.rows.is_empty() {
            self.rows.remove(0);
        }
        self
    }
}

/// Group a raw table's cells into ordered rows.
///
/// An empty table yields an empty [`GroupedTable`].
pub fn group_rows(table: &RawTable) -> GroupedTable {
    let mut cells = table.cells.clone();
    cells.sort_by_key(|cell| (cell.row_index, cell.column_index));

    let mut rows: Vec<OrderedRow> = Vec::new();
    for cell in cells {
        match rows.last_mut() {
            Some(row) if row.row_index == cell.row_index => row.cells.push(cell),
            _ => rows.push(OrderedRow {
                row_index: cell.row_index,
                cells: vec![cell],
            }),
        }
    }

    GroupedTable { rows }
}
