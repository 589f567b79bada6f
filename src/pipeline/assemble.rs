//! Table assembly: grouped rows → header + data rows.
//!
//! The first surviving row (after title removal) is always read as the
//! header; column labels come from the data, never from the caller. Each
//! table is assembled independently and yields a [`TableResult`], so one
//! malformed table is reported and skipped without touching its siblings.

use crate::config::{RaggedRowPolicy, ReconConfig};
use crate::error::TableError;
use crate::model::RawTable;
use crate::output::{ReconstructedTable, TableResult};
use crate::pipeline::group::{group_rows, GroupedTable};
use crate::pipeline::normalize::CellNormalizer;
use crate::pipeline::title::split_title;
use tracing::{debug, warn};

/// Assemble one grouped table whose title row (if any) has already been removed.
///
/// `table_index` only labels errors. Fewer than two rows yields a table with
/// no data rows.
pub fn assemble_table(
    table_index: usize,
    title: Option<String>,
    grouped: &GroupedTable,
    normalizer: &CellNormalizer,
    ragged_rows: RaggedRowPolicy,
) -> Result<ReconstructedTable, TableError> {
    let mut normalized = grouped.rows.iter().map(|row| {
        row.cells
            .iter()
            .map(|cell| normalizer.normalize(&cell.content))
            .collect::<Vec<_>>()
    });

    let header = normalized.next().unwrap_or_default();
    let width = header.len();

    let mut rows = Vec::with_capacity(grouped.rows.len().saturating_sub(1));
    for (offset, mut row) in normalized.enumerate() {
        if row.len() != width {
            let pad = ragged_rows == RaggedRowPolicy::PadRight && row.len() < width;
            if !pad {
                return Err(TableError::RaggedRow {
                    table: table_index,
                    row: offset + 1,
                    expected: width,
                    found: row.len(),
                });
            }
            row.resize(width, String::new());
        }
        rows.push(row);
    }

    Ok(ReconstructedTable {
        title,
        header,
        rows,
    })
}

/// Run the full table path (group → title → normalise → assemble) for one raw table.
pub fn reconstruct_table(
    table_index: usize,
    raw: &RawTable,
    normalizer: &CellNormalizer,
    config: &ReconConfig,
) -> Result<ReconstructedTable, TableError> {
    if raw.is_empty() {
        return Err(TableError::EmptyTable { table: table_index });
    }

    let grouped = group_rows(raw);
    let (title, body) = split_title(grouped, config.detect_titles);
    assemble_table(table_index, title, &body, normalizer, config.ragged_rows)
}

/// Reconstruct every table of a document, one [`TableResult`] per source table,
/// in the order the service returned them.
pub fn assemble_tables(tables: &[RawTable], config: &ReconConfig) -> Vec<TableResult> {
    let normalizer = CellNormalizer::from_config(config);

    tables
        .iter()
        .enumerate()
        .map(|(table_index, raw)| {
            match reconstruct_table(table_index, raw, &normalizer, config) {
                Ok(table) => {
                    debug!(
                        "Table {}: {} columns, {} data rows, title: {:?}",
                        table_index,
                        table.header.len(),
                        table.rows.len(),
                        table.title
                    );
                    TableResult::assembled(table_index, table)
                }
                Err(e) => {
                    warn!("Dropping table {}: {}", table_index, e);
                    TableResult::dropped(table_index, e)
                }
            }
        })
        .collect()
}
