//! Title detection: a single-cell first row is the table's caption.
//!
//! This is a heuristic. A single-column table without a caption has a
//! one-cell first row too and will have its first value read as the title;
//! callers who know their tables look like that turn detection off via
//! [`crate::config::ReconConfig::detect_titles`].

use crate::pipeline::group::GroupedTable;

/// Outcome of [`detect_title`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleDetection {
    pub is_title: bool,
    pub title: Option<String>,
}

impl TitleDetection {
    fn none() -> Self {
        Self {
            is_title: false,
            title: None,
        }
    }
}

/// Decide whether the first row of `table` is a standalone title.
///
/// The title text is the cell's raw content, not its normalised form.
pub fn detect_title(table: &GroupedTable) -> TitleDetection {
    match table.rows.first() {
        Some(first) if first.cells.len() == 1 => TitleDetection {
            is_title: true,
            title: Some(first.cells[0].content.clone()),
        },
        _ => TitleDetection::none(),
    }
}

/// Split a grouped table into its title (if any) and the remaining rows.
pub fn split_title(table: GroupedTable, enabled: bool) -> (Option<String>, GroupedTable) {
    if !enabled {
        return (None, table);
    }

    let detection = detect_title(&table);
    if detection.is_title {
        (detection.title, table.without_first_row())
    } else {
        (None, table)
    }
}
