//! Line-item projection: nested invoice fields → flat records with a fixed schema.
//!
//! ## Column Schema
//!
//! ```text
//! file_name | item_name | item_amount | <requested extra fields...>
//! ```
//!
//! `item_name` is the source `Description`, `item_amount` the source `Amount`.
//! The schema depends only on the [`ColumnSpec`], so every record of a batch
//! has the same columns in the same order. Absent values are
//! [`RecordValue::Missing`]; items are never dropped for missing fields.

use crate::model::{ColumnSpec, FieldValue, LineItem, AMOUNT_FIELD, DESCRIPTION_FIELD};
use crate::output::{LineItemRecord, RecordValue};

pub const FILE_NAME_COLUMN: &str = "file_name";
pub const ITEM_NAME_COLUMN: &str = "item_name";
pub const ITEM_AMOUNT_COLUMN: &str = "item_amount";

/// Output column → source field. `None` for `file_name`, which is not a field.
fn source_field(column: &str) -> Option<&str> {
    match column {
        FILE_NAME_COLUMN => None,
        ITEM_NAME_COLUMN => Some(DESCRIPTION_FIELD),
        ITEM_AMOUNT_COLUMN => Some(AMOUNT_FIELD),
        other => Some(other),
    }
}

/// Output column for a requested or source field name.
fn column_for(field: &str) -> &str {
    match field {
        DESCRIPTION_FIELD => ITEM_NAME_COLUMN,
        AMOUNT_FIELD => ITEM_AMOUNT_COLUMN,
        other => other,
    }
}

/// The ordered, duplicate-free column set for `spec`.
pub fn final_columns(spec: &ColumnSpec) -> Vec<String> {
    let mut columns: Vec<String> = [FILE_NAME_COLUMN, ITEM_NAME_COLUMN, ITEM_AMOUNT_COLUMN]
        .iter()
        .map(|c| c.to_string())
        .collect();

    for field in spec.requested() {
        let column = column_for(field);
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }
    columns
}

fn to_record_value(value: &FieldValue) -> RecordValue {
    match value {
        FieldValue::Scalar { value } => RecordValue::Text(value.clone()),
        FieldValue::Currency { amount, .. } => RecordValue::Amount(*amount),
        FieldValue::Missing => RecordValue::Missing,
    }
}

/// Project one item onto `columns`.
pub fn project_item(item: &LineItem, file_name: &str, columns: &[String]) -> LineItemRecord {
    let values = columns
        .iter()
        .map(|column| {
            let value = match source_field(column) {
                None => RecordValue::Text(file_name.to_string()),
                Some(field) => item
                    .get(field)
                    .filter(|v| v.is_present())
                    .map(to_record_value)
                    .unwrap_or(RecordValue::Missing),
            };
            (column.clone(), value)
        })
        .collect();

    LineItemRecord::from_values(values)
}

/// Project every line item of one document, preserving item order.
pub fn project_line_items(
    items: &[LineItem],
    file_name: &str,
    spec: &ColumnSpec,
) -> Vec<LineItemRecord> {
    let columns = final_columns(spec);
    items
        .iter()
        .map(|item| project_item(item, file_name, &columns))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn widget() -> LineItem {
        LineItem::new()
            .with("Description", FieldValue::scalar("Widget"))
            .with("Amount", FieldValue::currency(10.0, Some("USD")))
    }

    fn gadget() -> LineItem {
        LineItem::new()
            .with("Description", FieldValue::scalar("Gadget"))
            .with("Amount", FieldValue::currency(5.5, Some("USD")))
            .with("Quantity", FieldValue::scalar("3"))
    }

    #[test]
    fn default_columns() {
        assert_eq!(
            final_columns(&ColumnSpec::default()),
            vec!["file_name", "item_name", "item_amount"]
        );
    }

    #[test]
    fn covered_and_duplicate_fields_are_not_repeated() {
        let spec = ColumnSpec::new(["Quantity", "Description", "item_amount", "Quantity", "Date"]);
        assert_eq!(
            final_columns(&spec),
            vec!["file_name", "item_name", "item_amount", "Quantity", "Date"]
        );
    }

    #[test]
    fn widget_gadget_with_quantity() {
        let spec = ColumnSpec::new(["Quantity"]);
        let records = project_line_items(&[widget(), gadget()], "inv1.pdf", &spec);

        assert_eq!(records.len(), 2);
        let first: Vec<_> = records[0].values().cloned().collect();
        assert_eq!(
            first,
            vec![
                RecordValue::Text("inv1.pdf".into()),
                RecordValue::Text("Widget".into()),
                RecordValue::Amount(10.0),
                RecordValue::Missing,
            ]
        );
        assert_eq!(records[1].get("item_name"), Some(&RecordValue::Text("Gadget".into())));
        assert_eq!(records[1].get("item_amount"), Some(&RecordValue::Amount(5.5)));
        assert_eq!(records[1].get("Quantity"), Some(&RecordValue::Text("3".into())));
    }

    #[test]
    fn item_without_description_or_amount_is_kept() {
        let item = LineItem::new().with("Quantity", FieldValue::scalar("2"));
        let records = project_line_items(&[item], "x.pdf", &ColumnSpec::default());

        assert_eq!(records.len(), 1);
        assert!(records[0].get("item_name").unwrap().is_missing());
        assert!(records[0].get("item_amount").unwrap().is_missing());
        assert_eq!(records[0].get("Quantity"), None);
    }

    #[test]
    fn blank_and_missing_values_become_missing() {
        let item = LineItem::new()
            .with("Description", FieldValue::scalar("  "))
            .with("Amount", FieldValue::Missing);
        let records = project_line_items(&[item], "x.pdf", &ColumnSpec::default());
        assert!(records[0].get("item_name").unwrap().is_missing());
        assert!(records[0].get("item_amount").unwrap().is_missing());
    }

    #[test]
    fn zero_amount_is_not_missing() {
        let item = LineItem::new().with("Amount", FieldValue::currency(0.0, None));
        let records = project_line_items(&[item], "x.pdf", &ColumnSpec::default());
        assert_eq!(records[0].get("item_amount"), Some(&RecordValue::Amount(0.0)));
    }

    #[test]
    fn unknown_requested_field_is_padded() {
        let spec = ColumnSpec::new(["Colour"]);
        let records = project_line_items(&[widget()], "x.pdf", &spec);
        assert_eq!(records[0].get("Colour"), Some(&RecordValue::Missing));
    }
}
