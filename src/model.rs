//! Input data model: what the extraction service hands us.
//!
//! Everything here is produced once at the service boundary
//! ([`crate::extraction`]) and then only read by the pipeline stages. Field
//! values are a closed enum so the stages never inspect loosely typed JSON.

use serde::{Deserialize, Serialize};

/// Source field that carries a line item's descriptive name.
pub const DESCRIPTION_FIELD: &str = "Description";
/// Source field that carries a line item's monetary amount.
pub const AMOUNT_FIELD: &str = "Amount";

/// Line-item fields produced by the prebuilt invoice model.
///
/// Requesting a field outside this list is allowed; it is simply absent on
/// every item and therefore padded with the null sentinel.
pub const KNOWN_LINE_ITEM_FIELDS: &[&str] = &[
    "Amount",
    "Date",
    "Description",
    "ProductCode",
    "Quantity",
    "Tax",
    "TaxRate",
    "Unit",
    "UnitPrice",
];

/// One unit of extracted content at a row/column position inside a table region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row_index: usize,
    pub column_index: usize,
    pub content: String,
}

impl Cell {
    pub fn new(row_index: usize, column_index: usize, content: impl Into<String>) -> Self {
        Self {
            row_index,
            column_index,
            content: content.into(),
        }
    }
}

/// An unordered set of cells belonging to one logical table region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub cells: Vec<Cell>,
}

impl RawTable {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<Cell> for RawTable {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// The value of one extracted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    /// Plain text (numbers are carried in their rendered form).
    Scalar { value: String },
    /// Monetary value; only `amount` survives projection.
    Currency {
        amount: f64,
        currency: Option<String>,
    },
    /// The service reported the field but supplied no value.
    Missing,
}

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FieldValue::Scalar {
            value: value.into(),
        }
    }

    pub fn currency(amount: f64, currency: Option<&str>) -> Self {
        FieldValue::Currency {
            amount,
            currency: currency.map(str::to_string),
        }
    }

    /// `true` when the value carries something worth emitting.
    ///
    /// Blank text counts as empty; any currency amount (zero included) does not.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Scalar { value } => !value.trim().is_empty(),
            FieldValue::Currency { .. } => true,
            FieldValue::Missing => false,
        }
    }
}

/// One invoice line item: field name → value, in the order the service listed them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub fields: Vec<(String, FieldValue)>,
}

impl LineItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and hand-built inputs.
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field, keeping the first-seen position.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

/// Everything the service extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub tables: Vec<RawTable>,
    pub line_items: Vec<LineItem>,
}

/// The caller's extra line-item fields.
///
/// The canonical `item_name` / `item_amount` columns are always implied and
/// never need to be listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    fields: Vec<String>,
}

impl ColumnSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(Into::into)
                .map(|field: String| field.trim().to_string())
                .filter(|field| !field.is_empty())
                .collect(),
        }
    }

    /// The requested fields as given (trimmed, blanks removed).
    pub fn requested(&self) -> &[String] {
        &self.fields
    }

    /// Requested fields that the prebuilt invoice model never produces.
    pub fn unknown_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|field| !KNOWN_LINE_ITEM_FIELDS.contains(field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_item_insert_replaces_in_place() {
        let mut item = LineItem::new()
            .with("Description", FieldValue::scalar("Widget"))
            .with("Quantity", FieldValue::scalar("1"));
        item.insert("Description", FieldValue::scalar("Gadget"));

        assert_eq!(item.fields.len(), 2);
        assert_eq!(item.fields[0].0, "Description");
        assert_eq!(item.get("Description"), Some(&FieldValue::scalar("Gadget")));
    }

    #[test]
    fn presence_rules() {
        assert!(FieldValue::scalar("3").is_present());
        assert!(!FieldValue::scalar("   ").is_present());
        assert!(FieldValue::currency(0.0, None).is_present());
        assert!(!FieldValue::Missing.is_present());
    }

    #[test]
    fn column_spec_trims_and_flags_unknown_fields() {
        let spec = ColumnSpec::new([" Quantity ", "", "Colour"]);
        assert_eq!(spec.requested(), &["Quantity".to_string(), "Colour".to_string()]);
        assert_eq!(spec.unknown_fields(), vec!["Colour"]);
    }
}
