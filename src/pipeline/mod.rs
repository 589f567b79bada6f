//! Reconstruction stages for extracted invoice content.
//!
//! Each submodule implements exactly one transformation step. All of them
//! are pure and synchronous; only the batch drivers in [`crate::convert`] and
//! [`crate::stream`] touch the extraction service.
//!
//! ## Data Flow
//!
//! ```text
//! RawTable ──▶ group ──▶ title ──▶ normalize ──▶ assemble ──▶ TableResult
//!             (sort)    (caption)  (clean cell)   (header+rows)
//!
//! LineItem ──▶ line_items ──▶ LineItemRecord
//!              (project + pad)
//!
//! per-document outputs ──▶ combine ──▶ batch-wide sequence
//! ```
//!
//! 1. [`group`]      : sort loose cells by `(row, column)` and cut into rows
//! 2. [`title`]      : a single-cell first row is the table's caption
//! 3. [`normalize`]  : drop checkbox markers, trim, canonicalise numbers
//! 4. [`assemble`]   : first row is the header, the rest are data rows;
//!    malformed tables are reported per table
//! 5. [`line_items`] : rename `Description`/`Amount`, fix the column schema,
//!    fill gaps with the null sentinel
//! 6. [`combine`]    : concatenate per-document results in submission order

pub mod assemble;
pub mod combine;
pub mod group;
pub mod line_items;
pub mod normalize;
pub mod title;
