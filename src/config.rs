//! Configuration types for table and line-item reconstruction.
//!
//! All reconstruction behaviour is controlled through [`ReconConfig`], built
//! via its [`ReconConfigBuilder`]. One struct holds every knob so a config can
//! be shared across concurrent document tasks and logged as a whole.

use crate::error::ReconError;
use crate::model::ColumnSpec;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checkbox marker the layout model leaves inside cell text.
pub const DEFAULT_ARTIFACT_MARKER: &str = ":unselected:";

/// Configuration for a reconstruction run.
///
/// Built via [`ReconConfig::builder()`] or using [`ReconConfig::default()`].
///
/// # Example
/// ```rust
/// use invoice_recon::{ColumnSpec, RaggedRowPolicy, ReconConfig};
///
/// let config = ReconConfig::builder()
///     .columns(ColumnSpec::new(["Quantity", "Date"]))
///     .ragged_rows(RaggedRowPolicy::PadRight)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ReconConfig {
    /// Substrings removed from every cell before trimming. Default: `[":unselected:"]`.
    pub artifact_markers: Vec<String>,

    /// Decimal places used when a cell parses as a number. Range: 0–6. Default: 2.
    pub decimal_places: usize,

    /// What to do with data rows whose width differs from the header. Default: reject.
    pub ragged_rows: RaggedRowPolicy,

    /// Treat a single-cell first row as the table title. Default: true.
    ///
    /// Single-column tables without a title are misread by this heuristic;
    /// switch it off for inputs known to contain such tables.
    pub detect_titles: bool,

    /// Extra line-item fields to project next to `item_name` / `item_amount`.
    pub columns: ColumnSpec,

    /// Number of documents sent to the extraction service at once. Default: 4.
    pub concurrency: usize,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            artifact_markers: vec![DEFAULT_ARTIFACT_MARKER.to_string()],
            decimal_places: 2,
            ragged_rows: RaggedRowPolicy::default(),
            detect_titles: true,
            columns: ColumnSpec::default(),
            concurrency: 4,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReconConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconConfig")
            .field("artifact_markers", &self.artifact_markers)
            .field("decimal_places", &self.decimal_places)
            .field("ragged_rows", &self.ragged_rows)
            .field("detect_titles", &self.detect_titles)
            .field("columns", &self.columns)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ReconConfig {
    /// Create a new builder for `ReconConfig`.
    pub fn builder() -> ReconConfigBuilder {
        ReconConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReconConfig`].
pub struct ReconConfigBuilder {
    config: ReconConfig,
}

impl fmt::Debug for ReconConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ReconConfigBuilder {
    /// Replace the marker list.
    pub fn artifact_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.artifact_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn decimal_places(mut self, places: usize) -> Self {
        self.config.decimal_places = places;
        self
    }

    pub fn ragged_rows(mut self, policy: RaggedRowPolicy) -> Self {
        self.config.ragged_rows = policy;
        self
    }

    pub fn detect_titles(mut self, v: bool) -> Self {
        self.config.detect_titles = v;
        self
    }

    pub fn columns(mut self, columns: ColumnSpec) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReconConfig, ReconError> {
        let c = &self.config;
        if c.decimal_places > 6 {
            return Err(ReconError::InvalidConfig(format!(
                "decimal places must be 0–6, got {}",
                c.decimal_places
            )));
        }
        if c.artifact_markers.iter().any(String::is_empty) {
            return Err(ReconError::InvalidConfig(
                "artifact markers must not be empty strings".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(ReconError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of data rows whose cell count differs from the header's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RaggedRowPolicy {
    /// Drop the whole table with [`crate::error::TableError::RaggedRow`]. (default)
    #[default]
    Reject,
    /// Right-pad short rows with empty cells; rows wider than the header are still rejected.
    PadRight,
}
