//! Record combination across the documents of a batch.

/// Flatten per-document sequences into one, preserving document order first
/// and within-document order second.
///
/// No sorting, deduplication or grouping happens here; callers hand the
/// documents over already in submission order.
pub fn combine<I, J, T>(per_document: I) -> Vec<T>
where
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = T>,
{
    per_document.into_iter().flatten().collect()
}
