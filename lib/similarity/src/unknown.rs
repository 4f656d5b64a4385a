//! Unknown-value propagation.

use crate::distance::ensure_row_count;
use crate::row::SimilarityRow;
use trialmatch_core::{Field, FieldSet, Result, TrialRecord};

/// Fields the query cannot be compared on: the raw value is unknown or no
/// embedding was supplied for it.
pub fn unknown_query_fields(query: &TrialRecord) -> FieldSet {
    Field::ALL
        .into_iter()
        .filter(|field| query.is_unknown(*field) || query.embedding(*field).is_none())
        .collect()
}

/// Overwrite every cell whose query value or corpus value is unknown with a
/// not-applicable marker, re-blending the affected composites.
///
/// `rows[i]` must belong to `corpus[i]`. Returns the number of cells marked.
pub fn propagate_unknowns(
    query: &TrialRecord,
    corpus: &[&TrialRecord],
    rows: &mut [SimilarityRow],
) -> Result<usize> {
    ensure_row_count("unknown propagation", corpus.len(), rows.len())?;

    let query_unknown = query.unknown_fields();
    let mut marked = 0;
    for (record, row) in corpus.iter().zip(rows.iter_mut()) {
        for field in Field::ALL {
            if query_unknown.contains(&field) || record.is_unknown(field) {
                if row.primitive(field).is_applicable() {
                    marked += 1;
                }
                row.mark_not_applicable(field);
            }
        }
    }
    Ok(marked)
}
