use crate::model::{PartId, RowId};
use crate::occurrence::{AnalysisOccurrence, TextId};

/// Errors surfaced by chart operations.
///
/// Every variant is raised before any mutation, or inside a transaction that
/// is rolled back, so the chart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("Selected words are not a contiguous run of one word group")]
    InvalidSelection,
    #[error("The chart has no charted rows to search")]
    EmptyChart,
    #[error("Row {0} no longer exists")]
    MissingRow(RowId),
    #[error("Cell part {0} no longer exists")]
    MissingPart(PartId),
    #[error("Cell part {0} is not a word group")]
    NotAWordGroup(PartId),
    #[error("Word group {0} is already marked as moved text")]
    AlreadyMoved(PartId),
    #[error("Cell part {0} is not a marker of the expected kind")]
    WrongMarkerKind(PartId),
    #[error("Column index {0} is outside the chart template")]
    ColumnOutOfRange(usize),
    #[error("Occurrence {0:?} is not part of the charted text")]
    UnknownOccurrence(AnalysisOccurrence),
    #[error("Chart belongs to text {expected:?}, got {actual:?}")]
    WrongText { expected: TextId, actual: TextId },
    #[error("Dependent clause rows must be a contiguous run excluding the marker's row")]
    InvalidClauseRows,
    #[error("Cell has no word group to mark as moved text")]
    NothingToMark,
}
