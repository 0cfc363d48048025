use serde::{Deserialize, Serialize};

use super::{ColumnId, PartId, RowId};
use crate::occurrence::AnalysisOccurrence;

/// Reference to an item of a host-owned marker list (e.g. a grammatical feature)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListItemRef(pub u64);

/// What a cell part holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellPartKind {
    /// Inclusive, contiguous run of occurrences; `begin` never follows `end`
    WordGroup {
        begin: AnalysisOccurrence,
        end: AnalysisOccurrence,
    },
    /// `None` is the explicit "missing" marker
    Tag { target: Option<ListItemRef> },
    /// Contiguous dependent/speech/song rows embedded at this cell
    ClauseMarker { dependent_rows: Vec<RowId> },
    /// The word group `target` logically belongs in this cell
    MovedTextMarker { target: PartId, preposed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPart {
    pub id: PartId,
    /// Owning row, maintained by the store
    pub row: RowId,
    pub column: ColumnId,
    pub merges_before: bool,
    pub merges_after: bool,
    pub kind: CellPartKind,
}

impl CellPart {
    pub fn new(id: PartId, row: RowId, column: ColumnId, kind: CellPartKind) -> Self {
        Self {
            id,
            row,
            column,
            merges_before: false,
            merges_after: false,
            kind,
        }
    }

    pub fn is_word_group(&self) -> bool {
        matches!(self.kind, CellPartKind::WordGroup { .. })
    }

    pub fn is_missing_marker(&self) -> bool {
        matches!(self.kind, CellPartKind::Tag { target: None })
    }

    pub fn is_preposed_marker(&self) -> bool {
        matches!(
            self.kind,
            CellPartKind::MovedTextMarker { preposed: true, .. }
        )
    }

    /// Begin and end occurrence, if this is a word group
    pub fn word_range(&self) -> Option<(AnalysisOccurrence, AnalysisOccurrence)> {
        match self.kind {
            CellPartKind::WordGroup { begin, end } => Some((begin, end)),
            _ => None,
        }
    }

    pub fn moved_text_target(&self) -> Option<PartId> {
        match self.kind {
            CellPartKind::MovedTextMarker { target, .. } => Some(target),
            _ => None,
        }
    }
}
