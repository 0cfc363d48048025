use std::cmp::Ordering;

use super::Chart;
use crate::model::PartId;
use crate::occurrence::{AnalysisOccurrence, TextSource};

/// A word group read out of document order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Word group {part} starting at {begin:?} does not follow {previous:?}")]
pub struct OrderingViolation {
    pub part: PartId,
    pub begin: AnalysisOccurrence,
    /// End of the last word group read before `part`, if any
    pub previous: Option<AnalysisOccurrence>,
}

impl Chart {
    /// Put parts with unknown or out-of-order columns back into a valid column.
    ///
    /// A part whose column is missing from the template, or which sits left
    /// of a part before it in the same row, is moved to the column currently
    /// open in that row. Returns whether anything was changed; the same fact
    /// is kept for [`take_repair_notice`](Self::take_repair_notice).
    pub fn check_and_repair(&mut self) -> bool {
        let mut repaired = false;
        for row in self.store.rows().to_vec() {
            let mut open = 0;
            for part_id in self.store.parts_of_row(row).to_vec() {
                let Some(part) = self.store.part(part_id) else {
                    continue;
                };
                let fix = match self.template.index_of(part.column) {
                    None => {
                        log::warn!(
                            "{part_id} in {row} refers to unknown {}, moving it to column {open}",
                            part.column
                        );
                        true
                    }
                    Some(index) if index < open => {
                        log::warn!(
                            "{part_id} in {row} is in column {index} after column {open}, moving it"
                        );
                        true
                    }
                    Some(index) => {
                        open = index;
                        false
                    }
                };
                if fix && let Ok(column) = self.column_id(open) {
                    let _ = self.store.set_part_column(part_id, column);
                    repaired = true;
                }
            }
        }
        if repaired {
            self.flag_repaired();
        }
        repaired
    }

    /// Verify that word groups read in chart order follow document order.
    ///
    /// Word groups marked as moved text are skipped; their inversion is
    /// documented by the marker.
    pub fn check_ordering(&self, text: &impl TextSource) -> Result<(), OrderingViolation> {
        let mut previous: Option<AnalysisOccurrence> = None;
        for part in self.store.parts_in_order() {
            let Some((begin, end)) = part.word_range() else {
                continue;
            };
            if self.store.is_moved_text(part.id) {
                continue;
            }
            let violation = OrderingViolation {
                part: part.id,
                begin,
                previous,
            };
            if !matches!(text.compare(begin, end), Some(Ordering::Less | Ordering::Equal)) {
                return Err(violation);
            }
            if let Some(previous) = previous
                && !text.is_after(begin, previous)
            {
                return Err(violation);
            }
            previous = Some(end);
        }
        Ok(())
    }
}
