use std::cmp::Ordering;

use super::placement::contiguous_run;
use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{CellPart, ChartLocation, PartId};
use crate::occurrence::{AnalysisOccurrence, TextSource};

impl Chart {
    /// Mark words in `actual` as moved from their natural place `source`.
    ///
    /// Without a selection the first unmarked word group of `actual` is
    /// marked. A selection must be a run of consecutive words inside one
    /// word group; that group is split so the marked group covers exactly
    /// the selection. Returns the new marker.
    pub fn mark_moved(
        &mut self,
        text: &impl TextSource,
        actual: ChartLocation,
        source: ChartLocation,
        selection: Option<&[AnalysisOccurrence]>,
    ) -> Result<PartId, ChartError> {
        self.ensure_text(text)?;
        self.ensure_cell(actual)?;
        self.ensure_cell(source)?;
        if actual == source {
            return Err(ChartError::InvalidSelection);
        }
        let preposed = self.compare_locations(actual, source) == Some(Ordering::Less);

        self.run_in_transaction("Undo Mark Moved Text", "Redo Mark Moved Text", |chart| {
            let target = match selection {
                None => chart
                    .word_groups_in_cell(actual)
                    .into_iter()
                    .find(|wg| !chart.is_moved_text(*wg))
                    .ok_or(ChartError::NothingToMark)?,
                Some(selection) => chart.split_for_selection(text, actual, selection)?,
            };

            let source = chart.remove_missing_marker(source)?;
            let index = if preposed {
                chart.cell_start_index(source)
            } else {
                chart.cell_end_index(source)
            };
            let column = chart.column_id(source.column)?;
            let marker = chart
                .store
                .create_moved_marker(source.row, index, column, target, preposed)?;
            log::debug!("{target} marked as moved from {source:?} (preposed: {preposed})");
            Ok(marker)
        })
    }

    /// Delete a moved-text marker and rejoin the word groups it kept apart
    pub fn unmark_moved(
        &mut self,
        actual: ChartLocation,
        marker: PartId,
    ) -> Result<(), ChartError> {
        self.ensure_cell(actual)?;
        let target = self
            .store
            .part(marker)
            .ok_or(ChartError::MissingPart(marker))?
            .moved_text_target()
            .ok_or(ChartError::WrongMarkerKind(marker))?;
        if self.location_of(target) != Some(actual) {
            return Err(ChartError::InvalidSelection);
        }

        self.run_in_transaction(
            "Undo Remove Moved Text Marker",
            "Redo Remove Moved Text Marker",
            |chart| {
                let rows_before = chart.store.row_count();
                let marker_row = chart
                    .store
                    .part(marker)
                    .and_then(|part| chart.store.row_index(part.row))
                    .unwrap_or(0);
                chart.store.remove_part(marker)?;
                chart.coalesce_cell(actual)?;
                if chart.store.row_count() < rows_before {
                    chart.renumber_rows(marker_row, false);
                }
                Ok(())
            },
        )
    }

    /// Join neighbouring unmarked word groups of a cell until none are left.
    ///
    /// Returns how many joins were made.
    pub(crate) fn coalesce_cell(&mut self, cell: ChartLocation) -> Result<usize, ChartError> {
        let mut joined = 0;
        loop {
            let parts = self.parts_in_cell(cell);
            let pair = parts.windows(2).find_map(|pair| {
                let joinable = pair.iter().all(|id| {
                    self.store.part(*id).is_some_and(CellPart::is_word_group)
                        && !self.is_moved_text(*id)
                });
                joinable.then(|| (pair[0], pair[1]))
            });
            let Some((first, second)) = pair else {
                break;
            };
            let (begin, _) = self.word_range_of(first)?;
            let (_, end) = self.word_range_of(second)?;
            self.store.set_word_range(first, begin, end)?;
            self.store.remove_part(second)?;
            joined += 1;
        }
        Ok(joined)
    }

    /// Narrow the word group holding `selection` to exactly the selection,
    /// putting the words either side into new word groups
    fn split_for_selection(
        &mut self,
        text: &impl TextSource,
        cell: ChartLocation,
        selection: &[AnalysisOccurrence],
    ) -> Result<PartId, ChartError> {
        let (first, last) = contiguous_run(text, selection)?;
        let (wg, occurrences) = self
            .word_groups_in_cell(cell)
            .into_iter()
            .map(|wg| (wg, self.word_group_occurrences(text, wg)))
            .find(|(_, occurrences)| occurrences.contains(&first))
            .ok_or(ChartError::InvalidSelection)?;
        if self.is_moved_text(wg) {
            return Err(ChartError::AlreadyMoved(wg));
        }

        let start = occurrences
            .iter()
            .position(|occ| *occ == first)
            .ok_or(ChartError::InvalidSelection)?;
        let end = start + selection.len() - 1;
        if occurrences.get(end) != Some(&last) {
            return Err(ChartError::InvalidSelection);
        }

        let column = self
            .store
            .part(wg)
            .ok_or(ChartError::MissingPart(wg))?
            .column;
        if start > 0 {
            let index = self.part_index(wg).ok_or(ChartError::MissingPart(wg))?;
            self.store.create_word_group(
                cell.row,
                index,
                column,
                occurrences[0],
                occurrences[start - 1],
            )?;
        }
        if end + 1 < occurrences.len() {
            let index = self.part_index(wg).ok_or(ChartError::MissingPart(wg))?;
            self.store.create_word_group(
                cell.row,
                index + 1,
                column,
                occurrences[end + 1],
                occurrences[occurrences.len() - 1],
            )?;
        }
        self.store.set_word_range(wg, first, last)?;
        Ok(wg)
    }
}
