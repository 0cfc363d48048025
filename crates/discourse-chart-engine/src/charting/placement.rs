//! # Placement
//!
//! Decides where newly charted words go. Normal charting appends to the
//! end of the chart; orphans go into a cell the user picked inside the
//! highlight region. Each decision is computed read-only first and then
//! applied inside one transaction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::OrphanStatus;
use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{ChartLocation, PartId, RowId};
use crate::occurrence::{AnalysisOccurrence, TextPosition, TextSource};

/// Where appended words go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppendSlot {
    AppendToExisting(PartId),
    InsertNewInRow { row: RowId, index: usize },
    MakeNewRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordGroupEnd {
    AtStart,
    AtEnd,
}

/// Where an orphan goes within its chosen cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChorphSlot {
    InsertNewInRow(usize),
    AppendToExisting(PartId, WordGroupEnd),
    /// Already covered by a word group's range; nothing to do
    InsertIntoExisting,
}

/// Result of [`Chart::chart_next_words`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartOutcome {
    Charted(ChartLocation),
    /// The next word is an orphan and must be placed with
    /// [`Chart::insert_chorph`]; nothing was changed
    Orphan {
        occurrence: AnalysisOccurrence,
        position: TextPosition,
    },
    NothingToChart,
}

/// First and last of a non-empty run of consecutive occurrences
pub(crate) fn contiguous_run(
    text: &impl TextSource,
    occurrences: &[AnalysisOccurrence],
) -> Result<(AnalysisOccurrence, AnalysisOccurrence), ChartError> {
    let (Some(first), Some(last)) = (occurrences.first(), occurrences.last()) else {
        return Err(ChartError::InvalidSelection);
    };
    if !text.contains(*first) {
        return Err(ChartError::UnknownOccurrence(*first));
    }
    let consecutive = occurrences
        .windows(2)
        .all(|pair| text.next(pair[0]) == Some(pair[1]));
    if !consecutive {
        return Err(ChartError::InvalidSelection);
    }
    Ok((*first, *last))
}

impl Chart {
    /// Where words charted into `column` would go at the end of the chart.
    ///
    /// Scans the last row from its end. A "missing" marker in `column` is
    /// passed over; appending removes it.
    pub fn find_append_slot(&self, column: usize) -> AppendSlot {
        let Some(&row) = self.store.rows().last() else {
            return AppendSlot::MakeNewRow;
        };
        let parts = self.store.parts_of_row(row);
        let mut beyond = false;
        for (index, id) in parts.iter().enumerate().rev() {
            let Some(part) = self.store.part(*id) else {
                continue;
            };
            let part_column = self.column_index(part);
            match (part.is_word_group(), part_column.cmp(&column)) {
                (true, Ordering::Equal) => return AppendSlot::AppendToExisting(*id),
                (_, Ordering::Less) => {
                    return AppendSlot::InsertNewInRow {
                        row,
                        index: index + 1,
                    };
                }
                (true, Ordering::Greater) => return AppendSlot::MakeNewRow,
                (false, Ordering::Equal) if part.is_missing_marker() => continue,
                (false, Ordering::Equal) => return AppendSlot::MakeNewRow,
                (false, Ordering::Greater) => beyond = true,
            }
        }
        if beyond {
            AppendSlot::MakeNewRow
        } else {
            AppendSlot::InsertNewInRow { row, index: 0 }
        }
    }

    /// Where an orphan at `position` goes within `cell`
    pub fn find_chorph_slot(
        &self,
        text: &impl TextSource,
        cell: ChartLocation,
        position: TextPosition,
    ) -> Result<ChorphSlot, ChartError> {
        self.ensure_cell(cell)?;
        let word_groups = self.word_groups_in_cell(cell);
        if word_groups.is_empty() {
            return Ok(ChorphSlot::InsertNewInRow(self.index_for_words(cell)));
        }

        let mut previous: Option<PartId> = None;
        for wg in word_groups {
            let (begin, end) = self
                .store
                .part(wg)
                .and_then(|part| part.word_range())
                .ok_or(ChartError::NotAWordGroup(wg))?;
            let begin_pos = text
                .position(begin)
                .ok_or(ChartError::UnknownOccurrence(begin))?;
            let end_pos = text
                .position(end)
                .ok_or(ChartError::UnknownOccurrence(end))?;

            if position < begin_pos {
                if let Some(prev) = previous.filter(|p| !self.is_moved_text(*p)) {
                    return Ok(ChorphSlot::AppendToExisting(prev, WordGroupEnd::AtEnd));
                }
                if !self.is_moved_text(wg) {
                    return Ok(ChorphSlot::AppendToExisting(wg, WordGroupEnd::AtStart));
                }
                let index = self.part_index(wg).ok_or(ChartError::MissingPart(wg))?;
                return Ok(ChorphSlot::InsertNewInRow(index));
            }
            if position <= end_pos {
                return Ok(ChorphSlot::InsertIntoExisting);
            }
            previous = Some(wg);
        }

        match previous {
            Some(last) if !self.is_moved_text(last) => {
                Ok(ChorphSlot::AppendToExisting(last, WordGroupEnd::AtEnd))
            }
            Some(last) => {
                let index = self.part_index(last).ok_or(ChartError::MissingPart(last))?;
                Ok(ChorphSlot::InsertNewInRow(index + 1))
            }
            None => Ok(ChorphSlot::InsertNewInRow(self.index_for_words(cell))),
        }
    }

    /// Chart a run of consecutive occurrences into `column` at the end of
    /// the chart
    pub fn chart_words(
        &mut self,
        text: &impl TextSource,
        column: usize,
        occurrences: &[AnalysisOccurrence],
    ) -> Result<ChartLocation, ChartError> {
        self.ensure_text(text)?;
        self.column_id(column)?;
        let (first, last) = contiguous_run(text, occurrences)?;
        self.run_in_transaction("Undo Chart Words", "Redo Chart Words", |chart| {
            chart.append_words(text, column, first, last)
        })
    }

    /// Chart up to `count` of the next uncharted words into `column`.
    ///
    /// Stops at the first gap in the uncharted words. If the first of them
    /// is an orphan nothing is charted and the orphan is reported instead.
    pub fn chart_next_words(
        &mut self,
        text: &impl TextSource,
        column: usize,
        count: usize,
    ) -> Result<ChartOutcome, ChartError> {
        self.ensure_text(text)?;
        self.column_id(column)?;
        let batch = self.next_uncharted(text, count.max(1));
        let Some(&first) = batch.first() else {
            return Ok(ChartOutcome::NothingToChart);
        };
        if let OrphanStatus::Orphan { position } = self.classify(text, first)? {
            return Ok(ChartOutcome::Orphan {
                occurrence: first,
                position,
            });
        }

        let mut run = vec![first];
        for occ in batch.iter().skip(1) {
            if run.last().and_then(|prev| text.next(*prev)) != Some(*occ) {
                break;
            }
            run.push(*occ);
        }
        self.chart_words(text, column, &run).map(ChartOutcome::Charted)
    }

    /// Place an orphan run into a cell the user picked
    pub fn insert_chorph(
        &mut self,
        text: &impl TextSource,
        cell: ChartLocation,
        occurrences: &[AnalysisOccurrence],
    ) -> Result<ChartLocation, ChartError> {
        self.ensure_text(text)?;
        self.ensure_cell(cell)?;
        let (first, last) = contiguous_run(text, occurrences)?;
        let charted = self.charted_occurrences(text);
        if occurrences.iter().any(|occ| charted.contains(occ)) {
            return Err(ChartError::InvalidSelection);
        }
        let OrphanStatus::Orphan { position } = self.classify(text, first)? else {
            return Err(ChartError::InvalidSelection);
        };

        self.run_in_transaction("Undo Move Here", "Redo Move Here", |chart| {
            let cell = chart.remove_missing_marker(cell)?;
            let column = chart.column_id(cell.column)?;
            let slot = chart.find_chorph_slot(text, cell, position)?;
            log::debug!("placing orphan {first:?} in {cell:?} via {slot:?}");
            match slot {
                ChorphSlot::InsertNewInRow(index) => {
                    chart
                        .store
                        .create_word_group(cell.row, index, column, first, last)?;
                }
                ChorphSlot::AppendToExisting(wg, WordGroupEnd::AtEnd) => {
                    let (begin, _) = chart.word_range_of(wg)?;
                    chart.store.set_word_range(wg, begin, last)?;
                }
                ChorphSlot::AppendToExisting(wg, WordGroupEnd::AtStart) => {
                    let (_, end) = chart.word_range_of(wg)?;
                    chart.store.set_word_range(wg, first, end)?;
                }
                ChorphSlot::InsertIntoExisting => {}
            }
            Ok(cell)
        })
    }

    pub(crate) fn word_range_of(
        &self,
        word_group: PartId,
    ) -> Result<(AnalysisOccurrence, AnalysisOccurrence), ChartError> {
        self.store
            .part(word_group)
            .ok_or(ChartError::MissingPart(word_group))?
            .word_range()
            .ok_or(ChartError::NotAWordGroup(word_group))
    }

    fn append_words(
        &mut self,
        text: &impl TextSource,
        column: usize,
        first: AnalysisOccurrence,
        last: AnalysisOccurrence,
    ) -> Result<ChartLocation, ChartError> {
        let column_id = self.column_id(column)?;
        if let Some(&row) = self.store.rows().last() {
            self.remove_missing_marker(ChartLocation::new(row, column))?;
        }

        let slot = self.find_append_slot(column);
        log::debug!("appending {first:?}..{last:?} to column {column} via {slot:?}");
        match slot {
            AppendSlot::AppendToExisting(wg) => {
                let (begin, _) = self.word_range_of(wg)?;
                self.store.set_word_range(wg, begin, last)?;
                self.location_of(wg).ok_or(ChartError::MissingPart(wg))
            }
            AppendSlot::InsertNewInRow { row, index } => {
                self.store
                    .create_word_group(row, index, column_id, first, last)?;
                Ok(ChartLocation::new(row, column))
            }
            AppendSlot::MakeNewRow => {
                if let Some(&previous) = self.store.rows().last() {
                    self.close_row(text, previous);
                }
                let index = self.store.row_count();
                let row = self.store.create_row(index);
                self.store
                    .create_word_group(row, 0, column_id, first, last)?;
                self.renumber_rows(index.saturating_sub(1), false);
                Ok(ChartLocation::new(row, column))
            }
        }
    }

    /// Mark a finished row as ending its sentence or paragraph when its last
    /// word does
    fn close_row(&mut self, text: &impl TextSource, row: RowId) {
        let last_word = self
            .store
            .parts_of_row(row)
            .iter()
            .rev()
            .filter_map(|id| self.store.part(*id))
            .find_map(|part| part.word_range())
            .map(|(_, end)| end);
        let Some(last_word) = last_word else {
            return;
        };
        let ends_paragraph = text.ends_paragraph(last_word);
        let ends_sentence = ends_paragraph || text.ends_segment(last_word);
        if let Some(row) = self.store.row_mut(row) {
            row.end_sentence |= ends_sentence;
            row.end_paragraph |= ends_paragraph;
        }
    }
}
