//! # Chart
//!
//! [`Chart`] ties a [`Template`] to the rows and parts in a [`ChartStore`]
//! and owns the undo history. Every public mutating operation runs inside
//! [`Chart::run_in_transaction`], so it is undone or redone as one step and
//! leaves the chart untouched when it fails.
//!
//! The editing algorithms live in [`crate::charting`] as further `impl Chart`
//! blocks; this module holds construction, transactions and the cell-level
//! read helpers they share.

pub mod repair;

use std::cmp::Ordering;

use discourse_chart_config::Config;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::charting::LastMove;
use crate::error::ChartError;
use crate::model::{CellPart, ChartLocation, ColumnId, PartId, Row, RowId, Template};
use crate::occurrence::{AnalysisOccurrence, TextId, TextSource};
use crate::store::{ChartStore, RowRemoval, UndoHistory};

pub use repair::OrderingViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartId(pub Uuid);

/// Engine-side view of the user configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSettings {
    pub uncharted_batch_size: usize,
    pub max_undo_depth: usize,
}

impl From<&Config> for ChartSettings {
    fn from(config: &Config) -> Self {
        Self {
            uncharted_batch_size: config.uncharted_batch_size.max(1),
            max_undo_depth: config.max_undo_depth,
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub struct Chart {
    id: ChartId,
    text: TextId,
    template: Template,
    pub(crate) store: ChartStore,
    history: UndoHistory,
    settings: ChartSettings,
    transaction_depth: usize,
    pub(crate) last_move: Option<LastMove>,
    repaired: bool,
}

impl Chart {
    /// An empty chart of `text` laid out by `template`
    pub fn new(template: Template, text: TextId) -> Self {
        Self::with_settings(template, text, ChartSettings::default())
    }

    pub fn with_settings(template: Template, text: TextId, settings: ChartSettings) -> Self {
        Self {
            id: ChartId(Uuid::new_v4()),
            text,
            template,
            store: ChartStore::new(),
            history: UndoHistory::new(settings.max_undo_depth),
            settings,
            transaction_depth: 0,
            last_move: None,
            repaired: false,
        }
    }

    pub fn from_config(config: &Config, text: TextId) -> Self {
        Self::with_settings(
            Template::from_config(&config.template),
            text,
            ChartSettings::from(config),
        )
    }

    /// Open a chart over existing content, repairing column damage on the way in
    pub fn with_store(
        template: Template,
        text: TextId,
        store: ChartStore,
        settings: ChartSettings,
    ) -> Self {
        let mut chart = Self::with_settings(template, text, settings);
        chart.store = store;
        chart.check_and_repair();
        chart
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn text_id(&self) -> TextId {
        self.text
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Swap the template; parts left on removed columns are repaired
    pub fn set_template(&mut self, template: Template) {
        self.template = template;
        self.history.clear();
        self.check_and_repair();
    }

    pub fn settings(&self) -> ChartSettings {
        self.settings
    }

    pub fn store(&self) -> &ChartStore {
        &self.store
    }

    pub fn rows(&self) -> &[RowId] {
        self.store.rows()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.store.row(id)
    }

    pub fn row_at(&self, index: usize) -> Option<&Row> {
        self.store.row_at(index)
    }

    pub fn row_index(&self, id: RowId) -> Option<usize> {
        self.store.row_index(id)
    }

    pub fn row_count(&self) -> usize {
        self.store.row_count()
    }

    pub fn part(&self, id: PartId) -> Option<&CellPart> {
        self.store.part(id)
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    // Transactions

    /// Run `f` as one undoable step.
    ///
    /// On `Err` the store is restored to its state before `f` ran. Nested
    /// calls join the outermost transaction.
    pub fn run_in_transaction<R>(
        &mut self,
        undo_label: &str,
        redo_label: &str,
        f: impl FnOnce(&mut Self) -> Result<R, ChartError>,
    ) -> Result<R, ChartError> {
        if self.transaction_depth > 0 {
            return f(self);
        }

        log::trace!("begin transaction '{undo_label}'");
        let before = self.store.clone();
        let last_move = self.last_move;
        self.transaction_depth += 1;
        let result = f(self);
        self.transaction_depth -= 1;

        match result {
            Ok(value) => {
                if self.store != before {
                    self.history
                        .record(undo_label, redo_label, before, self.store.clone());
                }
                log::trace!("commit transaction '{undo_label}'");
                Ok(value)
            }
            Err(err) => {
                self.store = before;
                self.last_move = last_move;
                log::debug!("rolled back '{undo_label}': {err}");
                Err(err)
            }
        }
    }

    /// Undo the newest transaction, returning its undo label. Forgets the
    /// last move.
    pub fn undo(&mut self) -> Option<String> {
        let (label, state) = self.history.undo()?;
        self.store = state;
        self.last_move = None;
        Some(label)
    }

    pub fn redo(&mut self) -> Option<String> {
        let (label, state) = self.history.redo()?;
        self.store = state;
        self.last_move = None;
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // Cells

    /// Column index of a part; parts on unknown columns read as column 0
    /// until [`check_and_repair`](Self::check_and_repair) fixes them
    pub fn column_index(&self, part: &CellPart) -> usize {
        self.template.index_of(part.column).unwrap_or(0)
    }

    pub fn column_id(&self, index: usize) -> Result<ColumnId, ChartError> {
        self.template
            .column_at(index)
            .map(|column| column.id)
            .ok_or(ChartError::ColumnOutOfRange(index))
    }

    pub(crate) fn ensure_cell(&self, cell: ChartLocation) -> Result<(), ChartError> {
        if !self.store.is_valid_row(cell.row) {
            return Err(ChartError::MissingRow(cell.row));
        }
        if cell.column >= self.template.column_count() {
            return Err(ChartError::ColumnOutOfRange(cell.column));
        }
        Ok(())
    }

    pub(crate) fn ensure_text(&self, text: &impl TextSource) -> Result<(), ChartError> {
        if text.id() != self.text {
            return Err(ChartError::WrongText {
                expected: self.text,
                actual: text.id(),
            });
        }
        Ok(())
    }

    /// Parts of a cell in reading order
    pub fn parts_in_cell(&self, cell: ChartLocation) -> Vec<PartId> {
        self.store
            .parts_of_row(cell.row)
            .iter()
            .copied()
            .filter(|id| {
                self.store
                    .part(*id)
                    .is_some_and(|part| self.column_index(part) == cell.column)
            })
            .collect()
    }

    pub fn word_groups_in_cell(&self, cell: ChartLocation) -> Vec<PartId> {
        self.parts_in_cell(cell)
            .into_iter()
            .filter(|id| self.store.part(*id).is_some_and(CellPart::is_word_group))
            .collect()
    }

    pub fn is_cell_empty(&self, cell: ChartLocation) -> bool {
        self.parts_in_cell(cell).is_empty()
    }

    pub fn is_moved_text(&self, word_group: PartId) -> bool {
        self.store.is_moved_text(word_group)
    }

    pub(crate) fn missing_marker_in(&self, cell: ChartLocation) -> Option<PartId> {
        self.parts_in_cell(cell).into_iter().find(|id| {
            self.store
                .part(*id)
                .is_some_and(CellPart::is_missing_marker)
        })
    }

    pub fn location_of(&self, part: PartId) -> Option<ChartLocation> {
        let part = self.store.part(part)?;
        Some(ChartLocation::new(part.row, self.column_index(part)))
    }

    pub(crate) fn part_index(&self, part: PartId) -> Option<usize> {
        let row = self.store.part(part)?.row;
        self.store.parts_of_row(row).iter().position(|p| *p == part)
    }

    /// Chart order: by row index, then by column
    pub fn compare_locations(&self, a: ChartLocation, b: ChartLocation) -> Option<Ordering> {
        let row_a = self.store.row_index(a.row)?;
        let row_b = self.store.row_index(b.row)?;
        Some(row_a.cmp(&row_b).then(a.column.cmp(&b.column)))
    }

    /// The adjacent cell, wrapping across row ends
    pub fn neighbor(&self, cell: ChartLocation, forward: bool) -> Option<ChartLocation> {
        let last = self.template.last_column();
        let row_index = self.store.row_index(cell.row)?;
        if forward {
            if cell.column < last {
                return Some(cell.with_column(cell.column + 1));
            }
            let next = *self.store.rows().get(row_index + 1)?;
            Some(ChartLocation::new(next, 0))
        } else {
            if cell.column > 0 {
                return Some(cell.with_column(cell.column - 1));
            }
            let previous = *self.store.rows().get(row_index.checked_sub(1)?)?;
            Some(ChartLocation::new(previous, last))
        }
    }

    /// Index of the first part of the row at or after the cell's column
    pub(crate) fn cell_start_index(&self, cell: ChartLocation) -> usize {
        self.first_part_index(cell.row, |chart, part| {
            chart.column_index(part) >= cell.column
        })
    }

    /// Index just past the cell's last part
    pub(crate) fn cell_end_index(&self, cell: ChartLocation) -> usize {
        self.first_part_index(cell.row, |chart, part| {
            chart.column_index(part) > cell.column
        })
    }

    /// Where new word content goes in a cell holding no word group: after
    /// preposed moved-text markers, before any other part of the cell
    pub(crate) fn index_for_words(&self, cell: ChartLocation) -> usize {
        self.first_part_index(cell.row, |chart, part| {
            let column = chart.column_index(part);
            column > cell.column || (column == cell.column && !part.is_preposed_marker())
        })
    }

    fn first_part_index(&self, row: RowId, stop: impl Fn(&Self, &CellPart) -> bool) -> usize {
        let parts = self.store.parts_of_row(row);
        parts
            .iter()
            .position(|id| self.store.part(*id).is_some_and(|part| stop(self, part)))
            .unwrap_or(parts.len())
    }

    /// Occurrences covered by a word group
    pub fn word_group_occurrences(
        &self,
        text: &impl TextSource,
        word_group: PartId,
    ) -> Vec<AnalysisOccurrence> {
        self.store
            .part(word_group)
            .and_then(CellPart::word_range)
            .map(|(begin, end)| text.occurrences_between(begin, end))
            .unwrap_or_default()
    }

    /// Surface words of every word group in a cell, in order
    pub fn cell_words(&self, text: &impl TextSource, cell: ChartLocation) -> Vec<String> {
        self.word_groups_in_cell(cell)
            .into_iter()
            .flat_map(|wg| self.word_group_occurrences(text, wg))
            .filter_map(|occ| text.word(occ))
            .collect()
    }

    /// Surface words of a whole row, cell by cell
    pub fn row_words(&self, text: &impl TextSource, row: RowId) -> Vec<String> {
        self.store
            .parts_of_row(row)
            .iter()
            .filter_map(|id| self.store.part(*id))
            .filter_map(CellPart::word_range)
            .flat_map(|(begin, end)| text.occurrences_between(begin, end))
            .filter_map(|occ| text.word(occ))
            .collect()
    }

    /// Remove a part that sits where new content is about to go.
    ///
    /// If the removal deletes the row, an equivalent row is put back at the
    /// same position; the returned id is the row to add content to.
    pub(crate) fn remove_part_keeping_row(&mut self, part: PartId) -> Result<RowId, ChartError> {
        let row_id = self.store.part(part).ok_or(ChartError::MissingPart(part))?.row;
        let snapshot = self
            .store
            .row(row_id)
            .cloned()
            .ok_or(ChartError::MissingRow(row_id))?;
        let index = self.store.row_index(row_id).unwrap_or(self.store.row_count());

        match self.store.remove_part(part)? {
            RowRemoval::RowStillExists => Ok(row_id),
            RowRemoval::RowDeleted => {
                let index = index.min(self.store.row_count());
                let recreated = self.store.recreate_row(&snapshot, index);
                log::debug!("recreated {row_id} as {recreated} at index {index}");
                Ok(recreated)
            }
        }
    }

    /// Clear the "missing" marker from a cell before content goes in
    pub(crate) fn remove_missing_marker(
        &mut self,
        cell: ChartLocation,
    ) -> Result<ChartLocation, ChartError> {
        match self.missing_marker_in(cell) {
            Some(marker) => {
                let row = self.remove_part_keeping_row(marker)?;
                Ok(ChartLocation::new(row, cell.column))
            }
            None => Ok(cell),
        }
    }

    pub fn take_repair_notice(&mut self) -> bool {
        std::mem::take(&mut self.repaired)
    }

    pub(crate) fn flag_repaired(&mut self) {
        self.repaired = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ChartBuilder, sample_text};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failed_transaction_rolls_back() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        let before = chart.store().clone();

        let result: Result<(), ChartError> =
            chart.run_in_transaction("Undo Test", "Redo Test", |chart| {
                let row = chart.rows()[0];
                chart.store.create_row(1);
                chart.store.row_mut(row).unwrap().end_sentence = true;
                Err(ChartError::InvalidSelection)
            });

        assert_eq!(result, Err(ChartError::InvalidSelection));
        assert_eq!(chart.store(), &before);
        assert!(!chart.can_undo());
    }

    #[test]
    fn test_transaction_undo_redo() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        chart
            .run_in_transaction("Undo Add Row", "Redo Add Row", |chart| {
                chart.store.create_row(1);
                Ok(())
            })
            .unwrap();
        assert_eq!(chart.row_count(), 2);

        assert_eq!(chart.undo().as_deref(), Some("Undo Add Row"));
        assert_eq!(chart.row_count(), 1);
        assert_eq!(chart.redo().as_deref(), Some("Redo Add Row"));
        assert_eq!(chart.row_count(), 2);
    }

    #[test]
    fn test_unchanged_transaction_records_nothing() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        chart
            .run_in_transaction("Undo Nothing", "Redo Nothing", |_| Ok(()))
            .unwrap();

        assert!(!chart.can_undo());
    }

    #[test]
    fn test_neighbor_wraps_rows() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(1, "barked")])
            .build();
        let first = chart.rows()[0];
        let second = chart.rows()[1];

        assert_eq!(
            chart.neighbor(ChartLocation::new(first, 2), true),
            Some(ChartLocation::new(second, 0))
        );
        assert_eq!(
            chart.neighbor(ChartLocation::new(second, 0), false),
            Some(ChartLocation::new(first, 2))
        );
        assert_eq!(chart.neighbor(ChartLocation::new(first, 0), false), None);
        assert_eq!(chart.neighbor(ChartLocation::new(second, 2), true), None);
    }

    #[test]
    fn test_cell_words_and_compare_locations() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (1, "barked")])
            .build();
        let row = chart.rows()[0];

        assert_eq!(chart.cell_words(&text, ChartLocation::new(row, 0)), vec!["The", "dog"]);
        assert_eq!(chart.row_words(&text, row), vec!["The", "dog", "barked"]);
        assert_eq!(
            chart.compare_locations(ChartLocation::new(row, 0), ChartLocation::new(row, 1)),
            Some(Ordering::Less)
        );
    }
}
