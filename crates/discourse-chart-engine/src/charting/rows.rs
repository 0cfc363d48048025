use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{Row, RowId};

impl Chart {
    /// Insert an empty clause after `row`.
    ///
    /// Sentence and paragraph ends move down to the new row, so it finishes
    /// whatever `row` finished.
    pub fn insert_row_below(&mut self, row: RowId) -> Result<RowId, ChartError> {
        let index = self.row_index(row).ok_or(ChartError::MissingRow(row))?;
        self.run_in_transaction("Undo Insert Row", "Redo Insert Row", |chart| {
            let inserted = chart.store.create_row(index + 1);
            let (end_sentence, end_paragraph) = chart
                .store
                .row_mut(row)
                .map(|old| {
                    (
                        std::mem::take(&mut old.end_sentence),
                        std::mem::take(&mut old.end_paragraph),
                    )
                })
                .unwrap_or_default();
            if let Some(new) = chart.store.row_mut(inserted) {
                new.end_sentence = end_sentence;
                new.end_paragraph = end_paragraph;
            }
            chart.renumber_rows(index, false);
            Ok(inserted)
        })
    }

    /// Delete the row at `row_index` and every row after it
    pub fn clear_chart_from(&mut self, row_index: usize) -> Result<(), ChartError> {
        if row_index >= self.row_count() {
            return Ok(());
        }
        self.run_in_transaction("Undo Clear Chart", "Redo Clear Chart", |chart| {
            let doomed: Vec<RowId> = chart.store.rows()[row_index..].to_vec();
            for row in doomed.into_iter().rev() {
                // Earlier deletions may have taken this row with them
                if chart.store.is_valid_row(row) {
                    chart.store.delete_row(row)?;
                }
            }
            chart.renumber_rows(row_index.saturating_sub(1), false);
            Ok(())
        })
    }

    pub fn set_end_sentence(&mut self, row: RowId, value: bool) -> Result<(), ChartError> {
        let index = self.row_index(row).ok_or(ChartError::MissingRow(row))?;
        self.run_in_transaction("Undo End Sentence", "Redo End Sentence", |chart| {
            chart.edit_row(row, |r| {
                r.end_sentence = value;
                if !value {
                    r.end_paragraph = false;
                }
            })?;
            chart.renumber_rows(index, false);
            Ok(())
        })
    }

    /// A paragraph end is also a sentence end
    pub fn set_end_paragraph(&mut self, row: RowId, value: bool) -> Result<(), ChartError> {
        let index = self.row_index(row).ok_or(ChartError::MissingRow(row))?;
        self.run_in_transaction("Undo End Paragraph", "Redo End Paragraph", |chart| {
            chart.edit_row(row, |r| {
                r.end_paragraph = value;
                r.end_sentence |= value;
            })?;
            chart.renumber_rows(index, false);
            Ok(())
        })
    }

    pub fn set_notes(&mut self, row: RowId, notes: Option<String>) -> Result<(), ChartError> {
        let notes = notes.filter(|n| !n.trim().is_empty());
        self.run_in_transaction("Undo Edit Notes", "Redo Edit Notes", |chart| {
            chart.edit_row(row, |r| r.notes = notes)
        })
    }

    fn edit_row(&mut self, row: RowId, edit: impl FnOnce(&mut Row)) -> Result<(), ChartError> {
        let row = self.store.row_mut(row).ok_or(ChartError::MissingRow(row))?;
        edit(row);
        Ok(())
    }
}
