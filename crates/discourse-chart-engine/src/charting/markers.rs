use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{CellPartKind, ChartLocation, ClauseType, ListItemRef, PartId, RowId};

impl Chart {
    /// Add or remove the "missing" marker of a cell; returns whether the
    /// cell has one afterwards
    pub fn toggle_missing_marker(&mut self, cell: ChartLocation) -> Result<bool, ChartError> {
        self.ensure_cell(cell)?;
        self.run_in_transaction("Undo Mark Missing", "Redo Mark Missing", |chart| {
            if let Some(marker) = chart.missing_marker_in(cell) {
                chart.store.remove_part(marker)?;
                return Ok(false);
            }
            let index = chart.cell_end_index(cell);
            let column = chart.column_id(cell.column)?;
            chart.store.create_tag(cell.row, index, column, None)?;
            Ok(true)
        })
    }

    /// Add a marker from a host-owned list (e.g. a grammatical feature)
    pub fn add_list_marker(
        &mut self,
        cell: ChartLocation,
        item: ListItemRef,
    ) -> Result<PartId, ChartError> {
        self.ensure_cell(cell)?;
        self.run_in_transaction("Undo Add Marker", "Redo Add Marker", |chart| {
            let cell = chart.remove_missing_marker(cell)?;
            let index = chart.cell_end_index(cell);
            let column = chart.column_id(cell.column)?;
            chart.store.create_tag(cell.row, index, column, Some(item))
        })
    }

    /// Embed `rows` as dependent, speech or song clauses at `cell`.
    ///
    /// The rows must be a run of adjacent rows that doesn't include the
    /// marker's own row.
    pub fn make_dependent_clauses(
        &mut self,
        cell: ChartLocation,
        rows: &[RowId],
        clause_type: ClauseType,
    ) -> Result<PartId, ChartError> {
        self.ensure_cell(cell)?;
        self.check_clause_rows(cell.row, rows, clause_type)?;

        self.run_in_transaction("Undo Make Clause", "Redo Make Clause", |chart| {
            let cell = chart.remove_missing_marker(cell)?;
            let index = chart.cell_end_index(cell);
            let column = chart.column_id(cell.column)?;
            let marker = chart
                .store
                .create_clause_marker(cell.row, index, column, rows.to_vec())?;

            let last = rows.len() - 1;
            for (i, id) in rows.iter().enumerate() {
                if let Some(row) = chart.store.row_mut(*id) {
                    row.clause_type = clause_type;
                    row.start_dependent_clause_group = i == 0;
                    row.end_dependent_clause_group = i == last;
                }
            }
            Ok(marker)
        })
    }

    /// Delete a clause marker, returning its rows to normal clauses
    pub fn remove_clause_marker(&mut self, marker: PartId) -> Result<(), ChartError> {
        let rows = match &self
            .store
            .part(marker)
            .ok_or(ChartError::MissingPart(marker))?
            .kind
        {
            CellPartKind::ClauseMarker { dependent_rows } => dependent_rows.clone(),
            _ => return Err(ChartError::WrongMarkerKind(marker)),
        };

        self.run_in_transaction("Undo Remove Clause", "Redo Remove Clause", |chart| {
            for id in &rows {
                if let Some(row) = chart.store.row_mut(*id) {
                    row.clause_type = ClauseType::Normal;
                    row.start_dependent_clause_group = false;
                    row.end_dependent_clause_group = false;
                }
            }
            chart.store.remove_part(marker)?;
            Ok(())
        })
    }

    /// Toggle whether a cell's contents span into the next (or previous) cell
    pub fn toggle_merge(&mut self, cell: ChartLocation, forward: bool) -> Result<(), ChartError> {
        self.ensure_cell(cell)?;
        let parts = self.parts_in_cell(cell);
        if parts.is_empty() {
            return Ok(());
        }
        let set = !parts.iter().all(|id| {
            self.store
                .part(*id)
                .is_some_and(|part| if forward { part.merges_after } else { part.merges_before })
        });

        self.run_in_transaction("Undo Merge Cells", "Redo Merge Cells", |chart| {
            for id in &parts {
                if forward {
                    chart.store.set_merge_flags(*id, false, set)?;
                } else {
                    chart.store.set_merge_flags(*id, set, false)?;
                }
            }
            Ok(())
        })
    }

    fn check_clause_rows(
        &self,
        marker_row: RowId,
        rows: &[RowId],
        clause_type: ClauseType,
    ) -> Result<(), ChartError> {
        if rows.is_empty() || clause_type == ClauseType::Normal || rows.contains(&marker_row) {
            return Err(ChartError::InvalidClauseRows);
        }
        let mut previous: Option<usize> = None;
        for id in rows {
            let index = self.store.row_index(*id).ok_or(ChartError::MissingRow(*id))?;
            if previous.is_some_and(|p| p + 1 != index) {
                return Err(ChartError::InvalidClauseRows);
            }
            previous = Some(index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ChartError;
    use crate::model::{CellPartKind, ClauseType, ListItemRef};
    use crate::test_support::{ChartBuilder, cell, row_id, sample_text};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_toggle_missing_marker_twice() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        let target = cell(&chart, 0, 1);

        assert!(chart.toggle_missing_marker(target).unwrap());
        assert_eq!(chart.parts_in_cell(target).len(), 1);
        assert!(!chart.toggle_missing_marker(target).unwrap());
        assert!(chart.is_cell_empty(target));
    }

    #[test]
    fn test_list_marker_replaces_missing_marker() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        let target = cell(&chart, 0, 2);
        chart.toggle_missing_marker(target).unwrap();

        let marker = chart.add_list_marker(target, ListItemRef(5)).unwrap();

        assert_eq!(chart.parts_in_cell(target), vec![marker]);
        assert_eq!(
            chart.part(marker).unwrap().kind,
            CellPartKind::Tag {
                target: Some(ListItemRef(5))
            }
        );
    }

    #[test]
    fn test_dependent_clause_sets_row_flags() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "barked")])
            .row(&[(0, "loudly")])
            .build();
        let rows = [row_id(&chart, 1), row_id(&chart, 2)];

        let marker = chart
            .make_dependent_clauses(cell(&chart, 0, 2), &rows, ClauseType::Speech)
            .unwrap();

        let first = chart.row(rows[0]).unwrap();
        let second = chart.row(rows[1]).unwrap();
        assert_eq!(first.clause_type, ClauseType::Speech);
        assert!(first.start_dependent_clause_group && !first.end_dependent_clause_group);
        assert!(second.end_dependent_clause_group && !second.start_dependent_clause_group);

        chart.remove_clause_marker(marker).unwrap();

        assert!(chart.part(marker).is_none());
        assert_eq!(chart.row(rows[0]).unwrap().clause_type, ClauseType::Normal);
        assert!(!chart.row(rows[1]).unwrap().end_dependent_clause_group);
    }

    #[test]
    fn test_dependent_clause_rows_must_be_adjacent() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "barked")])
            .row(&[(0, "loudly")])
            .build();
        let marker_cell = cell(&chart, 1, 2);

        assert_eq!(
            chart.make_dependent_clauses(
                marker_cell,
                &[row_id(&chart, 0), row_id(&chart, 2)],
                ClauseType::Dependent
            ),
            Err(ChartError::InvalidClauseRows)
        );
        assert_eq!(
            chart.make_dependent_clauses(marker_cell, &[row_id(&chart, 1)], ClauseType::Dependent),
            Err(ChartError::InvalidClauseRows)
        );
        assert!(!chart.can_undo());
    }

    #[test]
    fn test_toggle_merge_flags() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        let target = cell(&chart, 0, 0);
        let wg = chart.parts_in_cell(target)[0];

        chart.toggle_merge(target, true).unwrap();
        assert!(chart.part(wg).unwrap().merges_after);

        chart.toggle_merge(target, false).unwrap();
        let part = chart.part(wg).unwrap();
        assert!(part.merges_before && !part.merges_after);

        chart.toggle_merge(target, false).unwrap();
        assert!(!chart.part(wg).unwrap().merges_before);
    }
}
