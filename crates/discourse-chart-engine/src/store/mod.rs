//! # Entity Store
//!
//! In-memory home of a chart's rows and cell parts. It behaves like the
//! persistent object store the chart algorithms are written against:
//!
//! - factories create rows and parts at a given position
//! - removing the last part of a row deletes the row, reported as
//!   [`RowRemoval::RowDeleted`] rather than by handing back a dead id
//! - deleting a word group deletes the moved-text marker pointing at it
//! - deleting a row scrubs it from clause markers; an emptied clause marker
//!   is deleted in turn
//!
//! Every cascade can remove rows other than the one being edited, so callers
//! re-check ids with [`ChartStore::is_valid_row`] after a removal.

pub mod history;

use std::collections::HashMap;

use crate::error::ChartError;
use crate::model::{CellPart, CellPartKind, ColumnId, ListItemRef, PartId, Row, RowId};
use crate::occurrence::AnalysisOccurrence;

pub use history::UndoHistory;

/// Whether the owning row survived a removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRemoval {
    RowStillExists,
    RowDeleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartStore {
    rows: Vec<RowId>,
    row_data: HashMap<RowId, Row>,
    parts: HashMap<PartId, CellPart>,
    /// Word group -> the moved-text marker that refers to it
    moved_markers: HashMap<PartId, PartId>,
    next_id: u64,
}

impl ChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // Rows

    /// Row ids in chart order
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.row_data.get(&id)
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.row_data.get_mut(&id)
    }

    pub fn row_at(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).and_then(|id| self.row_data.get(id))
    }

    pub fn row_index(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|row| *row == id)
    }

    pub fn is_valid_row(&self, id: RowId) -> bool {
        self.row_data.contains_key(&id)
    }

    /// Create an empty row at `index` (clamped to the end)
    pub fn create_row(&mut self, index: usize) -> RowId {
        let id = RowId(self.allocate());
        self.place_row(Row::new(id), index);
        id
    }

    /// Put back a row equivalent to `template` after it was deleted.
    ///
    /// Reuses the template's id when it is free, so locations naming the old
    /// row stay usable.
    pub fn recreate_row(&mut self, template: &Row, index: usize) -> RowId {
        let id = if self.is_valid_row(template.id) {
            RowId(self.allocate())
        } else {
            template.id
        };
        self.place_row(template.equivalent(id), index);
        id
    }

    fn place_row(&mut self, row: Row, index: usize) {
        let index = index.min(self.rows.len());
        self.rows.insert(index, row.id);
        self.row_data.insert(row.id, row);
    }

    /// Delete a row with all its parts
    pub fn delete_row(&mut self, id: RowId) -> Result<(), ChartError> {
        let index = self.row_index(id).ok_or(ChartError::MissingRow(id))?;
        self.rows.remove(index);
        let Some(row) = self.row_data.remove(&id) else {
            return Ok(());
        };
        for part_id in row.cells {
            if let Some(part) = self.parts.remove(&part_id) {
                self.forget_part(&part);
            }
        }
        self.scrub_clause_references(id);
        Ok(())
    }

    fn scrub_clause_references(&mut self, row: RowId) {
        let referring: Vec<PartId> = self
            .parts
            .values()
            .filter(|part| match &part.kind {
                CellPartKind::ClauseMarker { dependent_rows } => dependent_rows.contains(&row),
                _ => false,
            })
            .map(|part| part.id)
            .collect();

        for marker in referring {
            let emptied = match self.parts.get_mut(&marker).map(|part| &mut part.kind) {
                Some(CellPartKind::ClauseMarker { dependent_rows }) => {
                    dependent_rows.retain(|r| *r != row);
                    dependent_rows.is_empty()
                }
                _ => false,
            };
            if emptied {
                let _ = self.remove_part(marker);
            }
        }
    }

    // Parts

    pub fn part(&self, id: PartId) -> Option<&CellPart> {
        self.parts.get(&id)
    }

    pub fn is_valid_part(&self, id: PartId) -> bool {
        self.parts.contains_key(&id)
    }

    /// Part ids of a row in reading order; empty for an unknown row
    pub fn parts_of_row(&self, row: RowId) -> &[PartId] {
        self.row_data
            .get(&row)
            .map(|row| row.cells.as_slice())
            .unwrap_or(&[])
    }

    /// Every part, row by row in chart order
    pub fn parts_in_order(&self) -> impl Iterator<Item = &CellPart> {
        self.rows
            .iter()
            .filter_map(|row| self.row_data.get(row))
            .flat_map(|row| row.cells.iter())
            .filter_map(|id| self.parts.get(id))
    }

    /// The moved-text marker pointing at a word group, if any
    pub fn moved_marker_for(&self, word_group: PartId) -> Option<PartId> {
        self.moved_markers.get(&word_group).copied()
    }

    pub fn is_moved_text(&self, word_group: PartId) -> bool {
        self.moved_markers.contains_key(&word_group)
    }

    fn insert_part(
        &mut self,
        row: RowId,
        index: usize,
        column: ColumnId,
        kind: CellPartKind,
    ) -> Result<PartId, ChartError> {
        if !self.is_valid_row(row) {
            return Err(ChartError::MissingRow(row));
        }
        let id = PartId(self.allocate());
        if let CellPartKind::MovedTextMarker { target, .. } = kind {
            self.moved_markers.insert(target, id);
        }
        self.parts.insert(id, CellPart::new(id, row, column, kind));
        if let Some(row) = self.row_data.get_mut(&row) {
            let index = index.min(row.cells.len());
            row.cells.insert(index, id);
        }
        Ok(id)
    }

    pub fn create_word_group(
        &mut self,
        row: RowId,
        index: usize,
        column: ColumnId,
        begin: AnalysisOccurrence,
        end: AnalysisOccurrence,
    ) -> Result<PartId, ChartError> {
        self.insert_part(row, index, column, CellPartKind::WordGroup { begin, end })
    }

    pub fn create_tag(
        &mut self,
        row: RowId,
        index: usize,
        column: ColumnId,
        target: Option<ListItemRef>,
    ) -> Result<PartId, ChartError> {
        self.insert_part(row, index, column, CellPartKind::Tag { target })
    }

    pub fn create_clause_marker(
        &mut self,
        row: RowId,
        index: usize,
        column: ColumnId,
        dependent_rows: Vec<RowId>,
    ) -> Result<PartId, ChartError> {
        self.insert_part(
            row,
            index,
            column,
            CellPartKind::ClauseMarker { dependent_rows },
        )
    }

    pub fn create_moved_marker(
        &mut self,
        row: RowId,
        index: usize,
        column: ColumnId,
        target: PartId,
        preposed: bool,
    ) -> Result<PartId, ChartError> {
        match self.parts.get(&target) {
            None => return Err(ChartError::MissingPart(target)),
            Some(part) if !part.is_word_group() => return Err(ChartError::NotAWordGroup(target)),
            _ => {}
        }
        if self.is_moved_text(target) {
            return Err(ChartError::AlreadyMoved(target));
        }
        self.insert_part(
            row,
            index,
            column,
            CellPartKind::MovedTextMarker { target, preposed },
        )
    }

    /// Delete a part, cascading as described in the module docs
    pub fn remove_part(&mut self, id: PartId) -> Result<RowRemoval, ChartError> {
        let part = self.parts.remove(&id).ok_or(ChartError::MissingPart(id))?;
        let row_id = part.row;
        if let Some(row) = self.row_data.get_mut(&row_id) {
            row.cells.retain(|p| *p != id);
        }
        self.forget_part(&part);

        match self.row_data.get(&row_id) {
            None => Ok(RowRemoval::RowDeleted),
            Some(row) if row.cells.is_empty() => {
                self.delete_row(row_id)?;
                Ok(RowRemoval::RowDeleted)
            }
            Some(_) => Ok(RowRemoval::RowStillExists),
        }
    }

    /// Index maintenance and cascades for a part that has left the store
    fn forget_part(&mut self, part: &CellPart) {
        match part.kind {
            CellPartKind::MovedTextMarker { target, .. } => {
                if self.moved_markers.get(&target) == Some(&part.id) {
                    self.moved_markers.remove(&target);
                }
            }
            CellPartKind::WordGroup { .. } => {
                if let Some(marker) = self.moved_markers.remove(&part.id)
                    && self.parts.contains_key(&marker)
                {
                    let _ = self.remove_part(marker);
                }
            }
            _ => {}
        }
    }

    /// Re-home a part to `dst_index` of `dst_row`.
    ///
    /// `dst_index` is a position in the destination list as it stands before
    /// the move. The source row is deleted if the move empties it.
    pub fn move_part(
        &mut self,
        id: PartId,
        dst_row: RowId,
        dst_index: usize,
    ) -> Result<RowRemoval, ChartError> {
        let src_row = self.part(id).ok_or(ChartError::MissingPart(id))?.row;
        if !self.is_valid_row(dst_row) {
            return Err(ChartError::MissingRow(dst_row));
        }
        let src_index = self
            .parts_of_row(src_row)
            .iter()
            .position(|p| *p == id)
            .ok_or(ChartError::MissingPart(id))?;

        let mut index = dst_index;
        if src_row == dst_row && src_index < dst_index {
            index -= 1;
        }
        if let Some(row) = self.row_data.get_mut(&src_row) {
            row.cells.remove(src_index);
        }
        if let Some(row) = self.row_data.get_mut(&dst_row) {
            let index = index.min(row.cells.len());
            row.cells.insert(index, id);
        }
        if let Some(part) = self.parts.get_mut(&id) {
            part.row = dst_row;
        }

        let src_emptied = self
            .row(src_row)
            .is_some_and(|row| row.cells.is_empty());
        if src_emptied {
            self.delete_row(src_row)?;
            return Ok(RowRemoval::RowDeleted);
        }
        Ok(RowRemoval::RowStillExists)
    }

    /// Move several parts, keeping their relative order, to start at `dst_index`
    pub fn move_range(
        &mut self,
        ids: &[PartId],
        dst_row: RowId,
        dst_index: usize,
    ) -> Result<RowRemoval, ChartError> {
        let mut outcome = RowRemoval::RowStillExists;
        let mut index = dst_index;
        for id in ids {
            if self.move_part(*id, dst_row, index)? == RowRemoval::RowDeleted {
                outcome = RowRemoval::RowDeleted;
            }
            // The next part goes right after the one just placed
            let placed = self
                .parts_of_row(dst_row)
                .iter()
                .position(|p| p == id)
                .unwrap_or(index);
            index = placed + 1;
        }
        Ok(outcome)
    }

    pub fn set_word_range(
        &mut self,
        id: PartId,
        begin: AnalysisOccurrence,
        end: AnalysisOccurrence,
    ) -> Result<(), ChartError> {
        let part = self.parts.get_mut(&id).ok_or(ChartError::MissingPart(id))?;
        match &mut part.kind {
            CellPartKind::WordGroup { begin: b, end: e } => {
                *b = begin;
                *e = end;
                Ok(())
            }
            _ => Err(ChartError::NotAWordGroup(id)),
        }
    }

    pub fn set_part_column(&mut self, id: PartId, column: ColumnId) -> Result<(), ChartError> {
        let part = self.parts.get_mut(&id).ok_or(ChartError::MissingPart(id))?;
        part.column = column;
        Ok(())
    }

    /// Set the cell-spanning hints; at most one of them may be set
    pub fn set_merge_flags(
        &mut self,
        id: PartId,
        merges_before: bool,
        merges_after: bool,
    ) -> Result<(), ChartError> {
        let part = self.parts.get_mut(&id).ok_or(ChartError::MissingPart(id))?;
        part.merges_before = merges_before && !merges_after;
        part.merges_after = merges_after;
        Ok(())
    }
}
