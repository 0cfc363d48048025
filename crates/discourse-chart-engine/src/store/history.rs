use std::collections::VecDeque;

use super::ChartStore;

#[derive(Debug, Clone)]
struct HistoryEntry {
    undo_label: String,
    redo_label: String,
    before: ChartStore,
    after: ChartStore,
}

/// Undo/redo stack of whole-transaction store states.
///
/// Each entry is one transaction; undoing restores the state before it and
/// redoing the state after it. Recording a new entry clears the redo side.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    max_depth: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl UndoHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn record(
        &mut self,
        undo_label: &str,
        redo_label: &str,
        before: ChartStore,
        after: ChartStore,
    ) {
        self.redo.clear();
        self.undo.push_back(HistoryEntry {
            undo_label: undo_label.to_string(),
            redo_label: redo_label.to_string(),
            before,
            after,
        });
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }

    /// Pop the newest step, returning its undo label and the state to restore
    pub fn undo(&mut self) -> Option<(String, ChartStore)> {
        let entry = self.undo.pop_back()?;
        let restored = (entry.undo_label.clone(), entry.before.clone());
        self.redo.push(entry);
        Some(restored)
    }

    pub fn redo(&mut self) -> Option<(String, ChartStore)> {
        let entry = self.redo.pop()?;
        let restored = (entry.redo_label.clone(), entry.after.clone());
        self.undo.push_back(entry);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.back().map(|entry| entry.undo_label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|entry| entry.redo_label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
