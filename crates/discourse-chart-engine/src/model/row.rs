use serde::{Deserialize, Serialize};

use super::{PartId, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClauseType {
    #[default]
    Normal,
    Dependent,
    Speech,
    Song,
}

/// One clause of the chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    /// Sentence/clause label such as "3a"
    pub label: String,
    /// Cell parts in reading order
    pub cells: Vec<PartId>,
    pub end_sentence: bool,
    pub end_paragraph: bool,
    pub clause_type: ClauseType,
    pub start_dependent_clause_group: bool,
    pub end_dependent_clause_group: bool,
    pub notes: Option<String>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            label: String::new(),
            cells: Vec::new(),
            end_sentence: false,
            end_paragraph: false,
            clause_type: ClauseType::Normal,
            start_dependent_clause_group: false,
            end_dependent_clause_group: false,
            notes: None,
        }
    }

    /// A fresh row carrying every property of `self` except id and contents
    pub fn equivalent(&self, id: RowId) -> Self {
        Self {
            id,
            cells: Vec::new(),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
