use serde::{Deserialize, Serialize};

use super::RowId;

/// A chart cell: a row and a leaf-column index into the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartLocation {
    pub row: RowId,
    pub column: usize,
}

impl ChartLocation {
    pub fn new(row: RowId, column: usize) -> Self {
        Self { row, column }
    }

    pub fn with_column(self, column: usize) -> Self {
        Self { column, ..self }
    }
}
