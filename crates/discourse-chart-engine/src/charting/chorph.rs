//! # Chart Orphans
//!
//! A chart orphan ("ChOrph") is an uncharted word that comes before the last
//! charted word, typically because the base text was edited after charting.
//! It cannot be appended; instead the user picks a cell between the charted
//! words that surround it. This module finds those surrounding cells and the
//! region of cells that may legally receive the word.

use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{ChartLocation, PartId, RowId};
use crate::occurrence::{AnalysisOccurrence, TextPosition, TextSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrphanStatus {
    NotOrphan,
    Orphan { position: TextPosition },
}

/// The charted cells either side of an orphan; both are the same cell when
/// the orphan falls inside a word group's range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellBracket {
    pub preceding: Option<ChartLocation>,
    pub following: Option<ChartLocation>,
}

/// Cells that may receive an orphan, as row indices and column indices.
///
/// The region runs in reading order from `(row_lo, col_lo)` to
/// `(row_hi, col_hi)` inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub row_lo: usize,
    pub col_lo: usize,
    pub row_hi: usize,
    pub col_hi: usize,
    pub eligible_columns: Vec<usize>,
}

impl HighlightRegion {
    pub fn contains(&self, row_index: usize, column: usize) -> bool {
        (row_index, column) >= (self.row_lo, self.col_lo)
            && (row_index, column) <= (self.row_hi, self.col_hi)
    }

    pub fn is_column_eligible(&self, column: usize) -> bool {
        self.eligible_columns.contains(&column)
    }
}

/// Everything a host needs to offer "move here" targets for an orphan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChorphTargets {
    pub occurrence: AnalysisOccurrence,
    pub position: TextPosition,
    pub bracket: CellBracket,
    pub region: HighlightRegion,
}

/// Word groups of one cell, in row order
struct WordCell {
    column: usize,
    word_groups: Vec<PartId>,
}

impl Chart {
    /// Whether an uncharted occurrence is an orphan.
    ///
    /// An empty chart has no orphans; otherwise any occurrence that is not
    /// after the last charted word is one.
    pub fn classify(
        &self,
        text: &impl TextSource,
        occurrence: AnalysisOccurrence,
    ) -> Result<OrphanStatus, ChartError> {
        let position = text
            .position(occurrence)
            .ok_or(ChartError::UnknownOccurrence(occurrence))?;
        let Some(last) = self.last_charted_occurrence() else {
            return Ok(OrphanStatus::NotOrphan);
        };
        if text.is_after(occurrence, last) {
            return Ok(OrphanStatus::NotOrphan);
        }
        log::debug!("{occurrence:?} at {position:?} is a chart orphan");
        Ok(OrphanStatus::Orphan { position })
    }

    /// Find the charted cells immediately before and after `position`.
    ///
    /// Either side is `None` when the orphan comes before (or after) all
    /// charted words. Charts with out-of-order cells are searched as they
    /// are rather than rejected.
    pub fn bracket(
        &self,
        text: &impl TextSource,
        position: TextPosition,
    ) -> Result<CellBracket, ChartError> {
        let mut preceding_row = None;
        let mut following_row = None;
        let mut any_words = false;
        for row in self.store.rows() {
            let Some(start) = self.row_start(text, *row) else {
                continue;
            };
            any_words = true;
            if start < position {
                preceding_row = Some(*row);
                following_row = None;
            } else if following_row.is_none() {
                following_row = Some(*row);
            }
        }
        if !any_words {
            return Err(ChartError::EmptyChart);
        }

        let mut bracket = CellBracket::default();
        let mut in_row_follower = None;
        if let Some(row) = preceding_row {
            // Narrow forward while cells still start before the orphan
            let mut preceding_cell = None;
            for cell in self.word_cells(row) {
                if self.starts_before(text, cell.word_groups.first(), position) {
                    preceding_cell = Some(cell);
                } else {
                    in_row_follower = Some(ChartLocation::new(row, cell.column));
                    break;
                }
            }
            if let Some(cell) = preceding_cell {
                let location = ChartLocation::new(row, cell.column);
                bracket.preceding = Some(location);
                if self.falls_inside(text, &cell, position) {
                    bracket.following = Some(location);
                    return Ok(bracket);
                }
            }
        }

        bracket.following = match (in_row_follower, following_row) {
            (Some(location), _) => Some(location),
            (None, Some(row)) => self.narrow_backward(text, row, position),
            (None, None) => None,
        };
        Ok(bracket)
    }

    /// The cells an orphan may be placed in, walking from `preceding` to
    /// `following` in reading order.
    ///
    /// A missing `preceding` starts at the first cell of the chart; a
    /// missing `following` ends at the last cell of the starting row. A walk
    /// longer than one row width stops at the end of the starting row.
    pub fn highlight_region(
        &self,
        preceding: Option<ChartLocation>,
        following: Option<ChartLocation>,
    ) -> Result<HighlightRegion, ChartError> {
        let columns = self.template().column_count();
        if columns == 0 {
            return Err(ChartError::ColumnOutOfRange(0));
        }
        let last = columns - 1;

        let (row_lo, col_lo) = match preceding {
            Some(location) => (self.index_of_row(location.row)?, location.column.min(last)),
            None if self.row_count() == 0 => return Err(ChartError::EmptyChart),
            None => (0, 0),
        };
        let (mut row_hi, mut col_hi) = match following {
            Some(location) => (self.index_of_row(location.row)?, location.column.min(last)),
            None => (row_lo, last),
        };
        if (row_hi, col_hi) < (row_lo, col_lo) {
            (row_hi, col_hi) = (row_lo, col_lo);
        }

        let span = (row_hi * columns + col_hi) - (row_lo * columns + col_lo) + 1;
        if span > columns {
            row_hi = row_lo;
            col_hi = last;
        }

        let eligible_columns = if row_hi == row_lo {
            (col_lo..=col_hi).collect()
        } else {
            let span = (row_hi * columns + col_hi) - (row_lo * columns + col_lo) + 1;
            let mut visited: Vec<usize> = (0..span.min(columns))
                .map(|step| (col_lo + step) % columns)
                .collect();
            visited.sort_unstable();
            visited
        };

        Ok(HighlightRegion {
            row_lo,
            col_lo,
            row_hi,
            col_hi,
            eligible_columns,
        })
    }

    /// Classify, bracket and highlight in one read-only call; `None` when the
    /// occurrence is not an orphan
    pub fn chorph_targets(
        &self,
        text: &impl TextSource,
        occurrence: AnalysisOccurrence,
    ) -> Result<Option<ChorphTargets>, ChartError> {
        self.ensure_text(text)?;
        let OrphanStatus::Orphan { position } = self.classify(text, occurrence)? else {
            return Ok(None);
        };
        let bracket = self.bracket(text, position)?;
        let region = self.highlight_region(bracket.preceding, bracket.following)?;
        Ok(Some(ChorphTargets {
            occurrence,
            position,
            bracket,
            region,
        }))
    }

    fn index_of_row(&self, row: RowId) -> Result<usize, ChartError> {
        self.row_index(row).ok_or(ChartError::MissingRow(row))
    }

    /// Position of the first word of a row's first word group
    fn row_start(&self, text: &impl TextSource, row: RowId) -> Option<TextPosition> {
        let (begin, _) = self
            .store
            .parts_of_row(row)
            .iter()
            .filter_map(|id| self.store.part(*id))
            .find_map(|part| part.word_range())?;
        text.position(begin)
    }

    fn word_cells(&self, row: RowId) -> Vec<WordCell> {
        let mut cells: Vec<WordCell> = Vec::new();
        for id in self.store.parts_of_row(row) {
            let Some(part) = self.store.part(*id) else {
                continue;
            };
            if !part.is_word_group() {
                continue;
            }
            let column = self.column_index(part);
            match cells.last_mut() {
                Some(cell) if cell.column == column => cell.word_groups.push(*id),
                _ => cells.push(WordCell {
                    column,
                    word_groups: vec![*id],
                }),
            }
        }
        cells
    }

    fn group_bounds(
        &self,
        text: &impl TextSource,
        word_group: PartId,
    ) -> Option<(TextPosition, TextPosition)> {
        let (begin, end) = self.store.part(word_group)?.word_range()?;
        Some((text.position(begin)?, text.position(end)?))
    }

    fn starts_before(
        &self,
        text: &impl TextSource,
        word_group: Option<&PartId>,
        position: TextPosition,
    ) -> bool {
        word_group
            .and_then(|wg| self.group_bounds(text, *wg))
            .is_some_and(|(begin, _)| begin < position)
    }

    /// True if the last word group starting before `position` also ends at
    /// or after it
    fn falls_inside(
        &self,
        text: &impl TextSource,
        cell: &WordCell,
        position: TextPosition,
    ) -> bool {
        cell.word_groups
            .iter()
            .filter_map(|wg| self.group_bounds(text, *wg))
            .filter(|(begin, _)| *begin < position)
            .last()
            .is_some_and(|(_, end)| end >= position)
    }

    /// Earliest cell of `row` whose last word group starts at or after
    /// `position`, walking back from the row's last word cell
    fn narrow_backward(
        &self,
        text: &impl TextSource,
        row: RowId,
        position: TextPosition,
    ) -> Option<ChartLocation> {
        let cells = self.word_cells(row);
        let mut chosen = cells.last()?.column;
        for cell in cells.iter().rev().skip(1) {
            let starts_after = cell
                .word_groups
                .last()
                .and_then(|wg| self.group_bounds(text, *wg))
                .is_some_and(|(begin, _)| begin >= position);
            if !starts_after {
                break;
            }
            chosen = cell.column;
        }
        Some(ChartLocation::new(row, chosen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::model::ListItemRef;
    use crate::test_support::{ChartBuilder, cell, flat_template, sample_text, word};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_empty_chart_has_no_orphans() {
        let text = sample_text();
        let chart = Chart::new(flat_template(3), text.id());

        assert_eq!(
            chart.classify(&text, word(&text, "dog")).unwrap(),
            OrphanStatus::NotOrphan
        );
    }

    #[test]
    fn test_word_after_last_charted_is_not_orphan() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        assert_eq!(
            chart.classify(&text, word(&text, "barked")).unwrap(),
            OrphanStatus::NotOrphan
        );
    }

    #[test]
    fn test_skipped_word_is_orphan() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (2, "loudly")])
            .build();

        assert_eq!(
            chart.classify(&text, word(&text, "barked")).unwrap(),
            OrphanStatus::Orphan {
                position: TextPosition::new(0, 8)
            }
        );
    }

    #[test]
    fn test_bracket_within_row() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (2, "loudly")])
            .row(&[(0, "The cat"), (1, "ran away")])
            .build();

        let bracket = chart.bracket(&text, TextPosition::new(0, 8)).unwrap();

        assert_eq!(bracket.preceding, Some(cell(&chart, 0, 0)));
        assert_eq!(bracket.following, Some(cell(&chart, 0, 2)));
    }

    #[test]
    fn test_bracket_across_rows() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(1, "The cat")])
            .build();

        let bracket = chart.bracket(&text, TextPosition::new(0, 8)).unwrap();

        assert_eq!(bracket.preceding, Some(cell(&chart, 0, 0)));
        assert_eq!(bracket.following, Some(cell(&chart, 1, 1)));
    }

    #[test]
    fn test_bracket_before_everything() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3).row(&[(1, "dog barked")]).build();

        let bracket = chart.bracket(&text, TextPosition::new(0, 0)).unwrap();

        assert_eq!(bracket.preceding, None);
        assert_eq!(bracket.following, Some(cell(&chart, 0, 1)));
    }

    #[test]
    fn test_bracket_inside_word_group_collapses() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog barked")])
            .build();

        let bracket = chart.bracket(&text, TextPosition::new(0, 4)).unwrap();

        assert_eq!(bracket.preceding, Some(cell(&chart, 0, 0)));
        assert_eq!(bracket.following, Some(cell(&chart, 0, 0)));
    }

    #[test]
    fn test_bracket_after_everything_has_no_follower() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        let bracket = chart.bracket(&text, TextPosition::new(1, 0)).unwrap();

        assert_eq!(bracket.preceding, Some(cell(&chart, 0, 0)));
        assert_eq!(bracket.following, None);
    }

    #[test]
    fn test_bracket_on_empty_chart_fails() {
        let text = sample_text();
        let chart = Chart::new(flat_template(3), text.id());

        assert_eq!(
            chart.bracket(&text, TextPosition::new(0, 0)),
            Err(ChartError::EmptyChart)
        );
    }

    #[rstest]
    #[case::same_row((0, 0), Some((0, 2)), (0, 0, 0, 2), vec![0, 1, 2])]
    #[case::wraps_into_next_row((0, 1), Some((1, 0)), (0, 1, 1, 0), vec![0, 1, 2])]
    #[case::clipped_to_row_end((0, 1), Some((1, 2)), (0, 1, 0, 2), vec![1, 2])]
    #[case::no_follower((1, 1), None, (1, 1, 1, 2), vec![1, 2])]
    fn test_highlight_region(
        #[case] preceding: (usize, usize),
        #[case] following: Option<(usize, usize)>,
        #[case] bounds: (usize, usize, usize, usize),
        #[case] eligible: Vec<usize>,
    ) {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "The cat")])
            .build();

        let region = chart
            .highlight_region(
                Some(cell(&chart, preceding.0, preceding.1)),
                following.map(|(row, column)| cell(&chart, row, column)),
            )
            .unwrap();

        assert_eq!(
            (region.row_lo, region.col_lo, region.row_hi, region.col_hi),
            bounds
        );
        assert_eq!(region.eligible_columns, eligible);
    }

    #[test]
    fn test_highlight_region_from_chart_start() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3).row(&[(1, "dog")]).build();

        let region = chart
            .highlight_region(None, Some(cell(&chart, 0, 1)))
            .unwrap();

        assert_eq!(region.eligible_columns, vec![0, 1]);
        assert!(region.contains(0, 0));
        assert!(!region.contains(0, 2));
    }

    #[test]
    fn test_highlight_region_over_marker_rows_stays_within_one_row() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "The cat")])
            .build();
        let first = cell(&chart, 0, 0).row;
        chart.insert_row_below(first).unwrap();
        chart.insert_row_below(first).unwrap();
        for row in [1, 2] {
            chart
                .add_list_marker(cell(&chart, row, 1), ListItemRef(row as u64))
                .unwrap();
        }

        let region = chart
            .highlight_region(Some(cell(&chart, 0, 1)), Some(cell(&chart, 3, 0)))
            .unwrap();

        assert_eq!(
            (region.row_lo, region.col_lo, region.row_hi, region.col_hi),
            (0, 1, 0, 2)
        );
        assert_eq!(region.eligible_columns, vec![1, 2]);
        assert!(!region.contains(1, 0));
    }

    #[test]
    fn test_chorph_targets() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (2, "loudly")])
            .build();

        let targets = chart
            .chorph_targets(&text, word(&text, "barked"))
            .unwrap()
            .unwrap();

        assert_eq!(targets.bracket.preceding, Some(cell(&chart, 0, 0)));
        assert_eq!(targets.region.eligible_columns, vec![0, 1, 2]);
        assert_eq!(chart.chorph_targets(&text, word(&text, "cat")).unwrap(), None);
    }
}
