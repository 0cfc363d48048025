use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::ChartError;
use crate::model::{ChartLocation, PartId};
use crate::occurrence::TextSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    Cell,
    Word,
}

/// The destination of the last move, so it can be repeated from there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub cell: ChartLocation,
    pub forward: bool,
    pub kind: MoveKind,
}

impl Chart {
    /// Merge the word groups of `src` into `dst`.
    ///
    /// `forward` means `dst` follows `src` in reading order: src's last
    /// word group joins dst's first one. Word groups marked as moved text
    /// are never joined, only relocated.
    pub fn merge_cell(
        &mut self,
        src: ChartLocation,
        dst: ChartLocation,
        forward: bool,
    ) -> Result<(), ChartError> {
        self.ensure_cell(src)?;
        self.ensure_cell(dst)?;
        if src == dst {
            return Ok(());
        }
        self.run_in_transaction("Undo Move Cell", "Redo Move Cell", |chart| {
            if let Some(used) = chart.merge_cell_contents(src, dst, forward)? {
                chart.last_move = Some(LastMove {
                    cell: used,
                    forward,
                    kind: MoveKind::Cell,
                });
            }
            Ok(())
        })
    }

    /// Merge a cell into its neighbour; at either end of the chart nothing happens
    pub fn move_cell(&mut self, src: ChartLocation, forward: bool) -> Result<(), ChartError> {
        self.ensure_cell(src)?;
        match self.neighbor(src, forward) {
            Some(dst) => self.merge_cell(src, dst, forward),
            None => Ok(()),
        }
    }

    /// Move one boundary word of `src` into the neighbouring cell
    pub fn move_word(
        &mut self,
        text: &impl TextSource,
        src: ChartLocation,
        forward: bool,
    ) -> Result<(), ChartError> {
        self.ensure_text(text)?;
        self.ensure_cell(src)?;
        let groups = self.word_groups_in_cell(src);
        let edge = if forward { groups.last() } else { groups.first() };
        let Some(&wg) = edge else {
            return Ok(());
        };
        let Some(dst) = self.neighbor(src, forward) else {
            return Ok(());
        };
        let occurrences = self.word_group_occurrences(text, wg);
        let (Some(&first), Some(&last)) = (occurrences.first(), occurrences.last()) else {
            let (begin, _) = self.word_range_of(wg)?;
            return Err(ChartError::UnknownOccurrence(begin));
        };

        self.run_in_transaction("Undo Move Word", "Redo Move Word", |chart| {
            if groups.len() == 1 && occurrences.len() == 1 {
                // The whole cell is one word: same as moving the cell
                if let Some(used) = chart.merge_cell_contents(src, dst, forward)? {
                    chart.last_move = Some(LastMove {
                        cell: used,
                        forward,
                        kind: MoveKind::Word,
                    });
                }
                return Ok(());
            }

            let rows_before = chart.store.row_count();
            let renumber_from = chart.first_row_index(src, dst);
            let moving = if forward { last } else { first };
            let dst = chart.remove_missing_marker(dst)?;
            let column = chart.column_id(dst.column)?;
            let dst_groups = chart.word_groups_in_cell(dst);
            let dst_edge = if forward {
                dst_groups.first()
            } else {
                dst_groups.last()
            };

            match dst_edge.copied().filter(|id| !chart.is_moved_text(*id)) {
                Some(target) => {
                    let (begin, end) = chart.word_range_of(target)?;
                    if forward {
                        chart.store.set_word_range(target, moving, end)?;
                    } else {
                        chart.store.set_word_range(target, begin, moving)?;
                    }
                }
                None => {
                    let index = match dst_edge {
                        Some(id) if forward => chart.part_index(*id),
                        Some(id) => chart.part_index(*id).map(|i| i + 1),
                        None => None,
                    }
                    .unwrap_or_else(|| chart.index_for_words(dst));
                    chart
                        .store
                        .create_word_group(dst.row, index, column, moving, moving)?;
                }
            }

            match occurrences.len() {
                1 => {
                    chart.store.remove_part(wg)?;
                }
                n if forward => chart.store.set_word_range(wg, first, occurrences[n - 2])?,
                _ => chart.store.set_word_range(wg, occurrences[1], last)?,
            }

            if chart.store.row_count() < rows_before {
                chart.renumber_rows(renumber_from, false);
            }
            chart.last_move = Some(LastMove {
                cell: dst,
                forward,
                kind: MoveKind::Word,
            });
            Ok(())
        })
    }

    /// Repeat the last cell or word move from where it landed.
    ///
    /// Returns `false` when there is nothing to repeat.
    pub fn repeat_last_move(&mut self, text: &impl TextSource) -> Result<bool, ChartError> {
        let Some(last) = self.last_move else {
            return Ok(false);
        };
        if !self.store.is_valid_row(last.cell.row) {
            self.last_move = None;
            return Ok(false);
        }
        match last.kind {
            MoveKind::Cell => self.move_cell(last.cell, last.forward)?,
            MoveKind::Word => self.move_word(text, last.cell, last.forward)?,
        }
        Ok(true)
    }

    /// Returns the cell the words ended up in, or `None` if `src` had none
    fn merge_cell_contents(
        &mut self,
        src: ChartLocation,
        dst: ChartLocation,
        forward: bool,
    ) -> Result<Option<ChartLocation>, ChartError> {
        if self.word_groups_in_cell(src).is_empty() {
            return Ok(None);
        }
        let rows_before = self.store.row_count();
        let renumber_from = self.first_row_index(src, dst);

        let mut dst = self.remove_missing_marker(dst)?;

        // A marker in dst for moved text in src means nothing once they merge
        let src_groups = self.word_groups_in_cell(src);
        let redundant: Vec<PartId> = self
            .parts_in_cell(dst)
            .into_iter()
            .filter(|id| {
                self.store
                    .part(*id)
                    .and_then(|part| part.moved_text_target())
                    .is_some_and(|target| src_groups.contains(&target))
            })
            .collect();
        if !redundant.is_empty() {
            for marker in redundant {
                dst.row = self.remove_part_keeping_row(marker)?;
            }
            self.coalesce_cell(src)?;
        }

        let src_groups = self.word_groups_in_cell(src);
        let dst_groups = self.word_groups_in_cell(dst);
        let column = self.column_id(dst.column)?;
        let mut to_move = src_groups.clone();

        let index = if dst_groups.is_empty() {
            self.index_for_words(dst)
        } else {
            let unmoved = |id: &PartId| !self.is_moved_text(*id);
            let (src_edge, dst_edge) = if forward {
                (src_groups.last(), dst_groups.first())
            } else {
                (src_groups.first(), dst_groups.last())
            };
            let src_edge = src_edge.copied().filter(unmoved);
            let dst_edge = dst_edge.copied().filter(unmoved);

            if let (Some(from), Some(into)) = (src_edge, dst_edge) {
                let (from_begin, from_end) = self.word_range_of(from)?;
                let (into_begin, into_end) = self.word_range_of(into)?;
                if forward {
                    self.store.set_word_range(into, from_begin, into_end)?;
                } else {
                    self.store.set_word_range(into, into_begin, from_end)?;
                }
                to_move.retain(|id| *id != from);
                self.store.remove_part(from)?;
            }

            let anchor = if forward {
                dst_groups.first()
            } else {
                dst_groups.last()
            };
            match anchor.and_then(|id| self.part_index(*id)) {
                Some(i) if forward => i,
                Some(i) => i + 1,
                None => self.index_for_words(dst),
            }
        };

        if !to_move.is_empty() {
            for id in &to_move {
                self.store.set_part_column(*id, column)?;
            }
            self.store.move_range(&to_move, dst.row, index)?;
        }

        if self.store.row_count() < rows_before {
            self.renumber_rows(renumber_from, false);
        }
        log::debug!("merged {src:?} into {dst:?} (forward: {forward})");
        Ok(Some(dst))
    }

    fn first_row_index(&self, a: ChartLocation, b: ChartLocation) -> usize {
        let a = self.store.row_index(a.row).unwrap_or(0);
        let b = self.store.row_index(b.row).unwrap_or(0);
        a.min(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ChartBuilder, cell, cell_groups, labels, row_id, sample_text};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_into_empty_cell_moves_groups() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        chart
            .merge_cell(cell(&chart, 0, 0), cell(&chart, 0, 1), true)
            .unwrap();

        assert!(cell_groups(&chart, &text, cell(&chart, 0, 0)).is_empty());
        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 1)), vec!["The dog"]);
        assert_eq!(
            chart.last_move(),
            Some(LastMove {
                cell: cell(&chart, 0, 1),
                forward: true,
                kind: MoveKind::Cell,
            })
        );
    }

    #[test]
    fn test_merge_there_and_back_restores_cell() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (2, "barked")])
            .build();
        let original = chart.store().clone();

        chart
            .merge_cell(cell(&chart, 0, 0), cell(&chart, 0, 1), true)
            .unwrap();
        chart
            .merge_cell(cell(&chart, 0, 1), cell(&chart, 0, 0), false)
            .unwrap();

        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 0)), vec!["The dog"]);
        assert_eq!(chart.store(), &original);
    }

    #[test]
    fn test_forward_merge_joins_boundary_groups() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (1, "barked")])
            .build();

        chart
            .merge_cell(cell(&chart, 0, 0), cell(&chart, 0, 1), true)
            .unwrap();

        assert_eq!(
            cell_groups(&chart, &text, cell(&chart, 0, 1)),
            vec!["The dog barked"]
        );
        assert_eq!(chart.store().parts_of_row(row_id(&chart, 0)).len(), 1);
    }

    #[test]
    fn test_backward_merge_across_rows_deletes_emptied_row() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "barked")])
            .row(&[(0, "loudly")])
            .build();
        assert_eq!(labels(&chart), vec!["1a", "1b", "1c"]);

        chart
            .merge_cell(cell(&chart, 1, 0), cell(&chart, 0, 2), false)
            .unwrap();

        assert_eq!(chart.row_count(), 2);
        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 2)), vec!["barked"]);
        assert_eq!(labels(&chart), vec!["1a", "1b"]);
        assert_eq!(chart.check_ordering(&text), Ok(()));
    }

    #[test]
    fn test_merge_drops_redundant_marker_and_coalesces() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The"), (0, "dog")])
            .build();
        let row = row_id(&chart, 0);
        let dog = chart.word_groups_in_cell(cell(&chart, 0, 0))[1];
        let column = chart.column_id(1).unwrap();
        let marker = chart
            .store
            .create_moved_marker(row, 2, column, dog, false)
            .unwrap();

        chart
            .merge_cell(cell(&chart, 0, 0), cell(&chart, 0, 1), true)
            .unwrap();

        assert!(chart.part(marker).is_none());
        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 1)), vec!["The dog"]);
        assert!(chart.is_cell_empty(cell(&chart, 0, 0)));
    }

    #[test]
    fn test_moved_text_is_relocated_not_joined() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (1, "barked")])
            .build();
        let row = row_id(&chart, 0);
        let barked = chart.word_groups_in_cell(cell(&chart, 0, 1))[0];
        let column = chart.column_id(2).unwrap();
        chart
            .store
            .create_moved_marker(row, 2, column, barked, false)
            .unwrap();

        chart
            .merge_cell(cell(&chart, 0, 0), cell(&chart, 0, 1), true)
            .unwrap();

        assert_eq!(
            cell_groups(&chart, &text, cell(&chart, 0, 1)),
            vec!["The dog", "barked"]
        );
    }

    #[test]
    fn test_merge_of_empty_cell_is_noop() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();

        chart
            .merge_cell(cell(&chart, 0, 1), cell(&chart, 0, 2), true)
            .unwrap();

        assert!(!chart.can_undo());
        assert_eq!(chart.last_move(), None);
    }

    #[test]
    fn test_move_word_forward_grows_destination() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (1, "barked")])
            .build();

        chart.move_word(&text, cell(&chart, 0, 0), true).unwrap();

        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 0)), vec!["The"]);
        assert_eq!(
            cell_groups(&chart, &text, cell(&chart, 0, 1)),
            vec!["dog barked"]
        );
    }

    #[test]
    fn test_move_word_backward_into_empty_cell() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(1, "The dog")]).build();

        chart.move_word(&text, cell(&chart, 0, 1), false).unwrap();

        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 0)), vec!["The"]);
        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 1)), vec!["dog"]);
        assert_eq!(chart.check_ordering(&text), Ok(()));
    }

    #[test]
    fn test_move_last_word_matches_merge() {
        let text = sample_text();
        let build = || {
            ChartBuilder::new(&text, 3)
                .row(&[(0, "The"), (1, "dog barked")])
                .build()
        };
        let mut by_word = build();
        let mut by_cell = build();

        by_word.move_word(&text, cell(&by_word, 0, 0), true).unwrap();
        by_cell
            .merge_cell(cell(&by_cell, 0, 0), cell(&by_cell, 0, 1), true)
            .unwrap();

        assert_eq!(by_word.store(), by_cell.store());
    }

    #[test]
    fn test_repeat_last_move_continues_in_same_direction() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        assert!(!chart.repeat_last_move(&text).unwrap());

        chart.move_cell(cell(&chart, 0, 0), true).unwrap();
        assert!(chart.repeat_last_move(&text).unwrap());

        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 2)), vec!["The dog"]);
    }

    #[test]
    fn test_undo_forgets_last_move() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(0, "The dog")]).build();
        chart.move_cell(cell(&chart, 0, 0), true).unwrap();

        chart.undo();
        let restored = chart.store().clone();

        assert_eq!(chart.last_move(), None);
        assert!(!chart.repeat_last_move(&text).unwrap());
        assert_eq!(chart.store(), &restored);
        assert_eq!(cell_groups(&chart, &text, cell(&chart, 0, 0)), vec!["The dog"]);
    }

    #[test]
    fn test_move_cell_at_chart_end_does_nothing() {
        let text = sample_text();
        let mut chart = ChartBuilder::new(&text, 3).row(&[(2, "The dog")]).build();

        chart.move_cell(cell(&chart, 0, 2), true).unwrap();

        assert!(!chart.can_undo());
    }
}
