use std::collections::HashSet;

use crate::chart::Chart;
use crate::model::CellPart;
use crate::occurrence::{AnalysisOccurrence, TextSource};

impl Chart {
    /// Every occurrence referenced by a word group
    pub fn charted_occurrences(&self, text: &impl TextSource) -> HashSet<AnalysisOccurrence> {
        self.store
            .parts_in_order()
            .filter_map(CellPart::word_range)
            .flat_map(|(begin, end)| text.occurrences_between(begin, end))
            .collect()
    }

    /// Up to `max_count` occurrences not yet in the chart, in document order
    pub fn next_uncharted(
        &self,
        text: &impl TextSource,
        max_count: usize,
    ) -> Vec<AnalysisOccurrence> {
        let charted = self.charted_occurrences(text);
        text.occurrences()
            .into_iter()
            .filter(|occ| !charted.contains(occ))
            .take(max_count)
            .collect()
    }

    /// [`next_uncharted`](Self::next_uncharted) with the configured batch size
    pub fn uncharted_batch(&self, text: &impl TextSource) -> Vec<AnalysisOccurrence> {
        self.next_uncharted(text, self.settings().uncharted_batch_size)
    }

    /// The end of the last word group in the last row that has one
    pub fn last_charted_occurrence(&self) -> Option<AnalysisOccurrence> {
        self.store.rows().iter().rev().find_map(|row| {
            self.store
                .parts_of_row(*row)
                .iter()
                .rev()
                .filter_map(|id| self.store.part(*id))
                .find_map(CellPart::word_range)
                .map(|(_, end)| end)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::chart::{Chart, ChartSettings};
    use crate::occurrence::TextSource;
    use crate::test_support::{ChartBuilder, flat_template, sample_text, word};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_chart_returns_text_prefix() {
        let text = sample_text();
        let chart = Chart::new(flat_template(3), text.id());

        let next = chart.next_uncharted(&text, 3);

        assert_eq!(next, text.occurrences()[..3].to_vec());
    }

    #[test]
    fn test_skips_charted_words() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog"), (1, "barked")])
            .build();

        let next = chart.next_uncharted(&text, 2);

        // The second "The" starts the next sentence
        assert_eq!(next, vec![word(&text, "loudly"), text.occurrences()[4]]);
        assert_eq!(chart.last_charted_occurrence(), Some(word(&text, "barked")));
    }

    #[test]
    fn test_gap_before_charted_text_is_uncharted() {
        let text = sample_text();
        let chart = ChartBuilder::new(&text, 3)
            .row(&[(0, "The dog")])
            .row(&[(0, "The cat")])
            .build();

        let next = chart.next_uncharted(&text, 10);

        assert_eq!(next[0], word(&text, "barked"));
        assert_eq!(next[1], word(&text, "loudly"));
        assert_eq!(next[2], word(&text, "ran"));
    }

    #[test]
    fn test_batch_uses_settings() {
        let text = sample_text();
        let settings = ChartSettings {
            uncharted_batch_size: 4,
            max_undo_depth: 10,
        };
        let chart = Chart::with_settings(flat_template(3), text.id(), settings);

        assert_eq!(chart.uncharted_batch(&text).len(), 4);
    }
}
