use crate::chart::Chart;
use crate::error::ChartError;

/// Clause letters for the `n`th clause of a sentence, counting from 1:
/// "a" to "z", then "aa", "ab", and so on
pub fn clause_letters(n: usize) -> String {
    let mut letters = Vec::new();
    let mut n = n;
    while n > 0 {
        n -= 1;
        letters.push(char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    letters.iter().rev().collect()
}

impl Chart {
    /// Recompute row labels from the sentence containing `from`.
    ///
    /// Labels read "{sentence}{clause}", without a letter when a sentence has
    /// one clause. Returns how many labels actually changed.
    pub fn renumber(
        &mut self,
        from: usize,
        single_sentence_only: bool,
    ) -> Result<usize, ChartError> {
        self.run_in_transaction("Undo Renumber", "Redo Renumber", |chart| {
            Ok(chart.renumber_rows(from, single_sentence_only))
        })
    }

    pub(crate) fn renumber_rows(&mut self, from: usize, single_sentence_only: bool) -> usize {
        let rows = self.store.rows().to_vec();
        if from >= rows.len() {
            return 0;
        }
        let ends_sentence = |chart: &Self, index: usize| {
            chart
                .store
                .row(rows[index])
                .is_some_and(|row| row.end_sentence)
        };

        let mut start = from;
        while start > 0 && !ends_sentence(self, start - 1) {
            start -= 1;
        }
        let mut sentence = 1 + (0..start).filter(|i| ends_sentence(self, *i)).count();

        let mut writes = 0;
        while start < rows.len() {
            let end = (start..rows.len())
                .find(|i| ends_sentence(self, *i))
                .unwrap_or(rows.len() - 1);
            let single_clause = start == end;
            for (clause, index) in (start..=end).enumerate() {
                let label = if single_clause {
                    sentence.to_string()
                } else {
                    format!("{sentence}{}", clause_letters(clause + 1))
                };
                if let Some(row) = self.store.row_mut(rows[index])
                    && row.label != label
                {
                    row.label = label;
                    writes += 1;
                }
            }
            sentence += 1;
            start = end + 1;
            if single_sentence_only && end >= from {
                break;
            }
        }
        if writes > 0 {
            log::debug!("relabelled {writes} rows from row {from}");
        }
        writes
    }
}
