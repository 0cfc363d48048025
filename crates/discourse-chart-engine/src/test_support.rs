//! Fixtures shared by the unit tests.

use crate::chart::Chart;
use crate::model::{ChartLocation, PartId, RowId, Template};
use crate::occurrence::{AnalysisOccurrence, InterlinearText, TextSource};

/// Two paragraphs, three sentences, eleven words
pub fn sample_text() -> InterlinearText {
    InterlinearText::from_paragraphs([
        "The dog barked loudly. The cat ran away.",
        "Then it rained.",
    ])
}

pub fn flat_template(columns: usize) -> Template {
    Template::flat("test", (0..columns).map(|i| format!("c{i}")))
}

/// Occurrences of a space-separated phrase, searched from `from` onwards
pub fn find_phrase(
    text: &InterlinearText,
    phrase: &str,
    from: usize,
) -> Option<(usize, Vec<AnalysisOccurrence>)> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let all = text.occurrences();
    (from..all.len()).find_map(|start| {
        let window = all.get(start..start + words.len())?;
        window
            .iter()
            .zip(&words)
            .all(|(occ, word)| text.word(*occ).as_deref() == Some(*word))
            .then(|| (start, window.to_vec()))
    })
}

/// Builds charts row by row from word phrases.
///
/// Phrases are matched in document order, so a repeated word such as "The"
/// resolves to the next unused occurrence. Skipped words stay uncharted.
pub struct ChartBuilder<'a> {
    text: &'a InterlinearText,
    columns: usize,
    rows: Vec<(Vec<(usize, String)>, bool)>,
}

impl<'a> ChartBuilder<'a> {
    pub fn new(text: &'a InterlinearText, columns: usize) -> Self {
        Self {
            text,
            columns,
            rows: Vec::new(),
        }
    }

    /// A row holding one word group per `(column, phrase)`
    pub fn row(mut self, cells: &[(usize, &str)]) -> Self {
        let cells = cells
            .iter()
            .map(|(column, phrase)| (*column, phrase.to_string()))
            .collect();
        self.rows.push((cells, false));
        self
    }

    /// Mark the last added row as ending its sentence
    pub fn end_sentence(mut self) -> Self {
        if let Some(last) = self.rows.last_mut() {
            last.1 = true;
        }
        self
    }

    pub fn build(self) -> Chart {
        let mut chart = Chart::new(flat_template(self.columns), self.text.id());
        let mut cursor = 0;
        for (cells, end_sentence) in self.rows {
            let index = chart.row_count();
            let row = chart.store.create_row(index);
            for (column, phrase) in cells {
                let (start, occs) = find_phrase(self.text, &phrase, cursor)
                    .unwrap_or_else(|| panic!("phrase {phrase:?} not found after word {cursor}"));
                cursor = start + occs.len();
                let column_id = chart.column_id(column).unwrap();
                let index = chart.store.parts_of_row(row).len();
                chart
                    .store
                    .create_word_group(row, index, column_id, occs[0], occs[occs.len() - 1])
                    .unwrap();
            }
            chart.store.row_mut(row).unwrap().end_sentence = end_sentence;
        }
        chart.renumber_rows(0, false);
        chart
    }
}

pub fn cell(chart: &Chart, row: usize, column: usize) -> ChartLocation {
    ChartLocation::new(chart.rows()[row], column)
}

pub fn row_id(chart: &Chart, row: usize) -> RowId {
    chart.rows()[row]
}

/// Word groups of a cell rendered as their words
pub fn cell_groups(chart: &Chart, text: &InterlinearText, location: ChartLocation) -> Vec<String> {
    chart
        .word_groups_in_cell(location)
        .into_iter()
        .map(|wg| group_words(chart, text, wg))
        .collect()
}

pub fn group_words(chart: &Chart, text: &InterlinearText, wg: PartId) -> String {
    chart
        .word_group_occurrences(text, wg)
        .into_iter()
        .filter_map(|occ| text.word(occ))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn labels(chart: &Chart) -> Vec<String> {
    chart
        .rows()
        .iter()
        .filter_map(|row| chart.row(*row))
        .map(|row| row.label.clone())
        .collect()
}

pub fn word(text: &InterlinearText, form: &str) -> AnalysisOccurrence {
    text.find_word(form)
        .unwrap_or_else(|| panic!("word {form:?} not in text"))
}
