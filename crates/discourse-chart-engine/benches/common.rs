use discourse_chart_engine::{Chart, ChartOutcome, InterlinearText, Template, TextSource};

// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_text(paragraphs: usize) -> InterlinearText {
    let paragraph = "The old man walked slowly to the river. He sat down on a rock and waited. \
                     Nobody came for a long time.";
    InterlinearText::from_paragraphs(std::iter::repeat_n(paragraph, paragraphs))
}

#[allow(dead_code)]
pub fn flat_template(columns: usize) -> Template {
    Template::flat("bench", (0..columns).map(|i| format!("Column {i}")))
}

/// Chart the whole text, three words per cell, cycling through the columns
#[allow(dead_code)]
pub fn chart_everything(text: &InterlinearText, columns: usize) -> Chart {
    let mut chart = Chart::new(flat_template(columns), text.id());
    let mut column = 0;
    while let Ok(ChartOutcome::Charted(_)) = chart.chart_next_words(text, column, 3) {
        column = (column + 1) % columns;
    }
    chart
}
