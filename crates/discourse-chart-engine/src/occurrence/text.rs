use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{AnalysisOccurrence, OccurrenceKey, SegmentId, TextId, TextPosition, TextSource};

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("sentence pattern is valid"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+(?:['’-]\w+)*").expect("word pattern is valid"));

#[derive(Debug, Clone)]
struct Word {
    form: String,
    /// Character offset within the segment's source text
    offset: usize,
}

#[derive(Debug, Clone)]
struct Segment {
    id: SegmentId,
    source: String,
    words: Vec<Word>,
}

impl Segment {
    fn new(id: SegmentId, source: &str) -> Self {
        let source = source.trim().to_string();
        let words = WORD
            .find_iter(&source)
            .map(|m| Word {
                form: m.as_str().to_string(),
                offset: source[..m.start()].chars().count(),
            })
            .collect();
        Self { id, source, words }
    }

    fn char_len(&self) -> usize {
        self.source.chars().count()
    }
}

#[derive(Debug, Clone, Default)]
struct Paragraph {
    segments: Vec<Segment>,
}

impl Paragraph {
    /// Character offset at which segment `index` starts in the rendered paragraph
    fn segment_start(&self, index: usize) -> usize {
        self.segments[..index]
            .iter()
            .map(|segment| segment.char_len() + 1)
            .sum()
    }

    fn text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.source.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A text segmented into paragraphs, segments (sentences) and words.
///
/// Rendered paragraph text is its segments joined by single spaces; word
/// positions are character offsets into that rendering. Segment ids are
/// stable across [`insert_segment`](Self::insert_segment) and
/// [`append_to_segment`](Self::append_to_segment), so occurrences charted
/// before an edit keep pointing at the same words.
#[derive(Debug, Clone)]
pub struct InterlinearText {
    id: TextId,
    paragraphs: Vec<Paragraph>,
    /// SegmentId -> (paragraph index, segment index)
    index: HashMap<SegmentId, (usize, usize)>,
    next_segment: u64,
}

impl InterlinearText {
    pub fn new() -> Self {
        Self {
            id: TextId::new(),
            paragraphs: Vec::new(),
            index: HashMap::new(),
            next_segment: 1,
        }
    }

    /// Build a text from paragraph strings, splitting each into sentences
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = Self::new();
        for paragraph in paragraphs {
            let at = text.paragraphs.len();
            text.insert_paragraph(at, paragraph.as_ref());
        }
        text
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph_text(&self, paragraph: usize) -> Option<String> {
        self.paragraphs.get(paragraph).map(Paragraph::text)
    }

    /// Segment ids in document order
    pub fn segments(&self) -> Vec<SegmentId> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.segments.iter().map(|s| s.id))
            .collect()
    }

    /// The `word`-th word of the `segment`-th segment of `paragraph`
    pub fn occurrence(
        &self,
        paragraph: usize,
        segment: usize,
        word: usize,
    ) -> Option<AnalysisOccurrence> {
        let seg = self.paragraphs.get(paragraph)?.segments.get(segment)?;
        (word < seg.words.len()).then(|| AnalysisOccurrence::new(seg.id, word))
    }

    /// First occurrence of a word form, in document order
    pub fn find_word(&self, form: &str) -> Option<AnalysisOccurrence> {
        self.occurrences()
            .into_iter()
            .find(|occ| self.word(*occ).as_deref() == Some(form))
    }

    /// Insert a paragraph, splitting it into segments at sentence punctuation
    pub fn insert_paragraph(&mut self, at: usize, source: &str) -> Vec<SegmentId> {
        let at = at.min(self.paragraphs.len());
        let mut paragraph = Paragraph::default();
        for sentence in SENTENCE.find_iter(source) {
            if sentence.as_str().trim().is_empty() {
                continue;
            }
            let id = self.allocate_segment();
            paragraph.segments.push(Segment::new(id, sentence.as_str()));
        }
        let ids = paragraph.segments.iter().map(|s| s.id).collect();
        self.paragraphs.insert(at, paragraph);
        self.reindex();
        ids
    }

    /// Insert a new segment into an existing paragraph.
    ///
    /// Words of the new segment are uncharted; if they land before charted
    /// text they become chart orphans.
    pub fn insert_segment(
        &mut self,
        paragraph: usize,
        segment_index: usize,
        source: &str,
    ) -> Option<SegmentId> {
        if paragraph >= self.paragraphs.len() {
            return None;
        }
        let id = self.allocate_segment();
        let para = &mut self.paragraphs[paragraph];
        let at = segment_index.min(para.segments.len());
        para.segments.insert(at, Segment::new(id, source));
        self.reindex();
        Some(id)
    }

    /// Append words to the end of a segment; existing word indices are kept
    pub fn append_to_segment(&mut self, segment: SegmentId, source: &str) -> bool {
        let Some(&(p, s)) = self.index.get(&segment) else {
            return false;
        };
        let seg = &mut self.paragraphs[p].segments[s];
        let combined = format!("{} {}", seg.source, source.trim());
        *seg = Segment::new(seg.id, &combined);
        true
    }

    fn allocate_segment(&mut self) -> SegmentId {
        let id = SegmentId(self.next_segment);
        self.next_segment += 1;
        id
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (p, paragraph) in self.paragraphs.iter().enumerate() {
            for (s, segment) in paragraph.segments.iter().enumerate() {
                self.index.insert(segment.id, (p, s));
            }
        }
    }

    fn locate(&self, occurrence: AnalysisOccurrence) -> Option<(usize, usize, &Segment)> {
        let &(p, s) = self.index.get(&occurrence.segment)?;
        let segment = &self.paragraphs[p].segments[s];
        (occurrence.index < segment.words.len()).then_some((p, s, segment))
    }

    /// First word of the first non-empty segment after (p, s)
    fn first_after(&self, p: usize, s: usize) -> Option<AnalysisOccurrence> {
        let mut segments = self.paragraphs[p].segments[s + 1..].iter().chain(
            self.paragraphs[p + 1..]
                .iter()
                .flat_map(|para| para.segments.iter()),
        );
        segments
            .find(|seg| !seg.words.is_empty())
            .map(|seg| AnalysisOccurrence::new(seg.id, 0))
    }

    /// Last word of the last non-empty segment before (p, s)
    fn last_before(&self, p: usize, s: usize) -> Option<AnalysisOccurrence> {
        let mut segments = self.paragraphs[p].segments[..s].iter().rev().chain(
            self.paragraphs[..p]
                .iter()
                .rev()
                .flat_map(|para| para.segments.iter().rev()),
        );
        segments
            .find(|seg| !seg.words.is_empty())
            .map(|seg| AnalysisOccurrence::new(seg.id, seg.words.len() - 1))
    }
}

impl Default for InterlinearText {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for InterlinearText {
    fn id(&self) -> TextId {
        self.id
    }

    fn occurrences(&self) -> Vec<AnalysisOccurrence> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.segments.iter())
            .flat_map(|seg| (0..seg.words.len()).map(move |i| AnalysisOccurrence::new(seg.id, i)))
            .collect()
    }

    fn key(&self, occurrence: AnalysisOccurrence) -> Option<OccurrenceKey> {
        let (paragraph, segment, _) = self.locate(occurrence)?;
        Some(OccurrenceKey {
            paragraph,
            segment,
            index: occurrence.index,
        })
    }

    fn position(&self, occurrence: AnalysisOccurrence) -> Option<TextPosition> {
        let (p, s, segment) = self.locate(occurrence)?;
        let start = self.paragraphs[p].segment_start(s);
        Some(TextPosition::new(
            p,
            start + segment.words[occurrence.index].offset,
        ))
    }

    fn next(&self, occurrence: AnalysisOccurrence) -> Option<AnalysisOccurrence> {
        let (p, s, segment) = self.locate(occurrence)?;
        if occurrence.index + 1 < segment.words.len() {
            return Some(AnalysisOccurrence::new(segment.id, occurrence.index + 1));
        }
        self.first_after(p, s)
    }

    fn previous(&self, occurrence: AnalysisOccurrence) -> Option<AnalysisOccurrence> {
        let (p, s, segment) = self.locate(occurrence)?;
        if occurrence.index > 0 {
            return Some(AnalysisOccurrence::new(segment.id, occurrence.index - 1));
        }
        self.last_before(p, s)
    }

    fn word(&self, occurrence: AnalysisOccurrence) -> Option<String> {
        let (_, _, segment) = self.locate(occurrence)?;
        Some(segment.words[occurrence.index].form.clone())
    }
}
