//! # Occurrence Ordering
//!
//! The chart never owns the text it charts. It only needs to compare word
//! occurrences, step between neighbours and map an occurrence to a paragraph
//! position. [`TextSource`] is that contract; [`InterlinearText`] is the
//! in-memory implementation used by hosts without their own text store and
//! by the tests.

pub mod text;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use text::InterlinearText;

/// Stable identity of a segment (sentence) of the text.
///
/// Segment ids survive edits that add or remove other segments, which is what
/// keeps charted references valid while new text appears around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// Identity of a base text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextId(pub Uuid);

impl TextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TextId {
    fn default() -> Self {
        Self::new()
    }
}

/// One word of the text: the `index`-th word of `segment`.
///
/// Deliberately not `Ord`: document order depends on where the segment sits
/// in the text, so comparisons go through [`TextSource::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisOccurrence {
    pub segment: SegmentId,
    pub index: usize,
}

impl AnalysisOccurrence {
    pub fn new(segment: SegmentId, index: usize) -> Self {
        Self { segment, index }
    }
}

/// Where an occurrence starts: paragraph index and character offset within it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TextPosition {
    pub paragraph: usize,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(paragraph: usize, offset: usize) -> Self {
        Self { paragraph, offset }
    }
}

/// Total order key: (paragraph index, segment index, in-segment index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub paragraph: usize,
    pub segment: usize,
    pub index: usize,
}

/// Read access to the charted text.
pub trait TextSource {
    fn id(&self) -> TextId;

    /// Every word occurrence, in document order
    fn occurrences(&self) -> Vec<AnalysisOccurrence>;

    /// Order key of an occurrence, `None` if the text doesn't contain it
    fn key(&self, occurrence: AnalysisOccurrence) -> Option<OccurrenceKey>;

    fn position(&self, occurrence: AnalysisOccurrence) -> Option<TextPosition>;

    fn next(&self, occurrence: AnalysisOccurrence) -> Option<AnalysisOccurrence>;

    fn previous(&self, occurrence: AnalysisOccurrence) -> Option<AnalysisOccurrence>;

    /// Surface form of the word
    fn word(&self, occurrence: AnalysisOccurrence) -> Option<String>;

    fn contains(&self, occurrence: AnalysisOccurrence) -> bool {
        self.key(occurrence).is_some()
    }

    /// Document-order comparison; `None` when either side is unknown
    fn compare(&self, a: AnalysisOccurrence, b: AnalysisOccurrence) -> Option<Ordering> {
        Some(self.key(a)?.cmp(&self.key(b)?))
    }

    fn is_after(&self, a: AnalysisOccurrence, b: AnalysisOccurrence) -> bool {
        self.compare(a, b) == Some(Ordering::Greater)
    }

    /// Inclusive run of occurrences from `begin` to `end`.
    ///
    /// Empty if `begin` comes after `end` or either is unknown.
    fn occurrences_between(
        &self,
        begin: AnalysisOccurrence,
        end: AnalysisOccurrence,
    ) -> Vec<AnalysisOccurrence> {
        match self.compare(begin, end) {
            None | Some(Ordering::Greater) => return Vec::new(),
            _ => {}
        }
        let mut out = vec![begin];
        let mut current = begin;
        while current != end {
            match self.next(current) {
                Some(next) => {
                    out.push(next);
                    current = next;
                }
                None => break,
            }
        }
        out
    }

    /// True if the occurrence is the last word of its segment
    fn ends_segment(&self, occurrence: AnalysisOccurrence) -> bool {
        match self.next(occurrence) {
            Some(next) => next.segment != occurrence.segment,
            None => self.contains(occurrence),
        }
    }

    /// True if the occurrence is the last word of its paragraph
    fn ends_paragraph(&self, occurrence: AnalysisOccurrence) -> bool {
        let Some(key) = self.key(occurrence) else {
            return false;
        };
        match self.next(occurrence).and_then(|next| self.key(next)) {
            Some(next_key) => next_key.paragraph != key.paragraph,
            None => true,
        }
    }
}
