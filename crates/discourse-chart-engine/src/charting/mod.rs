//! # Charting
//!
//! The editing algorithms, each an `impl Chart` block:
//!
//! - [`uncharted`] finds text not yet referenced by any word group
//! - [`chorph`] classifies chart orphans and brackets where they may go
//! - [`placement`] decides where new words land and applies it
//! - [`merge`] moves cells and single words between cells
//! - [`moved_text`] marks and unmarks moved text
//! - [`markers`] and [`rows`] hold the smaller structural commands
//! - [`numbering`] relabels rows after structural edits

pub mod chorph;
pub mod markers;
pub mod merge;
pub mod moved_text;
pub mod numbering;
pub mod placement;
pub mod rows;
pub mod uncharted;

pub use chorph::{CellBracket, ChorphTargets, HighlightRegion, OrphanStatus};
pub use merge::{LastMove, MoveKind};
pub use numbering::clause_letters;
pub use placement::{AppendSlot, ChartOutcome, ChorphSlot, WordGroupEnd};
