//! # Chart Model
//!
//! A chart is an ordered list of [`Row`]s, each an ordered list of
//! [`CellPart`]s, laid against the leaf columns of a [`Template`]. Rows and
//! parts are addressed by id; the [`ChartStore`](crate::store::ChartStore)
//! owns them.

pub mod cell_part;
pub mod ids;
pub mod location;
pub mod row;
pub mod template;

pub use cell_part::{CellPart, CellPartKind, ListItemRef};
pub use ids::{ColumnId, PartId, RowId};
pub use location::ChartLocation;
pub use row::{ClauseType, Row};
pub use template::{Column, Template, TemplateNode};
