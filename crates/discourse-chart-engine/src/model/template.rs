use std::collections::BTreeSet;

use discourse_chart_config::{ColumnConfig, TemplateConfig};
use serde::{Deserialize, Serialize};

use super::ColumnId;

/// A leaf of the template tree; one chart column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateNode {
    Column(Column),
    Group {
        label: String,
        children: Vec<TemplateNode>,
    },
}

impl TemplateNode {
    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match self {
            TemplateNode::Column(column) => out.push(column),
            TemplateNode::Group { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// The column structure of a chart.
///
/// Only leaves are chart columns. Top-level nodes form the visual groups
/// whose boundaries are reported by [`group_end_indices`](Self::group_end_indices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    name: String,
    nodes: Vec<TemplateNode>,
    columns: Vec<Column>,
    group_ends: BTreeSet<usize>,
}

impl Template {
    pub fn new(name: impl Into<String>, nodes: Vec<TemplateNode>) -> Self {
        let mut leaves = Vec::new();
        let mut group_ends = BTreeSet::new();
        for node in &nodes {
            node.collect_leaves(&mut leaves);
            if !leaves.is_empty() {
                group_ends.insert(leaves.len() - 1);
            }
        }
        let columns = leaves.into_iter().cloned().collect();
        Self {
            name: name.into(),
            nodes,
            columns,
            group_ends,
        }
    }

    /// A template of ungrouped columns, ids numbered from 1
    pub fn flat<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                TemplateNode::Column(Column {
                    id: ColumnId(i as u64 + 1),
                    label: label.into(),
                })
            })
            .collect();
        Self::new(name, nodes)
    }

    pub fn from_config(config: &TemplateConfig) -> Self {
        let mut next_id = 1;
        let nodes = config
            .columns
            .iter()
            .map(|column| node_from_config(column, &mut next_id))
            .collect();
        Self::new(config.name.clone(), nodes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Leaf columns in display order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn index_of(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|column| column.id == id)
    }

    /// Leaf positions that close a top-level group
    pub fn group_end_indices(&self) -> &BTreeSet<usize> {
        &self.group_ends
    }

    pub fn last_column(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }
}

fn node_from_config(config: &ColumnConfig, next_id: &mut u64) -> TemplateNode {
    if config.children.is_empty() {
        let id = ColumnId(*next_id);
        *next_id += 1;
        TemplateNode::Column(Column {
            id,
            label: config.label.clone(),
        })
    } else {
        TemplateNode::Group {
            label: config.label.clone(),
            children: config
                .children
                .iter()
                .map(|child| node_from_config(child, next_id))
                .collect(),
        }
    }
}
