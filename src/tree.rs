//! Version Tree
//!
//! Rebuilds the parent/child structure implied by `based_on` links. The
//! result is a forest: every record with `based_on == 0` is a root, every
//! other record hangs under the record `(path, based_on)`. Nodes live in an
//! arena and refer to their children by index.

use crate::error::ApiError;
use crate::record::VersionRecord;
use std::collections::HashMap;

/// One version in the forest.
#[derive(Debug, Clone)]
pub struct VersionNode<'a> {
    pub record: &'a VersionRecord,
    /// Indices into the forest arena, in log order
    pub children: Vec<usize>,
}

/// Forest of version chains for one or more tracked paths.
#[derive(Debug, Clone, Default)]
pub struct VersionForest<'a> {
    nodes: Vec<VersionNode<'a>>,
    roots: Vec<usize>,
}

impl<'a> VersionForest<'a> {
    /// Build the forest from records in log order.
    ///
    /// Fails with [`ApiError::InconsistentLog`] when a record points at a
    /// parent that is absent or not older than itself. When the same
    /// `(path, version)` appears twice, the first occurrence is the parent.
    pub fn build<I>(records: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = &'a VersionRecord>,
    {
        let nodes: Vec<VersionNode<'a>> = records
            .into_iter()
            .map(|record| VersionNode {
                record,
                children: Vec::new(),
            })
            .collect();

        let mut lookup: HashMap<(&'a str, u32), usize> = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            let record: &'a VersionRecord = node.record;
            lookup
                .entry((record.path.as_str(), record.version))
                .or_insert(idx);
        }

        let mut forest = VersionForest {
            nodes,
            roots: Vec::new(),
        };
        for idx in 0..forest.nodes.len() {
            let record = forest.nodes[idx].record;
            if record.is_root() {
                forest.roots.push(idx);
                continue;
            }

            let parent = lookup
                .get(&(record.path.as_str(), record.based_on))
                .copied()
                .filter(|_| record.based_on < record.version)
                .ok_or_else(|| ApiError::InconsistentLog {
                    path: record.path.clone(),
                    version: record.version,
                    based_on: record.based_on,
                })?;
            forest.nodes[parent].children.push(idx);
        }

        Ok(forest)
    }

    /// Arena indices of the root versions, in log order.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn node(&self, idx: usize) -> &VersionNode<'a> {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, pre-order traversal yielding `(depth, record)`.
    pub fn walk(&self) -> Vec<(usize, &'a VersionRecord)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> =
            self.roots.iter().rev().map(|&idx| (idx, 0)).collect();

        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            out.push((depth, node.record));
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        out
    }
}
