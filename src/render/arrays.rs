//! Nested array planning shared by the backends
//!
//! A member like `boolean[][][][]` is walked level by level: every level
//! gets its own loop variables, only the innermost level touches the leaf.

use crate::property::{NodeId, Property, SchemaGraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayPlan {
    /// Array nodes, outermost first
    pub levels: Vec<NodeId>,
    /// First non-array node below the chain
    pub leaf: NodeId,
}

impl ArrayPlan {
    /// Plan for the array chain starting at `array`
    pub fn of(graph: &SchemaGraph, array: NodeId) -> Self {
        let mut levels = Vec::new();
        let mut current = array;
        while let Property::Array(a) = graph.property(current) {
            levels.push(current);
            current = a.items;
        }
        Self {
            levels,
            leaf: current,
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Whether elements of `level` are leaves
    pub fn is_innermost(&self, level: usize) -> bool {
        level + 1 == self.depth()
    }

    /// Array dimensions of the collection built at `level`
    pub fn dims(&self, level: usize) -> usize {
        self.depth().saturating_sub(level)
    }

    /// Go slice type of the collection at `level`, e.g. `[][]bool`
    pub fn go_type(&self, level: usize, leaf: &str) -> String {
        format!("{}{}", "[]".repeat(self.dims(level)), leaf)
    }

    /// TypeScript array type of the collection at `level`, e.g. `boolean[][]`
    pub fn ts_type(&self, level: usize, leaf: &str) -> String {
        format!("{}{}", leaf, "[]".repeat(self.dims(level)))
    }
}

/// Object schemas a member leads to: itself, or the leaf of an array chain
pub fn member_object(graph: &SchemaGraph, member: NodeId) -> Option<NodeId> {
    let target = graph.array_leaf(member);
    graph
        .object(target)
        .filter(|o| o.has_members())
        .map(|_| target)
}
