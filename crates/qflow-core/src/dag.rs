//! Type-erased description of a pipeline: what each node is and what it reads.
//!
//! The planner keeps the typed nodes (selectors, comparers); this module only
//! holds the shape so it can be printed, serialized and hashed.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Operator kinds. One compilation rule exists per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Source,
    Where,
    Select,
    SelectMany,
    Join,
    GroupJoin,
    GroupBy,
    Aggregate,
}

impl NodeKind {
    /// Number of sequence inputs a node of this kind reads.
    pub fn inputs(&self) -> usize {
        use NodeKind::*;
        match self {
            Source => 0,
            Where | Select | SelectMany | GroupBy | Aggregate => 1,
            Join | GroupJoin => 2,
        }
    }

    pub fn is_unary(&self) -> bool {
        self.inputs() == 1
    }

    pub fn is_binary(&self) -> bool {
        self.inputs() == 2
    }

    /// Whether evaluation materializes an input before producing output.
    pub fn materializes(&self) -> bool {
        matches!(
            self,
            NodeKind::Join | NodeKind::GroupJoin | NodeKind::GroupBy | NodeKind::Aggregate
        )
    }

    pub fn as_str(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Source => "source",
            Where => "where",
            Select => "select",
            SelectMany => "select_many",
            Join => "join",
            GroupJoin => "group_join",
            GroupBy => "group_by",
            Aggregate => "aggregate",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's input: either the adapter's logical source or another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceRef {
    Source { name: String },
    Node(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Free-form label (source name, element type names).
    pub label: String,
    pub inputs: Vec<SequenceRef>,
    pub has_comparer: bool,
}

impl NodeDescriptor {
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            inputs: vec![],
            has_comparer: false,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<SequenceRef>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_comparer(mut self, explicit: bool) -> Self {
        self.has_comparer = explicit;
        self
    }
}

/// Recursive view of a pipeline, rooted at the node being enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTree {
    pub node: NodeDescriptor,
    pub children: Vec<PlanTree>,
}

/// Node-id-free shape of a plan; structurally equal pipelines share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanShape<'a> {
    kind: NodeKind,
    label: &'a str,
    has_comparer: bool,
    children: Vec<PlanShape<'a>>,
}

impl PlanTree {
    pub fn leaf(node: NodeDescriptor) -> Self {
        Self {
            node,
            children: vec![],
        }
    }

    pub fn new(node: NodeDescriptor, children: Vec<PlanTree>) -> Self {
        Self { node, children }
    }

    /// Total nodes in the tree (shared prefixes counted once per use).
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(PlanTree::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(PlanTree::depth).max().unwrap_or(0)
    }

    pub fn shape(&self) -> PlanShape<'_> {
        PlanShape {
            kind: self.node.kind,
            label: &self.node.label,
            has_comparer: self.node.has_comparer,
            children: self.children.iter().map(PlanTree::shape).collect(),
        }
    }

    /// Pre-order list of node kinds.
    pub fn kinds(&self) -> Vec<NodeKind> {
        let mut out = vec![self.node.kind];
        for c in &self.children {
            out.extend(c.kinds());
        }
        out
    }

    /// Indented, one-node-per-line rendering for EXPLAIN output.
    pub fn render(&self) -> String {
        let mut s = String::new();
        self.render_into(0, &mut s);
        s
    }

    fn render_into(&self, depth: usize, out: &mut String) {
        use std::fmt::Write as _;
        let _ = write!(out, "{}{} {}", "  ".repeat(depth), self.node.kind, self.node.id);
        if !self.node.label.is_empty() {
            let _ = write!(out, " [{}]", self.node.label);
        }
        if self.node.has_comparer {
            out.push_str(" (comparer)");
        }
        out.push('\n');
        for c in &self.children {
            c.render_into(depth + 1, out);
        }
    }
}
