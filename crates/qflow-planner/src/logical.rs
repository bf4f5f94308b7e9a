//! Typed operator nodes.
//!
//! A pipeline is an immutable, reference-counted chain of these nodes. Each
//! node knows its own shape (`explain`) and how to compile itself into a
//! `Stage` (`lower`); sources are the leaves. Nodes are never mutated after
//! creation, so prefixes are freely shared between pipelines.

use std::sync::Arc;

use qflow_core::dag::{NodeDescriptor, NodeKind, PlanTree, SequenceRef};
use qflow_core::id::NodeId;
use qflow_core::source::{Element, SequenceSource};
use qflow_operators::traits::{BinaryOperator, UnaryOperator};

use crate::physical::Stage;

pub trait LogicalNode<T>: Send + Sync + 'static {
    fn id(&self) -> NodeId;

    fn kind(&self) -> NodeKind;

    /// Shape of this node and its inputs.
    fn explain(&self) -> PlanTree;

    /// Compile this node (and its inputs) into an execution closure.
    fn lower(&self) -> Stage<T>;
}

pub type NodeRef<T> = Arc<dyn LogicalNode<T>>;

/// Leaf reading from a sequence source.
pub struct SourceNode<T> {
    id: NodeId,
    source: Arc<dyn SequenceSource<T>>,
}

impl<T> SourceNode<T> {
    pub fn new(source: Arc<dyn SequenceSource<T>>) -> Self {
        Self {
            id: NodeId::next(),
            source,
        }
    }
}

impl<T: Element> LogicalNode<T> for SourceNode<T> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Source
    }

    fn explain(&self) -> PlanTree {
        let name = self.source.name().to_string();
        PlanTree::leaf(
            NodeDescriptor::new(self.id, NodeKind::Source, name.clone())
                .with_inputs(vec![SequenceRef::Source { name }]),
        )
    }

    fn lower(&self) -> Stage<T> {
        let source = Arc::clone(&self.source);
        Arc::new(move |ctx| source.open(&ctx.cancel))
    }
}

pub struct UnaryNode<I, O> {
    id: NodeId,
    input: NodeRef<I>,
    op: Arc<dyn UnaryOperator<I, O>>,
    has_comparer: bool,
}

impl<I, O> UnaryNode<I, O> {
    pub fn new(input: NodeRef<I>, op: Arc<dyn UnaryOperator<I, O>>) -> Self {
        Self {
            id: NodeId::next(),
            input,
            op,
            has_comparer: false,
        }
    }

    pub fn with_comparer(mut self, explicit: bool) -> Self {
        self.has_comparer = explicit;
        self
    }
}

impl<I: Element, O: Element> LogicalNode<O> for UnaryNode<I, O> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.op.kind()
    }

    fn explain(&self) -> PlanTree {
        let node = NodeDescriptor::new(self.id, self.op.kind(), self.op.name())
            .with_inputs(vec![SequenceRef::Node(self.input.id())])
            .with_comparer(self.has_comparer);
        PlanTree::new(node, vec![self.input.explain()])
    }

    fn lower(&self) -> Stage<O> {
        let input = self.input.lower();
        let op = Arc::clone(&self.op);
        Arc::new(move |ctx| Ok(op.execute(input(ctx)?, ctx)))
    }
}

pub struct BinaryNode<L, R, O> {
    id: NodeId,
    outer: NodeRef<L>,
    inner: NodeRef<R>,
    op: Arc<dyn BinaryOperator<L, R, O>>,
    has_comparer: bool,
}

impl<L, R, O> BinaryNode<L, R, O> {
    pub fn new(outer: NodeRef<L>, inner: NodeRef<R>, op: Arc<dyn BinaryOperator<L, R, O>>) -> Self {
        Self {
            id: NodeId::next(),
            outer,
            inner,
            op,
            has_comparer: false,
        }
    }

    pub fn with_comparer(mut self, explicit: bool) -> Self {
        self.has_comparer = explicit;
        self
    }
}

impl<L: Element, R: Element, O: Element> LogicalNode<O> for BinaryNode<L, R, O> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.op.kind()
    }

    fn explain(&self) -> PlanTree {
        let node = NodeDescriptor::new(self.id, self.op.kind(), self.op.name())
            .with_inputs(vec![
                SequenceRef::Node(self.outer.id()),
                SequenceRef::Node(self.inner.id()),
            ])
            .with_comparer(self.has_comparer);
        PlanTree::new(node, vec![self.outer.explain(), self.inner.explain()])
    }

    fn lower(&self) -> Stage<O> {
        let outer = self.outer.lower();
        let inner = self.inner.lower();
        let op = Arc::clone(&self.op);
        Arc::new(move |ctx| {
            let outer = outer(ctx)?;
            let inner = inner(ctx)?;
            Ok(op.execute(outer, inner, ctx))
        })
    }
}
