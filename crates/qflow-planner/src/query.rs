//! `Query<T>`: persistent handle to a pipeline producing `T`.
//!
//! Chaining an operator returns a new handle and leaves the receiver valid
//! and enumerable; both share the common prefix of nodes.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use qflow_core::comparer::Comparer;
use qflow_core::dag::{NodeKind, PlanTree};
use qflow_core::error::Result;
use qflow_core::id::NodeId;
use qflow_core::source::{Element, SequenceSource, VecSource};
use qflow_operators::callback::Selector;
use qflow_operators::group::Grouping;

use crate::logical::{NodeRef, SourceNode};
use crate::ops;

pub struct Query<T> {
    node: NodeRef<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T: 'static> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.node.id())
            .field("kind", &self.node.kind())
            .finish()
    }
}

impl<T: Element> Query<T> {
    pub fn from_source(source: impl SequenceSource<T>) -> Self {
        Self::from_shared(Arc::new(source))
    }

    pub fn from_shared(source: Arc<dyn SequenceSource<T>>) -> Self {
        Self::from_node(Arc::new(SourceNode::new(source)))
    }

    /// Restartable in-memory source.
    pub fn from_vec(name: impl Into<String>, items: Vec<T>) -> Self {
        Self::from_source(VecSource::new(name, items))
    }

    pub fn from_node(node: NodeRef<T>) -> Self {
        Self { node }
    }

    pub fn node(&self) -> &NodeRef<T> {
        &self.node
    }

    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    pub fn explain(&self) -> PlanTree {
        self.node.explain()
    }

    pub fn filter(&self, predicate: impl Into<Option<Selector<T, bool>>>) -> Result<Query<T>> {
        ops::filter(self.clone(), predicate)
    }

    pub fn select<R: Element>(
        &self,
        selector: impl Into<Option<Selector<T, R>>>,
    ) -> Result<Query<R>> {
        ops::select(self.clone(), selector)
    }

    pub fn select_many<R: Element>(
        &self,
        selector: impl Into<Option<Selector<T, Vec<R>>>>,
    ) -> Result<Query<R>> {
        ops::select_many(self.clone(), selector)
    }

    pub fn join<I, K, R>(
        &self,
        inner: impl Into<Option<Query<I>>>,
        outer_key_selector: impl Into<Option<Selector<T, K>>>,
        inner_key_selector: impl Into<Option<Selector<I, K>>>,
        result_selector: impl Into<Option<Selector<(T, I), R>>>,
    ) -> Result<Query<R>>
    where
        I: Element,
        K: Element + Eq + Hash,
        R: Element,
    {
        ops::join(
            self.clone(),
            inner,
            outer_key_selector,
            inner_key_selector,
            result_selector,
        )
    }

    pub fn join_with<I, K, R>(
        &self,
        inner: impl Into<Option<Query<I>>>,
        outer_key_selector: impl Into<Option<Selector<T, K>>>,
        inner_key_selector: impl Into<Option<Selector<I, K>>>,
        result_selector: impl Into<Option<Selector<(T, I), R>>>,
        comparer: Comparer<K>,
    ) -> Result<Query<R>>
    where
        I: Element,
        K: Element,
        R: Element,
    {
        ops::join_with(
            self.clone(),
            inner,
            outer_key_selector,
            inner_key_selector,
            result_selector,
            comparer,
        )
    }

    pub fn group_join<I, K, R>(
        &self,
        inner: impl Into<Option<Query<I>>>,
        outer_key_selector: impl Into<Option<Selector<T, K>>>,
        inner_key_selector: impl Into<Option<Selector<I, K>>>,
        result_selector: impl Into<Option<Selector<(T, Vec<I>), R>>>,
    ) -> Result<Query<R>>
    where
        I: Element,
        K: Element + Eq + Hash,
        R: Element,
    {
        ops::group_join(
            self.clone(),
            inner,
            outer_key_selector,
            inner_key_selector,
            result_selector,
        )
    }

    pub fn group_join_with<I, K, R>(
        &self,
        inner: impl Into<Option<Query<I>>>,
        outer_key_selector: impl Into<Option<Selector<T, K>>>,
        inner_key_selector: impl Into<Option<Selector<I, K>>>,
        result_selector: impl Into<Option<Selector<(T, Vec<I>), R>>>,
        comparer: Comparer<K>,
    ) -> Result<Query<R>>
    where
        I: Element,
        K: Element,
        R: Element,
    {
        ops::group_join_with(
            self.clone(),
            inner,
            outer_key_selector,
            inner_key_selector,
            result_selector,
            comparer,
        )
    }

    pub fn group_by<K>(
        &self,
        key_selector: impl Into<Option<Selector<T, K>>>,
    ) -> Result<Query<Grouping<K, T>>>
    where
        K: Element + Eq + Hash,
    {
        ops::group_by(self.clone(), key_selector)
    }

    pub fn group_by_with<K>(
        &self,
        key_selector: impl Into<Option<Selector<T, K>>>,
        comparer: Comparer<K>,
    ) -> Result<Query<Grouping<K, T>>>
    where
        K: Element,
    {
        ops::group_by_with(self.clone(), key_selector, comparer)
    }

    pub fn aggregate<A: Element>(
        &self,
        seed: A,
        func: impl Into<Option<Selector<(A, T), A>>>,
    ) -> Result<Query<A>> {
        ops::aggregate(self.clone(), seed, func)
    }

    pub fn count(&self) -> Result<Query<usize>> {
        ops::count(self.clone())
    }
}
