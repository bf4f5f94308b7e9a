//! Operator entry points.
//!
//! Every operator is a pure function `(pipeline, params...) -> pipeline'`:
//! it checks that each required parameter is present (strictly left to
//! right, first absent one is reported), normalizes the selectors and
//! appends one node. Nothing is evaluated and no source is opened here.
//!
//! The pipeline handle itself is a parameter so that an absent one can be
//! reported like any other; the methods on `Query` delegate here.

use std::hash::Hash;
use std::sync::Arc;

use qflow_core::comparer::Comparer;
use qflow_core::error::{Error, Result};
use qflow_core::source::Element;
use qflow_operators::aggregate::Aggregate;
use qflow_operators::callback::{Callback, Selector};
use qflow_operators::filter::Filter;
use qflow_operators::group::{GroupBy, Grouping};
use qflow_operators::join::{GroupJoin, HashJoin};
use qflow_operators::map::{FlatMap, Map};

use crate::logical::{BinaryNode, UnaryNode};
use crate::query::Query;

fn require<T>(query: Option<Query<T>>, param: &'static str) -> Result<Query<T>> {
    query.ok_or(Error::InvalidArgument { param })
}

fn unary<I: Element, O: Element>(
    input: &Query<I>,
    op: Arc<dyn qflow_operators::traits::UnaryOperator<I, O>>,
    comparer: bool,
) -> Query<O> {
    let node = UnaryNode::new(Arc::clone(input.node()), op).with_comparer(comparer);
    Query::from_node(Arc::new(node))
}

fn binary<L: Element, R: Element, O: Element>(
    outer: &Query<L>,
    inner: &Query<R>,
    op: Arc<dyn qflow_operators::traits::BinaryOperator<L, R, O>>,
    comparer: bool,
) -> Query<O> {
    let node = BinaryNode::new(Arc::clone(outer.node()), Arc::clone(inner.node()), op)
        .with_comparer(comparer);
    Query::from_node(Arc::new(node))
}

pub fn filter<T: Element>(
    source: impl Into<Option<Query<T>>>,
    predicate: impl Into<Option<Selector<T, bool>>>,
) -> Result<Query<T>> {
    let source = require(source.into(), "source")?;
    let predicate = Callback::normalize(predicate.into(), "predicate")?;
    Ok(unary(&source, Arc::new(Filter::new(predicate)), false))
}

pub fn select<T: Element, R: Element>(
    source: impl Into<Option<Query<T>>>,
    selector: impl Into<Option<Selector<T, R>>>,
) -> Result<Query<R>> {
    let source = require(source.into(), "source")?;
    let selector = Callback::normalize(selector.into(), "selector")?;
    Ok(unary(&source, Arc::new(Map::new(selector)), false))
}

pub fn select_many<T: Element, R: Element>(
    source: impl Into<Option<Query<T>>>,
    selector: impl Into<Option<Selector<T, Vec<R>>>>,
) -> Result<Query<R>> {
    let source = require(source.into(), "source")?;
    let selector = Callback::normalize(selector.into(), "selector")?;
    Ok(unary(&source, Arc::new(FlatMap::new(selector)), false))
}

/// Inner join under the natural equality of `K`.
pub fn join<O, I, K, R>(
    outer: impl Into<Option<Query<O>>>,
    inner: impl Into<Option<Query<I>>>,
    outer_key_selector: impl Into<Option<Selector<O, K>>>,
    inner_key_selector: impl Into<Option<Selector<I, K>>>,
    result_selector: impl Into<Option<Selector<(O, I), R>>>,
) -> Result<Query<R>>
where
    O: Element,
    I: Element,
    K: Element + Eq + Hash,
    R: Element,
{
    join_with(
        outer,
        inner,
        outer_key_selector,
        inner_key_selector,
        result_selector,
        Comparer::natural(),
    )
}

/// Inner join under an explicit key equality. `K` needs no `Eq + Hash` of
/// its own; the comparer is the whole equality contract.
pub fn join_with<O, I, K, R>(
    outer: impl Into<Option<Query<O>>>,
    inner: impl Into<Option<Query<I>>>,
    outer_key_selector: impl Into<Option<Selector<O, K>>>,
    inner_key_selector: impl Into<Option<Selector<I, K>>>,
    result_selector: impl Into<Option<Selector<(O, I), R>>>,
    comparer: Comparer<K>,
) -> Result<Query<R>>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    let outer = require(outer.into(), "outer")?;
    let inner = require(inner.into(), "inner")?;
    let outer_key = Callback::normalize(outer_key_selector.into(), "outer_key_selector")?;
    let inner_key = Callback::normalize(inner_key_selector.into(), "inner_key_selector")?;
    let result = Callback::normalize(result_selector.into(), "result_selector")?;
    let explicit = comparer.is_explicit();
    let op = HashJoin::new(outer_key, inner_key, result, comparer);
    Ok(binary(&outer, &inner, Arc::new(op), explicit))
}

pub fn group_join<O, I, K, R>(
    outer: impl Into<Option<Query<O>>>,
    inner: impl Into<Option<Query<I>>>,
    outer_key_selector: impl Into<Option<Selector<O, K>>>,
    inner_key_selector: impl Into<Option<Selector<I, K>>>,
    result_selector: impl Into<Option<Selector<(O, Vec<I>), R>>>,
) -> Result<Query<R>>
where
    O: Element,
    I: Element,
    K: Element + Eq + Hash,
    R: Element,
{
    group_join_with(
        outer,
        inner,
        outer_key_selector,
        inner_key_selector,
        result_selector,
        Comparer::natural(),
    )
}

pub fn group_join_with<O, I, K, R>(
    outer: impl Into<Option<Query<O>>>,
    inner: impl Into<Option<Query<I>>>,
    outer_key_selector: impl Into<Option<Selector<O, K>>>,
    inner_key_selector: impl Into<Option<Selector<I, K>>>,
    result_selector: impl Into<Option<Selector<(O, Vec<I>), R>>>,
    comparer: Comparer<K>,
) -> Result<Query<R>>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    let outer = require(outer.into(), "outer")?;
    let inner = require(inner.into(), "inner")?;
    let outer_key = Callback::normalize(outer_key_selector.into(), "outer_key_selector")?;
    let inner_key = Callback::normalize(inner_key_selector.into(), "inner_key_selector")?;
    let result = Callback::normalize(result_selector.into(), "result_selector")?;
    let explicit = comparer.is_explicit();
    let op = GroupJoin::new(outer_key, inner_key, result, comparer);
    Ok(binary(&outer, &inner, Arc::new(op), explicit))
}

pub fn group_by<T, K>(
    source: impl Into<Option<Query<T>>>,
    key_selector: impl Into<Option<Selector<T, K>>>,
) -> Result<Query<Grouping<K, T>>>
where
    T: Element,
    K: Element + Eq + Hash,
{
    group_by_with(source, key_selector, Comparer::natural())
}

pub fn group_by_with<T, K>(
    source: impl Into<Option<Query<T>>>,
    key_selector: impl Into<Option<Selector<T, K>>>,
    comparer: Comparer<K>,
) -> Result<Query<Grouping<K, T>>>
where
    T: Element,
    K: Element,
{
    let source = require(source.into(), "source")?;
    let key = Callback::normalize(key_selector.into(), "key_selector")?;
    let explicit = comparer.is_explicit();
    Ok(unary(&source, Arc::new(GroupBy::new(key, comparer)), explicit))
}

/// Fold the sequence into a single value; the result yields exactly one element.
pub fn aggregate<T: Element, A: Element>(
    source: impl Into<Option<Query<T>>>,
    seed: A,
    func: impl Into<Option<Selector<(A, T), A>>>,
) -> Result<Query<A>> {
    let source = require(source.into(), "source")?;
    let func = Callback::normalize(func.into(), "func")?;
    Ok(unary(&source, Arc::new(Aggregate::new(seed, func)), false))
}

pub fn count<T: Element>(source: impl Into<Option<Query<T>>>) -> Result<Query<usize>> {
    aggregate(source, 0usize, Selector::sync(|(n, _): (usize, T)| n + 1))
}
