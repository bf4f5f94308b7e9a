//! GroupBy: materialize the input into keyed groups.

use futures::{stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use qflow_core::comparer::Comparer;
use qflow_core::dag::NodeKind;
use qflow_core::error::Error;
use qflow_core::source::{Element, ElementStream};

use crate::callback::Callback;
use crate::lookup::Lookup;
use crate::traits::{ExecContext, UnaryOperator};

/// One key and every element that mapped to it, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping<K, T> {
    pub key: K,
    pub elements: Vec<T>,
}

impl<K, T> Grouping<K, T> {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }
}

pub struct GroupBy<T, K> {
    pub key_selector: Callback<T, K>,
    pub comparer: Comparer<K>,
}

impl<T: Element, K: Element> GroupBy<T, K> {
    pub fn new(key_selector: Callback<T, K>, comparer: Comparer<K>) -> Self {
        Self {
            key_selector,
            comparer,
        }
    }
}

impl<T: Element, K: Element> UnaryOperator<T, Grouping<K, T>> for GroupBy<T, K> {
    fn name(&self) -> &'static str {
        "group_by"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::GroupBy
    }

    fn execute(&self, input: ElementStream<T>, ctx: &ExecContext) -> ElementStream<Grouping<K, T>> {
        let key_selector = self.key_selector.clone();
        let comparer = self.comparer.clone();
        let ctx = ctx.clone();
        stream::once(async move { Lookup::build(input, &key_selector, comparer, &ctx).await })
            .map_ok(|lookup| {
                stream::iter(
                    lookup
                        .into_groups()
                        .into_iter()
                        .map(|(key, elements)| Ok::<_, Error>(Grouping { key, elements })),
                )
            })
            .try_flatten()
            .boxed()
    }
}
