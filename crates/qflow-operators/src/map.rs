//! Select / SelectMany projections.

use futures::{stream, StreamExt, TryStreamExt};

use qflow_core::dag::NodeKind;
use qflow_core::error::Error;
use qflow_core::source::{Element, ElementStream};

use crate::callback::Callback;
use crate::traits::{ExecContext, UnaryOperator};

/// One output per input element.
pub struct Map<T, R> {
    pub selector: Callback<T, R>,
}

impl<T: Element, R: Element> Map<T, R> {
    pub fn new(selector: Callback<T, R>) -> Self {
        Self { selector }
    }
}

impl<T: Element, R: Element> UnaryOperator<T, R> for Map<T, R> {
    fn name(&self) -> &'static str {
        "map"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Select
    }

    fn execute(&self, input: ElementStream<T>, ctx: &ExecContext) -> ElementStream<R> {
        let selector = self.selector.clone();
        let cancel = ctx.cancel.clone();
        input
            .and_then(move |item| {
                let selector = selector.clone();
                let cancel = cancel.clone();
                async move { selector.invoke(item, &cancel).await }
            })
            .boxed()
    }
}

/// Zero or more outputs per input element, flattened in order.
pub struct FlatMap<T, R> {
    pub selector: Callback<T, Vec<R>>,
}

impl<T: Element, R: Element> FlatMap<T, R> {
    pub fn new(selector: Callback<T, Vec<R>>) -> Self {
        Self { selector }
    }
}

impl<T: Element, R: Element> UnaryOperator<T, R> for FlatMap<T, R> {
    fn name(&self) -> &'static str {
        "flat_map"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SelectMany
    }

    fn execute(&self, input: ElementStream<T>, ctx: &ExecContext) -> ElementStream<R> {
        let selector = self.selector.clone();
        let cancel = ctx.cancel.clone();
        input
            .and_then(move |item| {
                let selector = selector.clone();
                let cancel = cancel.clone();
                async move { selector.invoke(item, &cancel).await }
            })
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<R, Error>)))
            .try_flatten()
            .boxed()
    }
}
