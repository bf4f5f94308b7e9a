//! Where: keep elements whose predicate evaluates to `true`.

use futures::{StreamExt, TryStreamExt};

use qflow_core::dag::NodeKind;
use qflow_core::source::{Element, ElementStream};

use crate::callback::Callback;
use crate::traits::{ExecContext, UnaryOperator};

pub struct Filter<T> {
    pub predicate: Callback<T, bool>,
}

impl<T: Element> Filter<T> {
    pub fn new(predicate: Callback<T, bool>) -> Self {
        Self { predicate }
    }
}

impl<T: Element> UnaryOperator<T, T> for Filter<T> {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Where
    }

    fn execute(&self, input: ElementStream<T>, ctx: &ExecContext) -> ElementStream<T> {
        let predicate = self.predicate.clone();
        let cancel = ctx.cancel.clone();
        input
            .try_filter_map(move |item| {
                let predicate = predicate.clone();
                let cancel = cancel.clone();
                async move {
                    let keep = predicate.invoke(item.clone(), &cancel).await?;
                    Ok(keep.then_some(item))
                }
            })
            .boxed()
    }
}
