//! Left fold of a whole sequence into a single accumulator.

use futures::{stream, StreamExt, TryStreamExt};

use qflow_core::dag::NodeKind;
use qflow_core::source::{Element, ElementStream};

use crate::callback::Callback;
use crate::traits::{ExecContext, UnaryOperator};

/// Yields exactly one element: `seed` folded over the input with `func`.
pub struct Aggregate<T, A> {
    pub seed: A,
    pub func: Callback<(A, T), A>,
}

impl<T: Element, A: Element> Aggregate<T, A> {
    pub fn new(seed: A, func: Callback<(A, T), A>) -> Self {
        Self { seed, func }
    }
}

impl<T: Element, A: Element> UnaryOperator<T, A> for Aggregate<T, A> {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Aggregate
    }

    fn execute(&self, mut input: ElementStream<T>, ctx: &ExecContext) -> ElementStream<A> {
        let seed = self.seed.clone();
        let func = self.func.clone();
        let cancel = ctx.cancel.clone();
        stream::once(async move {
            let mut acc = seed;
            while let Some(item) = input.try_next().await? {
                acc = func.invoke((acc, item), &cancel).await?;
            }
            Ok(acc)
        })
        .boxed()
    }
}
