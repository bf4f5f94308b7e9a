//! Inner hash join (build inner, look up with outer).
//!
//! Output order: outer order across groups, inner order within one outer
//! element's matches. Outer elements without a match produce nothing.

use futures::{stream, StreamExt, TryStreamExt};

use qflow_core::comparer::Comparer;
use qflow_core::dag::NodeKind;
use qflow_core::error::{Error, Result};
use qflow_core::source::{Element, ElementStream};
use qflow_core::state::CursorState;

use crate::callback::Callback;
use crate::join::Phase;
use crate::lookup::Lookup;
use crate::traits::{BinaryOperator, ExecContext};

pub struct HashJoin<O, I, K, R> {
    pub outer_key: Callback<O, K>,
    pub inner_key: Callback<I, K>,
    pub result: Callback<(O, I), R>,
    pub comparer: Comparer<K>,
}

impl<O, I, K, R> Clone for HashJoin<O, I, K, R> {
    fn clone(&self) -> Self {
        Self {
            outer_key: self.outer_key.clone(),
            inner_key: self.inner_key.clone(),
            result: self.result.clone(),
            comparer: self.comparer.clone(),
        }
    }
}

impl<O, I, K, R> HashJoin<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    pub fn new(
        outer_key: Callback<O, K>,
        inner_key: Callback<I, K>,
        result: Callback<(O, I), R>,
        comparer: Comparer<K>,
    ) -> Self {
        Self {
            outer_key,
            inner_key,
            result,
            comparer,
        }
    }
}

impl<O, I, K, R> BinaryOperator<O, I, R> for HashJoin<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    fn name(&self) -> &'static str {
        "join_hash"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Join
    }

    fn execute(
        &self,
        outer: ElementStream<O>,
        inner: ElementStream<I>,
        ctx: &ExecContext,
    ) -> ElementStream<R> {
        let cursor = JoinCursor {
            phase: Phase::new(self.name(), ctx.cursor),
            join: self.clone(),
            ctx: ctx.clone(),
            outer: Some(outer),
            inner: Some(inner),
            lookup: None,
            current: None,
        };
        stream::try_unfold(cursor, |mut c| async move {
            Ok::<_, Error>(c.next().await?.map(|row| (row, c)))
        })
        .boxed()
    }
}

struct JoinCursor<O, I, K, R> {
    phase: Phase,
    join: HashJoin<O, I, K, R>,
    ctx: ExecContext,
    outer: Option<ElementStream<O>>,
    inner: Option<ElementStream<I>>,
    lookup: Option<Lookup<K, I>>,
    /// Outer element being expanded: (element, match group, next match).
    current: Option<(O, usize, usize)>,
}

impl<O, I, K, R> JoinCursor<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    async fn next(&mut self) -> Result<Option<R>> {
        match self.step().await {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.release();
                Ok(None)
            }
            Err(e) => {
                self.phase.fail(&e);
                self.release();
                Err(e)
            }
        }
    }

    fn release(&mut self) {
        self.outer = None;
        self.inner = None;
        self.lookup = None;
        self.current = None;
    }

    async fn step(&mut self) -> Result<Option<R>> {
        loop {
            if self.phase.state().is_terminal() {
                return Ok(None);
            }
            self.ctx.cancel.check()?;
            match self.phase.state() {
                CursorState::NotStarted => self.phase.advance(CursorState::BuildingInnerLookup),
                CursorState::BuildingInnerLookup => {
                    let inner = self
                        .inner
                        .take()
                        .ok_or_else(|| Error::Invariant("join inner already drained".into()))?;
                    let lookup = Lookup::build(
                        inner,
                        &self.join.inner_key,
                        self.join.comparer.clone(),
                        &self.ctx,
                    )
                    .await?;
                    self.lookup = Some(lookup);
                    self.phase.advance(CursorState::IteratingOuter);
                }
                CursorState::IteratingOuter => {
                    let lookup = self
                        .lookup
                        .as_ref()
                        .ok_or_else(|| Error::Invariant("join lookup missing".into()))?;

                    if let Some((outer, group, pos)) = self.current.take() {
                        if let Some(inner) = lookup.group(group).get(pos).cloned() {
                            self.current = Some((outer.clone(), group, pos + 1));
                            let row = self
                                .join
                                .result
                                .invoke((outer, inner), &self.ctx.cancel)
                                .await?;
                            return Ok(Some(row));
                        }
                        continue;
                    }

                    // Nothing can match: the outer side is never read.
                    if lookup.is_empty() {
                        self.phase.advance(CursorState::Completed);
                        return Ok(None);
                    }

                    let next = match self.outer.as_mut() {
                        Some(outer) => outer.try_next().await?,
                        None => None,
                    };
                    let Some(item) = next else {
                        self.phase.advance(CursorState::Completed);
                        return Ok(None);
                    };
                    let key = self
                        .join
                        .outer_key
                        .invoke(item.clone(), &self.ctx.cancel)
                        .await?;
                    if let Some(group) = lookup.position(&key) {
                        self.current = Some((item, group, 0));
                    }
                }
                CursorState::Completed | CursorState::Faulted | CursorState::Cancelled => {
                    return Ok(None)
                }
            }
        }
    }
}
