//! Group join: every outer element paired with all of its inner matches.
//!
//! Unlike the inner join, outer elements without a match are still emitted
//! (with an empty match list), so the outer side is always read in full.

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

pub struct GroupJoin<O, I, K, R> {
    pub outer_key: Callback<O, K>,
    pub inner_key: Callback<I, K>,
    pub result: Callback<(O, Vec<I>), R>,
    pub comparer: Comparer<K>,
}

impl<O, I, K, R> Clone for GroupJoin<O, I, K, R> {
    fn clone(&self) -> Self {
        Self {
            outer_key: self.outer_key.clone(),
            inner_key: self.inner_key.clone(),
            result: self.result.clone(),
            comparer: self.comparer.clone(),
        }
    }
}

impl<O, I, K, R> GroupJoin<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    pub fn new(
        outer_key: Callback<O, K>,
        inner_key: Callback<I, K>,
        result: Callback<(O, Vec<I>), R>,
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

impl<O, I, K, R> BinaryOperator<O, I, R> for GroupJoin<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    fn name(&self) -> &'static str {
        "group_join"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::GroupJoin
    }

    fn execute(
        &self,
        outer: ElementStream<O>,
        inner: ElementStream<I>,
        ctx: &ExecContext,
    ) -> ElementStream<R> {
        let cursor = GroupJoinCursor {
            phase: Phase::new(self.name(), ctx.cursor),
            join: self.clone(),
            ctx: ctx.clone(),
            outer: Some(outer),
            inner: Some(inner),
            lookup: None,
        };
        stream::try_unfold(cursor, |mut c| async move {
            Ok::<_, Error>(c.next().await?.map(|row| (row, c)))
        })
        .boxed()
    }
}

struct GroupJoinCursor<O, I, K, R> {
    phase: Phase,
    join: GroupJoin<O, I, K, R>,
    ctx: ExecContext,
    outer: Option<ElementStream<O>>,
    inner: Option<ElementStream<I>>,
    lookup: Option<Lookup<K, I>>,
}

impl<O, I, K, R> GroupJoinCursor<O, I, K, R>
where
    O: Element,
    I: Element,
    K: Element,
    R: Element,
{
    async fn next(&mut self) -> Result<Option<R>> {
        let out = self.step().await;
        match &out {
            Ok(Some(_)) => {}
            Ok(None) => self.release(),
            Err(e) => {
                self.phase.fail(e);
                self.release();
            }
        }
        out
    }

    fn release(&mut self) {
        self.outer = None;
        self.inner = None;
        self.lookup = None;
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
                    let inner = self.inner.take().ok_or_else(|| {
                        Error::Invariant("group join inner already drained".into())
                    })?;
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
                    let lookup = self.lookup.as_ref().ok_or_else(|| {
                        Error::Invariant("group join lookup missing".into())
                    })?;
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
                    let matches = lookup.get(&key).map(<[I]>::to_vec).unwrap_or_default();
                    let row = self
                        .join
                        .result
                        .invoke((item, matches), &self.ctx.cancel)
                        .await?;
                    return Ok(Some(row));
                }
                CursorState::Completed | CursorState::Faulted | CursorState::Cancelled => {
                    return Ok(None)
                }
            }
        }
    }
}
