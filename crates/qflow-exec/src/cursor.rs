//! `ResultStream`: the caller-facing side of one enumeration.
//!
//! Wraps the compiled program of a single enumeration. The program is opened
//! on the first poll, the cancellation signal is checked before every element
//! is handed out, and the first terminal outcome (end, fault, cancellation)
//! fuses the stream and drops every operator cursor it owns.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use tracing::{debug, trace};

use qflow_core::cancel::CancellationSignal;
use qflow_core::dag::PlanTree;
use qflow_core::error::{Error, Result};
use qflow_core::hash::Hash256;
use qflow_core::id::CursorId;
use qflow_core::source::ElementStream;
use qflow_core::state::EnumerationState;
use qflow_operators::traits::ExecContext;
use qflow_planner::physical::PhysicalProgram;

pub struct ResultStream<T> {
    program: Option<PhysicalProgram<T>>,
    elements: Option<ElementStream<T>>,
    ctx: ExecContext,
    plan: PlanTree,
    plan_hash: Hash256,
    state: EnumerationState,
    yielded: u64,
}

impl<T> ResultStream<T> {
    pub fn new(program: PhysicalProgram<T>, ctx: ExecContext) -> Self {
        Self {
            plan: program.plan.clone(),
            plan_hash: program.plan_hash,
            program: Some(program),
            elements: None,
            ctx,
            state: EnumerationState::Pending,
            yielded: 0,
        }
    }

    pub fn cursor_id(&self) -> CursorId {
        self.ctx.cursor
    }

    pub fn state(&self) -> EnumerationState {
        self.state
    }

    pub fn rows_yielded(&self) -> u64 {
        self.yielded
    }

    pub fn plan(&self) -> &PlanTree {
        &self.plan
    }

    pub fn plan_hash(&self) -> Hash256 {
        self.plan_hash
    }

    /// Signal scoped to this enumeration; cancelling it leaves the caller's
    /// signal (and other enumerations) untouched.
    pub fn cancel_signal(&self) -> &CancellationSignal {
        &self.ctx.cancel
    }

    fn terminate(&mut self, state: EnumerationState) {
        self.state = state;
        self.elements = None;
        self.program = None;
        debug!(
            cursor = %self.ctx.cursor,
            outcome = ?state,
            rows = self.yielded,
            "enumeration finished"
        );
    }

    fn fail(&mut self, err: Error) -> Poll<Option<Result<T>>> {
        let state = if err.is_cancelled() {
            EnumerationState::Cancelled
        } else {
            EnumerationState::Faulted
        };
        self.terminate(state);
        Poll::Ready(Some(Err(err)))
    }

    fn open(&mut self) -> Result<()> {
        self.ctx.cancel.check()?;
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Error::Invariant("enumeration opened after release".into()))?;
        self.elements = Some(program.open(&self.ctx)?);
        self.state = EnumerationState::Streaming;
        debug!(cursor = %self.ctx.cursor, plan_hash = %self.plan_hash, "enumeration started");
        Ok(())
    }
}

impl<T> Stream for ResultStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }
        if this.state == EnumerationState::Pending {
            if let Err(e) = this.open() {
                return this.fail(e);
            }
        }
        let Some(elements) = this.elements.as_mut() else {
            return this.fail(Error::Invariant("streaming without elements".into()));
        };
        match elements.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                this.terminate(EnumerationState::Completed);
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => this.fail(e),
            Poll::Ready(Some(Ok(item))) => {
                if let Err(e) = this.ctx.cancel.check() {
                    return this.fail(e);
                }
                this.yielded += 1;
                if this.ctx.config.trace_elements {
                    trace!(cursor = %this.ctx.cursor, index = this.yielded, "yield");
                }
                Poll::Ready(Some(Ok(item)))
            }
        }
    }
}

impl<T> FusedStream for ResultStream<T> {
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}
