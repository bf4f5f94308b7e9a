//! Runtime: turn a `Query` into enumerations and run reports.
//!
//! Every enumeration gets:
//! - a fresh lowering of the pipeline (no compiled closure is shared),
//! - a fresh `CursorId`,
//! - a child of the caller's cancellation signal.
//! Enumerations of one query are independent and may run concurrently.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::TryStreamExt;
use serde::Serialize;
use tracing::debug;

use qflow_core::cancel::CancellationSignal;
use qflow_core::config::EngineConfig;
use qflow_core::error::Result;
use qflow_core::hash::hash_serde;
use qflow_core::manifest::EnumerationReport;
use qflow_core::source::Element;
use qflow_operators::traits::ExecContext;
use qflow_planner::{lower_to_physical, Query};

use crate::cursor::ResultStream;
use crate::metrics::emit_span;

#[derive(Debug, Clone)]
pub struct Engine {
    cfg: Arc<EngineConfig>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            cfg: Arc::new(EngineConfig::default()),
        }
    }
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg: Arc::new(cfg) })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Start an enumeration. Nothing is pulled until the stream is polled.
    pub fn stream<T: Element>(
        &self,
        query: &Query<T>,
        cancel: &CancellationSignal,
    ) -> Result<ResultStream<T>> {
        let program = lower_to_physical(query)?;
        let ctx = ExecContext::new(cancel.child(), Arc::clone(&self.cfg));
        debug!(cursor = %ctx.cursor, plan_hash = %program.plan_hash, "enumeration created");
        Ok(ResultStream::new(program, ctx))
    }

    /// Enumerate to completion and collect every element.
    pub async fn collect<T: Element>(
        &self,
        query: &Query<T>,
        cancel: &CancellationSignal,
    ) -> Result<Vec<T>> {
        self.stream(query, cancel)?.try_collect().await
    }

    /// Number of elements the query yields.
    pub async fn count<T: Element>(
        &self,
        query: &Query<T>,
        cancel: &CancellationSignal,
    ) -> Result<usize> {
        let mut stream = self.stream(query, cancel)?;
        let mut n = 0usize;
        while stream.try_next().await?.is_some() {
            n += 1;
        }
        Ok(n)
    }

    /// Enumerate to completion and describe the run.
    ///
    /// The report carries the plan hash, the cursor, the row count, the final
    /// state and a digest of the serialized outputs.
    pub async fn run<T: Element + Serialize>(
        &self,
        query: &Query<T>,
        cancel: &CancellationSignal,
    ) -> Result<(Vec<T>, EnumerationReport)> {
        let started = now_millis();
        let mut stream = self.stream(query, cancel)?;
        let report = EnumerationReport::new(stream.cursor_id(), stream.plan_hash(), started);

        let mut out = Vec::new();
        let outcome = loop {
            match stream.try_next().await {
                Ok(Some(item)) => out.push(item),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        emit_span(
            "enumeration",
            &[
                ("cursor", stream.cursor_id().to_string()),
                ("plan_hash", stream.plan_hash().to_hex()),
                ("rows", stream.rows_yielded().to_string()),
                ("outcome", format!("{:?}", stream.state())),
                ("elapsed_ms", now_millis().saturating_sub(started).to_string()),
            ],
        );
        outcome?;

        let digest = hash_serde(&out)?;
        let report = report.finish(
            now_millis(),
            stream.rows_yielded(),
            stream.state(),
            Some(digest),
        );
        Ok((out, report))
    }
}

// --- helpers ---

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
