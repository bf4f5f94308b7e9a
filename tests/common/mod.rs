//! Shared helpers for the integration tests.
#![allow(dead_code)]

pub mod oracle;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use qflow::core::cancel::CancellationSignal;
use qflow::core::error::Result;
use qflow::core::source::Element;
use qflow::exec::Engine;
use qflow::operators::{CallbackShape, Selector};
use qflow::planner::Query;

pub const SHAPES: [CallbackShape; 3] = [
    CallbackShape::Sync,
    CallbackShape::Async,
    CallbackShape::AsyncCancellable,
];

/// Wrap a plain function in the requested callback shape. The asynchronous
/// shapes yield to the scheduler once so that they genuinely suspend.
pub fn shaped<A, V, F>(shape: CallbackShape, f: F) -> Selector<A, V>
where
    A: Send + 'static,
    V: Send + 'static,
    F: Fn(A) -> V + Send + Sync + 'static,
{
    match shape {
        CallbackShape::Sync => Selector::sync(f),
        CallbackShape::Async => Selector::from_async(move |a| {
            let v = f(a);
            async move {
                tokio::task::yield_now().await;
                v
            }
        }),
        CallbackShape::AsyncCancellable => Selector::cancellable(move |a, _cancel| {
            let v = f(a);
            async move {
                tokio::task::yield_now().await;
                v
            }
        }),
    }
}

/// Selector that counts its invocations.
pub fn counting<A, V, F>(calls: &Arc<AtomicUsize>, f: F) -> Selector<A, V>
where
    A: Send + 'static,
    V: Send + 'static,
    F: Fn(A) -> V + Send + Sync + 'static,
{
    let calls = Arc::clone(calls);
    Selector::sync(move |a| {
        calls.fetch_add(1, Ordering::SeqCst);
        f(a)
    })
}

pub async fn collect<T: Element>(query: &Query<T>) -> Result<Vec<T>> {
    Engine::default()
        .collect(query, &CancellationSignal::none())
        .await
}
