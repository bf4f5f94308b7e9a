//! Callback normalization.
//!
//! Callers hand selectors to operators in one of three shapes:
//!
//! - `(A) -> V`                                 (synchronous)
//! - `(A) -> impl Future<Output = V>`           (asynchronous)
//! - `(A, CancellationSignal) -> impl Future`   (asynchronous, cancellable)
//!
//! each optionally fallible. `Selector` is the tagged form the caller builds;
//! `Callback` is the single `(A, CancellationSignal) -> Future<Result<V>>`
//! contract every operator cursor invokes, so operator logic is written once.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};

use qflow_core::cancel::CancellationSignal;
use qflow_core::error::{BoxError, Error, Result};

type UserResult<V> = std::result::Result<V, BoxError>;

type SyncFn<A, V> = dyn Fn(A) -> UserResult<V> + Send + Sync;
type AsyncFn<A, V> = dyn Fn(A) -> BoxFuture<'static, UserResult<V>> + Send + Sync;
type CancellableFn<A, V> =
    dyn Fn(A, CancellationSignal) -> BoxFuture<'static, UserResult<V>> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackShape {
    Sync,
    Async,
    AsyncCancellable,
}

/// A user selector in one of the three admissible shapes.
pub enum Selector<A, V> {
    Sync(Arc<SyncFn<A, V>>),
    Async(Arc<AsyncFn<A, V>>),
    Cancellable(Arc<CancellableFn<A, V>>),
}

impl<A, V> Clone for Selector<A, V> {
    fn clone(&self) -> Self {
        match self {
            Selector::Sync(f) => Selector::Sync(Arc::clone(f)),
            Selector::Async(f) => Selector::Async(Arc::clone(f)),
            Selector::Cancellable(f) => Selector::Cancellable(Arc::clone(f)),
        }
    }
}

impl<A, V> fmt::Debug for Selector<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector::{:?}", self.shape())
    }
}

impl<A: 'static, V: 'static> Selector<A, V> {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(A) -> V + Send + Sync + 'static,
    {
        Selector::Sync(Arc::new(move |a| Ok(f(a))))
    }

    pub fn try_sync<F, E>(f: F) -> Self
    where
        F: Fn(A) -> std::result::Result<V, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Selector::Sync(Arc::new(move |a| f(a).map_err(Into::into)))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        Selector::Async(Arc::new(move |a| f(a).map(Ok).boxed()))
    }

    pub fn try_async<F, Fut, E>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Selector::Async(Arc::new(move |a| f(a).map(|r| r.map_err(Into::into)).boxed()))
    }

    pub fn cancellable<F, Fut>(f: F) -> Self
    where
        F: Fn(A, CancellationSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = V> + Send + 'static,
    {
        Selector::Cancellable(Arc::new(move |a, c| f(a, c).map(Ok).boxed()))
    }

    pub fn try_cancellable<F, Fut, E>(f: F) -> Self
    where
        F: Fn(A, CancellationSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Selector::Cancellable(Arc::new(move |a, c| {
            f(a, c).map(|r| r.map_err(Into::into)).boxed()
        }))
    }
}

impl<A, V> Selector<A, V> {
    pub fn shape(&self) -> CallbackShape {
        match self {
            Selector::Sync(_) => CallbackShape::Sync,
            Selector::Async(_) => CallbackShape::Async,
            Selector::Cancellable(_) => CallbackShape::AsyncCancellable,
        }
    }
}

/// Normalized selector: one asynchronous, cancellation-aware contract.
pub struct Callback<A, V> {
    f: Arc<CancellableFn<A, V>>,
    shape: CallbackShape,
}

impl<A, V> Clone for Callback<A, V> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            shape: self.shape,
        }
    }
}

impl<A, V> fmt::Debug for Callback<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("shape", &self.shape).finish()
    }
}

impl<A: Send + 'static, V: Send + 'static> Callback<A, V> {
    /// Normalize a possibly-absent selector. Absence is reported against
    /// `param` immediately; nothing is invoked here.
    pub fn normalize(selector: Option<Selector<A, V>>, param: &'static str) -> Result<Self> {
        selector
            .map(Self::from_selector)
            .ok_or(Error::InvalidArgument { param })
    }

    pub fn from_selector(selector: Selector<A, V>) -> Self {
        let shape = selector.shape();
        let f: Arc<CancellableFn<A, V>> = match selector {
            // Evaluated inside a ready future: invocation never suspends and a
            // failure only surfaces when the caller awaits.
            Selector::Sync(f) => Arc::new(move |a, _signal| future::ready(f(a)).boxed()),
            Selector::Async(f) => Arc::new(move |a, _signal| f(a)),
            Selector::Cancellable(f) => f,
        };
        Self { f, shape }
    }
}

impl<A, V> Callback<A, V> {
    pub fn shape(&self) -> CallbackShape {
        self.shape
    }

    /// Invoke the selector once.
    ///
    /// The signal is checked before the call and again after the returned
    /// future settles; an in-flight future is never dropped early.
    pub async fn invoke(&self, arg: A, cancel: &CancellationSignal) -> Result<V> {
        cancel.check()?;
        let out = (self.f)(arg, cancel.clone()).await;
        cancel.check()?;
        out.map_err(Error::Callback)
    }
}
