//! Sequence sources: the data a pipeline's leaves read from.
//!
//! A source is opened once per enumeration. Restartable sources hand out a
//! fresh stream every time; `OnceSource` hands out its stream exactly once
//! and faults any later enumeration with `SourceExhausted`.

use std::sync::{Arc, Mutex};

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::cancel::CancellationSignal;
use crate::error::{Error, Result};

/// Lazily-pulled, possibly suspending sequence of elements.
pub type ElementStream<T> = BoxStream<'static, Result<T>>;

/// Bound shared by every value flowing through a pipeline. Elements are
/// cloned when one value feeds several outputs (e.g. an inner join match).
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}

pub trait SequenceSource<T>: Send + Sync + 'static {
    /// Stable, human-readable name used in plan descriptions and errors.
    fn name(&self) -> &str;

    /// Start a new pull over the sequence. Must not read any element yet.
    fn open(&self, cancel: &CancellationSignal) -> Result<ElementStream<T>>;
}

/// Restartable in-memory source.
pub struct VecSource<T> {
    name: String,
    items: Arc<Vec<T>>,
}

impl<T> VecSource<T> {
    pub fn new(name: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            name: name.into(),
            items: Arc::new(items),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> SequenceSource<T> for VecSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, _cancel: &CancellationSignal) -> Result<ElementStream<T>> {
        let items = Arc::clone(&self.items);
        let len = items.len();
        Ok(stream::iter((0..len).map(move |i| Ok(items[i].clone()))).boxed())
    }
}

type StreamFactory<T> = dyn Fn() -> ElementStream<T> + Send + Sync;

/// Restartable source backed by a stream factory (one call per enumeration).
pub struct StreamSource<T> {
    name: String,
    factory: Arc<StreamFactory<T>>,
}

impl<T: Send + 'static> StreamSource<T> {
    pub fn new<F, S>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || factory().map(Ok::<T, Error>).boxed()),
        }
    }

    /// Like `new`, for streams whose pulls can fail.
    pub fn try_new<F, S>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || factory().boxed()),
        }
    }
}

impl<T: Send + 'static> SequenceSource<T> for StreamSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, _cancel: &CancellationSignal) -> Result<ElementStream<T>> {
        Ok((self.factory)())
    }
}

/// Non-restartable source wrapping a single stream.
pub struct OnceSource<T> {
    name: String,
    stream: Mutex<Option<ElementStream<T>>>,
}

impl<T: Send + 'static> OnceSource<T> {
    pub fn new<S>(name: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self {
            name: name.into(),
            stream: Mutex::new(Some(stream.map(Ok::<T, Error>).boxed())),
        }
    }
}

impl<T: Send + 'static> SequenceSource<T> for OnceSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, _cancel: &CancellationSignal) -> Result<ElementStream<T>> {
        let mut slot = self
            .stream
            .lock()
            .map_err(|_| Error::Invariant(format!("source `{}` lock poisoned", self.name)))?;
        slot.take().ok_or_else(|| Error::SourceExhausted {
            source_name: self.name.clone(),
        })
    }
}
