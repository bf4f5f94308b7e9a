//! Synchronous reference semantics the engine must reproduce exactly.
//!
//! These are deliberately naive nested loops: no hashing, no lookup, just
//! the ordering and matching rules written out directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{stream, StreamExt};
use qflow::core::cancel::CancellationSignal;
use qflow::core::error::Result;
use qflow::core::source::{ElementStream, SequenceSource};

/// Inner join: outer order across groups, inner order within one outer's matches.
pub fn join<O, I, K, R>(
    outer: &[O],
    inner: &[I],
    outer_key: impl Fn(&O) -> K,
    inner_key: impl Fn(&I) -> K,
    result: impl Fn(&O, &I) -> R,
    equals: impl Fn(&K, &K) -> bool,
) -> Vec<R> {
    let inner_keys: Vec<K> = inner.iter().map(&inner_key).collect();
    let mut out = Vec::new();
    for o in outer {
        let k = outer_key(o);
        for (i, ik) in inner.iter().zip(&inner_keys) {
            if equals(&k, ik) {
                out.push(result(o, i));
            }
        }
    }
    out
}

pub fn group_join<O, I: Clone, K, R>(
    outer: &[O],
    inner: &[I],
    outer_key: impl Fn(&O) -> K,
    inner_key: impl Fn(&I) -> K,
    result: impl Fn(&O, Vec<I>) -> R,
    equals: impl Fn(&K, &K) -> bool,
) -> Vec<R> {
    outer
        .iter()
        .map(|o| {
            let k = outer_key(o);
            let matches = inner
                .iter()
                .filter(|i| equals(&k, &inner_key(i)))
                .cloned()
                .collect();
            result(o, matches)
        })
        .collect()
}

/// Groups in first-occurrence order of their key.
pub fn group_by<T: Clone, K>(
    source: &[T],
    key: impl Fn(&T) -> K,
    equals: impl Fn(&K, &K) -> bool,
) -> Vec<(K, Vec<T>)> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in source {
        let k = key(item);
        match groups.iter_mut().find(|(g, _)| equals(g, &k)) {
            Some((_, items)) => items.push(item.clone()),
            None => groups.push((k, vec![item.clone()])),
        }
    }
    groups
}

/// Source that records every open and every element pulled from it.
pub struct TouchedSource<T> {
    name: String,
    items: Arc<Vec<T>>,
    opened: Arc<AtomicUsize>,
    pulled: Arc<AtomicUsize>,
}

#[derive(Clone)]
pub struct Touches {
    opened: Arc<AtomicUsize>,
    pulled: Arc<AtomicUsize>,
}

impl Touches {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    pub fn untouched(&self) -> bool {
        self.opened() == 0 && self.pulled() == 0
    }
}

impl<T> TouchedSource<T> {
    pub fn new(name: &str, items: Vec<T>) -> (Self, Touches) {
        let opened = Arc::new(AtomicUsize::new(0));
        let pulled = Arc::new(AtomicUsize::new(0));
        let touches = Touches {
            opened: Arc::clone(&opened),
            pulled: Arc::clone(&pulled),
        };
        let source = Self {
            name: name.to_string(),
            items: Arc::new(items),
            opened,
            pulled,
        };
        (source, touches)
    }
}

impl<T: Clone + Send + Sync + 'static> SequenceSource<T> for TouchedSource<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, _cancel: &CancellationSignal) -> Result<ElementStream<T>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let items = Arc::clone(&self.items);
        let pulled = Arc::clone(&self.pulled);
        let len = items.len();
        Ok(stream::iter(0..len)
            .map(move |i| {
                pulled.fetch_add(1, Ordering::SeqCst);
                Ok(items[i].clone())
            })
            .boxed())
    }
}
