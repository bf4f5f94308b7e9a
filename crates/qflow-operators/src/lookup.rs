//! Comparer-keyed multimap shared by joins and grouping.
//!
//! Keys are bucketed by `Comparer::hash_key` and confirmed with
//! `Comparer::equals`. Groups are kept in first-occurrence order of their key
//! and values keep insertion order within a group.

use std::collections::HashMap;

use futures::TryStreamExt;
use tracing::debug;

use qflow_core::comparer::Comparer;
use qflow_core::error::{Error, Result};
use qflow_core::source::ElementStream;

use crate::callback::Callback;
use crate::traits::ExecContext;

pub struct Lookup<K, V> {
    comparer: Comparer<K>,
    buckets: HashMap<u64, Vec<usize>>,
    groups: Vec<(K, Vec<V>)>,
    elements: usize,
}

impl<K, V> Lookup<K, V> {
    pub fn new(comparer: Comparer<K>) -> Self {
        Self::with_capacity(comparer, 0)
    }

    pub fn with_capacity(comparer: Comparer<K>, capacity: usize) -> Self {
        Self {
            comparer,
            buckets: HashMap::with_capacity(capacity),
            groups: Vec::with_capacity(capacity),
            elements: 0,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.elements += 1;
        let hash = self.comparer.hash_key(&key);
        let slots = self.buckets.entry(hash).or_default();
        for &g in slots.iter() {
            if self.comparer.equals(&self.groups[g].0, &key) {
                self.groups[g].1.push(value);
                return;
            }
        }
        slots.push(self.groups.len());
        self.groups.push((key, vec![value]));
    }

    /// Index of the group whose key compares equal to `key`.
    pub fn position(&self, key: &K) -> Option<usize> {
        let slots = self.buckets.get(&self.comparer.hash_key(key))?;
        slots
            .iter()
            .copied()
            .find(|&g| self.comparer.equals(&self.groups[g].0, key))
    }

    pub fn group(&self, index: usize) -> &[V] {
        self.groups.get(index).map(|(_, v)| v.as_slice()).unwrap_or(&[])
    }

    pub fn get(&self, key: &K) -> Option<&[V]> {
        self.position(key).map(|g| self.group(g))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of values across all groups.
    pub fn element_count(&self) -> usize {
        self.elements
    }

    pub fn into_groups(self) -> Vec<(K, Vec<V>)> {
        self.groups
    }
}

impl<K: Send + 'static, V: Clone + Send + 'static> Lookup<K, V> {
    /// Drain `input` into a lookup keyed by `key_selector`.
    ///
    /// Keys are computed one element at a time in input order. Fails with
    /// `LookupLimit` as soon as the configured element cap is exceeded.
    pub async fn build(
        mut input: ElementStream<V>,
        key_selector: &Callback<V, K>,
        comparer: Comparer<K>,
        ctx: &ExecContext,
    ) -> Result<Self> {
        let limit = ctx.config.max_lookup_elements;
        let mut lookup = Self::with_capacity(comparer, ctx.config.lookup_capacity_hint);
        while let Some(item) = input.try_next().await? {
            let key = key_selector.invoke(item.clone(), &ctx.cancel).await?;
            lookup.insert(key, item);
            if let Some(limit) = limit {
                if lookup.elements > limit {
                    return Err(Error::LookupLimit { limit });
                }
            }
        }
        debug!(
            cursor = %ctx.cursor,
            groups = lookup.len(),
            elements = lookup.elements,
            "lookup built"
        );
        Ok(lookup)
    }
}
