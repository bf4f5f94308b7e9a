//! Key equality used by joins and grouping.
//!
//! A comparer must be consistent: `equals(a, b)` implies
//! `hash_key(a) == hash_key(b)`. Lookups bucket by hash and then confirm
//! every candidate with `equals`, so hash collisions never produce matches.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

pub trait EqualityComparer<K>: Send + Sync {
    fn equals(&self, a: &K, b: &K) -> bool;
    fn hash_key(&self, key: &K) -> u64;
}

/// Natural `Eq + Hash` equality of the key type.
pub struct NaturalEquality;

impl<K: Eq + Hash> EqualityComparer<K> for NaturalEquality {
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn hash_key(&self, key: &K) -> u64 {
        hash_one(key)
    }
}

/// Compare keys by a derived projection (e.g. case-folded strings).
struct ProjectedEquality<F, P> {
    project: F,
    _projected: PhantomData<fn() -> P>,
}

impl<K, P, F> EqualityComparer<K> for ProjectedEquality<F, P>
where
    P: Eq + Hash,
    F: Fn(&K) -> P + Send + Sync,
{
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.project)(a) == (self.project)(b)
    }

    fn hash_key(&self, key: &K) -> u64 {
        hash_one(&(self.project)(key))
    }
}

struct FnEquality<E, H> {
    eq: E,
    hash: H,
}

impl<K, E, H> EqualityComparer<K> for FnEquality<E, H>
where
    E: Fn(&K, &K) -> bool + Send + Sync,
    H: Fn(&K) -> u64 + Send + Sync,
{
    fn equals(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }

    fn hash_key(&self, key: &K) -> u64 {
        (self.hash)(key)
    }
}

/// Shared handle to an equality comparer. Cheap to clone.
pub struct Comparer<K> {
    inner: Arc<dyn EqualityComparer<K>>,
    explicit: bool,
}

impl<K> Clone for Comparer<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            explicit: self.explicit,
        }
    }
}

impl<K> fmt::Debug for Comparer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparer")
            .field("explicit", &self.explicit)
            .finish()
    }
}

impl<K: Eq + Hash + 'static> Comparer<K> {
    /// The default comparer: the key type's own equality.
    pub fn natural() -> Self {
        Self {
            inner: Arc::new(NaturalEquality),
            explicit: false,
        }
    }

    /// Resolve an optional explicit comparer, falling back to natural equality.
    pub fn resolve(explicit: Option<Comparer<K>>) -> Self {
        explicit.unwrap_or_else(Self::natural)
    }
}

impl<K: 'static> Comparer<K> {
    pub fn new(comparer: impl EqualityComparer<K> + 'static) -> Self {
        Self {
            inner: Arc::new(comparer),
            explicit: true,
        }
    }

    pub fn by_key<P, F>(project: F) -> Self
    where
        P: Eq + Hash + 'static,
        F: Fn(&K) -> P + Send + Sync + 'static,
    {
        Self::new(ProjectedEquality {
            project,
            _projected: PhantomData,
        })
    }

    pub fn from_fns<E, H>(eq: E, hash: H) -> Self
    where
        E: Fn(&K, &K) -> bool + Send + Sync + 'static,
        H: Fn(&K) -> u64 + Send + Sync + 'static,
    {
        Self::new(FnEquality { eq, hash })
    }
}

impl<K> Comparer<K> {
    pub fn equals(&self, a: &K, b: &K) -> bool {
        self.inner.equals(a, b)
    }

    pub fn hash_key(&self, key: &K) -> u64 {
        self.inner.hash_key(key)
    }

    /// Whether this comparer was supplied by the caller rather than defaulted.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

/// Case-insensitive string equality, the comparer most pipelines ask for.
pub fn ignore_ascii_case() -> Comparer<String> {
    Comparer::by_key(|s: &String| s.to_ascii_lowercase())
}

fn hash_one<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}
